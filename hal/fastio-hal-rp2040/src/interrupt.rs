//! PRIMASK interrupt control

use fastio_hal::InterruptControl;

/// Masks all configurable-priority interrupts on the current core
#[derive(Debug, Default, Clone, Copy)]
pub struct CortexInterrupts;

impl InterruptControl for CortexInterrupts {
    /// Whether interrupts were enabled
    type State = bool;

    fn disable(&mut self) -> bool {
        let was_enabled = cortex_m::register::primask::read().is_active();
        cortex_m::interrupt::disable();
        was_enabled
    }

    fn restore(&mut self, was_enabled: bool) {
        if was_enabled {
            // SAFETY: only re-enables what the matching `disable` found enabled,
            // so no enclosing critical section is broken
            unsafe { cortex_m::interrupt::enable() }
        }
    }
}
