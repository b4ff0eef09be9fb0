//! Interrupt masking abstraction
//!
//! Timing-critical code masks interrupts on the current core for a bounded
//! region. The previous state is handed back to the caller so that nested
//! regions restore exactly what they found.

/// Control over interrupt servicing on the current core
pub trait InterruptControl {
    /// Saved interrupt state (e.g. whether interrupts were enabled)
    type State: Copy;

    /// Mask interrupts and return the state that was active before
    fn disable(&mut self) -> Self::State;

    /// Restore a state previously returned by [`disable`](Self::disable)
    ///
    /// Restoring a state in which interrupts were masked keeps them masked.
    fn restore(&mut self, state: Self::State);
}

impl<T: InterruptControl + ?Sized> InterruptControl for &mut T {
    type State = T::State;

    fn disable(&mut self) -> Self::State {
        T::disable(self)
    }

    fn restore(&mut self, state: Self::State) {
        T::restore(self, state)
    }
}
