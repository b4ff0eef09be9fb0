//! Scoped interrupt masking
//!
//! [`InterruptGuard`] masks interrupts when created and restores the saved
//! state when dropped, so every exit path of the enclosing scope restores
//! exactly once.

use fastio_hal::InterruptControl;

/// Interrupts stay masked while this guard is alive
#[must_use = "interrupts are restored as soon as the guard is dropped"]
pub struct InterruptGuard<'a, I: InterruptControl> {
    irq: &'a mut I,
    saved: I::State,
}

impl<'a, I: InterruptControl> InterruptGuard<'a, I> {
    /// Mask interrupts until the returned guard is dropped
    pub fn acquire(irq: &'a mut I) -> Self {
        let saved = irq.disable();
        Self { irq, saved }
    }

    /// State that will be restored on drop
    pub fn saved(&self) -> I::State {
        self.saved
    }
}

impl<I: InterruptControl> Drop for InterruptGuard<'_, I> {
    fn drop(&mut self) {
        self.irq.restore(self.saved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Mock interrupt controller counting transitions
    struct MockIrq {
        enabled: bool,
        disables: u32,
        restores: u32,
    }

    impl MockIrq {
        fn new(enabled: bool) -> Self {
            Self {
                enabled,
                disables: 0,
                restores: 0,
            }
        }
    }

    impl InterruptControl for MockIrq {
        type State = bool;

        fn disable(&mut self) -> bool {
            self.disables += 1;
            let was = self.enabled;
            self.enabled = false;
            was
        }

        fn restore(&mut self, state: bool) {
            self.restores += 1;
            self.enabled = state;
        }
    }

    fn early_exit(irq: &mut MockIrq, bail: bool) -> Option<u8> {
        let _guard = InterruptGuard::acquire(irq);
        if bail {
            return None;
        }
        Some(1)
    }

    #[test]
    fn test_guard_masks_and_restores() {
        let mut irq = MockIrq::new(true);
        {
            let guard = InterruptGuard::acquire(&mut irq);
            assert!(guard.saved());
        }
        assert!(irq.enabled);
        assert_eq!(irq.disables, 1);
        assert_eq!(irq.restores, 1);
    }

    #[test]
    fn test_guard_restores_on_every_exit_path() {
        let mut irq = MockIrq::new(true);

        assert_eq!(early_exit(&mut irq, true), None);
        assert!(irq.enabled);
        assert_eq!(early_exit(&mut irq, false), Some(1));
        assert!(irq.enabled);

        assert_eq!(irq.disables, 2);
        assert_eq!(irq.restores, 2);
    }

    #[test]
    fn test_nested_guard_keeps_outer_mask() {
        let mut irq = MockIrq::new(true);
        {
            let mut outer = InterruptGuard::acquire(&mut irq);
            {
                let inner = InterruptGuard::acquire(&mut *outer.irq);
                assert!(!inner.saved());
            }
            // Inner restore must not re-enable
            assert!(!outer.irq.enabled);
        }
        assert!(irq.enabled);
    }
}
