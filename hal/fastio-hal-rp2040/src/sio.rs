//! SIO port registers
//!
//! The RP2040 has a single 30-bit GPIO bank behind the SIO block. Writes go
//! through the set/clear/xor aliases and never read-modify-write, so pins on
//! the bank can be driven from interrupt context without racing the main
//! loop.

use embassy_rp::pac;
use fastio_hal::{PortMask, PortRegister};

/// Handle to the SIO output or input register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SioRegister {
    /// GPIO_OUT and its aliases
    Output,
    /// GPIO_IN (read-only; writes are ignored)
    Input,
}

impl PortRegister for SioRegister {
    #[inline(always)]
    fn set_bits(self, mask: PortMask) {
        if self == SioRegister::Output {
            pac::SIO.gpio_out_set().write_value(mask);
        }
    }

    #[inline(always)]
    fn clear_bits(self, mask: PortMask) {
        if self == SioRegister::Output {
            pac::SIO.gpio_out_clr().write_value(mask);
        }
    }

    #[inline(always)]
    fn toggle_bits(self, mask: PortMask) {
        if self == SioRegister::Output {
            pac::SIO.gpio_out_xor().write_value(mask);
        }
    }

    #[inline(always)]
    fn read_bits(self) -> PortMask {
        match self {
            SioRegister::Output => pac::SIO.gpio_out().read(),
            SioRegister::Input => pac::SIO.gpio_in().read(),
        }
    }
}
