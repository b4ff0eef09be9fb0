//! GPIO abstractions
//!
//! Two ways of reaching a pin are modelled here:
//!
//! - [`DigitalIo`]: the board's generic, per-pin API. Always available, used
//!   for configuration and as the fallback data path.
//! - [`PortMap`] + [`PortRegister`]: the board's memory-mapped port registers,
//!   where every bit of a register word is one physical pin.

use core::ops::Not;

/// Logical board pin number
pub type PinId = u8;

/// One port register word (one bit per pin)
pub type PortMask = u32;

/// Raw "leave the pin untouched" sentinel accepted by [`InitialState::from_raw`]
pub const SKIP: u8 = 0x23;

/// Digital line level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    #[default]
    Low,
    High,
}

impl Level {
    /// Level of a single bit
    #[inline(always)]
    pub const fn from_bit(bit: bool) -> Self {
        if bit {
            Level::High
        } else {
            Level::Low
        }
    }

    /// Check if this is the high level
    #[inline(always)]
    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }

    /// Check if this is the low level
    #[inline(always)]
    pub const fn is_low(self) -> bool {
        matches!(self, Level::Low)
    }
}

impl From<bool> for Level {
    fn from(bit: bool) -> Self {
        Level::from_bit(bit)
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> Self {
        level.is_high()
    }
}

impl Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

/// Level to apply when a pin is configured as an output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitialState {
    /// Drive low immediately
    #[default]
    Low,
    /// Drive high immediately
    High,
    /// Leave the output latch as it is
    Skip,
}

impl InitialState {
    /// Decode a raw state byte: [`SKIP`] skips, `0` is low, anything else high
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            SKIP => InitialState::Skip,
            0 => InitialState::Low,
            _ => InitialState::High,
        }
    }

    /// Level to drive, or `None` when the pin is to be left untouched
    pub const fn level(self) -> Option<Level> {
        match self {
            InitialState::Low => Some(Level::Low),
            InitialState::High => Some(Level::High),
            InitialState::Skip => None,
        }
    }
}

impl From<Level> for InitialState {
    fn from(level: Level) -> Self {
        match level {
            Level::Low => InitialState::Low,
            Level::High => InitialState::High,
        }
    }
}

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    Output,
    Input,
}

/// Generic per-pin digital I/O
///
/// This is the board's "slow path". Every board implements it; boards without
/// exposed port registers implement nothing else.
pub trait DigitalIo {
    /// Configure the pin direction
    fn pin_mode(&mut self, pin: PinId, mode: PinMode);

    /// Drive the pin's output latch
    ///
    /// On an output this also detaches any PWM/timer function bound to the
    /// pin. On an input, driving low disables the pull-up.
    fn digital_write(&mut self, pin: PinId, level: Level);

    /// Read the pin
    fn digital_read(&mut self, pin: PinId) -> Level;
}

/// Memory-mapped port register
///
/// Implementations are plain handles (an address, an index) and are copied
/// freely. Operations touch only the bits selected by `mask`.
pub trait PortRegister: Copy {
    /// Set the masked bits
    fn set_bits(self, mask: PortMask);

    /// Clear the masked bits
    fn clear_bits(self, mask: PortMask);

    /// Invert the masked bits
    fn toggle_bits(self, mask: PortMask);

    /// Read the whole register word
    fn read_bits(self) -> PortMask;
}

/// Board pin table for direct port access
///
/// Maps a logical pin to the port register that drives it, the port register
/// that reflects it, and its bit within those registers.
pub trait PortMap: DigitalIo {
    /// Register handle type
    type Register: PortRegister;

    /// Output latch register of the port containing `pin`
    fn output_register(&self, pin: PinId) -> Self::Register;

    /// Input register of the port containing `pin`
    fn input_register(&self, pin: PinId) -> Self::Register;

    /// One-hot mask of `pin` within its port
    fn bit_mask(&self, pin: PinId) -> PortMask;
}

impl<T: DigitalIo + ?Sized> DigitalIo for &mut T {
    fn pin_mode(&mut self, pin: PinId, mode: PinMode) {
        T::pin_mode(self, pin, mode)
    }

    fn digital_write(&mut self, pin: PinId, level: Level) {
        T::digital_write(self, pin, level)
    }

    fn digital_read(&mut self, pin: PinId) -> Level {
        T::digital_read(self, pin)
    }
}
