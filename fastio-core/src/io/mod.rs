//! Fast pin access
//!
//! [`FastIo`] is the capability interface the resolver and the protocols are
//! written against. Two implementations exist:
//!
//! - [`DirectRegister`]: read-modify-write (or set/clear alias) access to the
//!   board's port registers. A write is a handful of instructions.
//! - [`GenericIo`]: every operation goes through the board's generic
//!   [`DigitalIo`](fastio_hal::DigitalIo) path. Used on boards that expose no
//!   port registers.
//!
//! Which one a firmware uses is a build-time decision, see [`BoardIo`].

pub mod direct;
pub mod generic;
pub mod resolver;

pub use direct::DirectRegister;
pub use generic::GenericIo;
pub use resolver::{PinResolver, ResolvedPin};

use fastio_hal::{Level, PinId, PinMode, PortMask};

use crate::config::IoMode;

/// Backend selected by the `fallback` cargo feature
#[cfg(not(feature = "fallback"))]
pub type BoardIo<M> = DirectRegister<M>;

/// Backend selected by the `fallback` cargo feature
#[cfg(feature = "fallback")]
pub type BoardIo<M> = GenericIo<M>;

/// Bit selecting a pin within its register
///
/// Native backends store a one-hot port mask. The fallback backend has no
/// registers and stores the logical pin number instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinBit(PortMask);

impl PinBit {
    /// Bit from a port mask
    #[inline(always)]
    pub const fn from_mask(mask: PortMask) -> Self {
        Self(mask)
    }

    /// Bit carrying a logical pin number (fallback mode)
    #[inline(always)]
    pub const fn from_pin(pin: PinId) -> Self {
        Self(pin as PortMask)
    }

    /// Raw value (mask or pin number)
    #[inline(always)]
    pub const fn raw(self) -> PortMask {
        self.0
    }

    /// Pin number carried in fallback mode
    #[inline(always)]
    pub const fn pin(self) -> PinId {
        self.0 as PinId
    }
}

/// Register placeholder for backends without port registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoRegister;

/// Capability interface over a board's pins
///
/// The primitive methods (`write_*`, `toggle`, `switch_to`, `read`) do no
/// checking and no synchronization. Their preconditions:
///
/// - `register` came from [`output_register`](Self::output_register) (writes)
///   or [`input_register`](Self::input_register) (reads) of a pin that has
///   been configured in that direction;
/// - `bit` came from [`pin_bit`](Self::pin_bit) of a pin on the same port.
///
/// Violating them touches the wrong pin rather than failing.
pub trait FastIo {
    /// Register handle carried by resolved pins
    type Register: Copy;

    /// How this backend reaches the hardware
    const MODE: IoMode;

    /// Configure the pin direction (generic path)
    fn configure(&mut self, pin: PinId, mode: PinMode);

    /// Drive the pin through the generic path
    ///
    /// Detaches any PWM function bound to the pin.
    fn drive(&mut self, pin: PinId, level: Level);

    /// Register that drives `pin`
    fn output_register(&mut self, pin: PinId) -> Self::Register;

    /// Register that reflects `pin`
    fn input_register(&mut self, pin: PinId) -> Self::Register;

    /// Bit of `pin` within its register
    fn pin_bit(&self, pin: PinId) -> PinBit;

    /// Clear the addressed bit
    fn write_low(&mut self, register: Self::Register, bit: PinBit);

    /// Set the addressed bit
    fn write_high(&mut self, register: Self::Register, bit: PinBit);

    /// Invert the addressed bit
    fn toggle(&mut self, register: Self::Register, bit: PinBit);

    /// Move the pin to `level`, which the caller knows is the opposite of its
    /// current level
    fn switch_to(&mut self, register: Self::Register, bit: PinBit, level: Level);

    /// Read the addressed bit
    fn read(&mut self, register: Self::Register, bit: PinBit) -> Level;

    /// Set or clear the addressed bit
    #[inline(always)]
    fn write(&mut self, register: Self::Register, bit: PinBit, level: Level) {
        match level {
            Level::Low => self.write_low(register, bit),
            Level::High => self.write_high(register, bit),
        }
    }
}
