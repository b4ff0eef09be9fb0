//! Generic digital I/O backend
//!
//! Fallback for boards without exposed port registers. Resolved pins carry
//! the pin number in their bit and a [`NoRegister`] placeholder; every
//! primitive becomes a call into the board's [`DigitalIo`].

use fastio_hal::{DigitalIo, Level, PinId, PinMode};

use super::{FastIo, NoRegister, PinBit};
use crate::config::IoMode;

/// Fallback backend routing primitives through [`DigitalIo`]
pub struct GenericIo<D> {
    io: D,
}

impl<D> GenericIo<D> {
    /// Wrap a board's generic I/O
    pub const fn new(io: D) -> Self {
        Self { io }
    }

    /// Get the board
    pub fn board(&self) -> &D {
        &self.io
    }

    /// Get the board mutably
    pub fn board_mut(&mut self) -> &mut D {
        &mut self.io
    }

    /// Release the board
    pub fn into_inner(self) -> D {
        self.io
    }
}

impl<D: DigitalIo> FastIo for GenericIo<D> {
    type Register = NoRegister;

    const MODE: IoMode = IoMode::Fallback;

    fn configure(&mut self, pin: PinId, mode: PinMode) {
        self.io.pin_mode(pin, mode);
    }

    fn drive(&mut self, pin: PinId, level: Level) {
        self.io.digital_write(pin, level);
    }

    fn output_register(&mut self, _pin: PinId) -> NoRegister {
        NoRegister
    }

    fn input_register(&mut self, _pin: PinId) -> NoRegister {
        NoRegister
    }

    fn pin_bit(&self, pin: PinId) -> PinBit {
        PinBit::from_pin(pin)
    }

    #[inline(always)]
    fn write_low(&mut self, _register: NoRegister, bit: PinBit) {
        self.io.digital_write(bit.pin(), Level::Low);
    }

    #[inline(always)]
    fn write_high(&mut self, _register: NoRegister, bit: PinBit) {
        self.io.digital_write(bit.pin(), Level::High);
    }

    // No blind XOR on this path: read back, then write the opposite
    #[inline(always)]
    fn toggle(&mut self, _register: NoRegister, bit: PinBit) {
        let level = self.io.digital_read(bit.pin());
        self.io.digital_write(bit.pin(), !level);
    }

    #[inline(always)]
    fn switch_to(&mut self, _register: NoRegister, bit: PinBit, level: Level) {
        self.io.digital_write(bit.pin(), level);
    }

    #[inline(always)]
    fn read(&mut self, _register: NoRegister, bit: PinBit) -> Level {
        self.io.digital_read(bit.pin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimBoard;

    #[test]
    fn test_bit_carries_pin_number() {
        let board = SimBoard::new();
        let io = GenericIo::new(&board);

        assert_eq!(io.pin_bit(0).raw(), 0);
        assert_eq!(io.pin_bit(13).pin(), 13);
        assert_eq!(io.pin_bit(31).raw(), 31);
    }

    #[test]
    fn test_writes_go_through_digital_io() {
        let board = SimBoard::new();
        let mut io = GenericIo::new(&board);
        io.configure(5, PinMode::Output);

        let bit = io.pin_bit(5);
        io.write_high(NoRegister, bit);
        assert_eq!(board.level(5), Level::High);
        io.write_low(NoRegister, bit);
        assert_eq!(board.level(5), Level::Low);

        // pin_mode + two writes
        assert_eq!(board.generic_calls(), 3);
    }

    #[test]
    fn test_toggle_reads_back() {
        let board = SimBoard::new();
        let mut io = GenericIo::new(&board);
        io.configure(12, PinMode::Output);
        let bit = io.pin_bit(12);

        io.toggle(NoRegister, bit);
        assert_eq!(board.level(12), Level::High);
        io.toggle(NoRegister, bit);
        assert_eq!(board.level(12), Level::Low);

        // pin_mode + (read + write) * 2
        assert_eq!(board.generic_calls(), 5);
    }

    #[test]
    fn test_switch_to_writes_target_level() {
        let board = SimBoard::new();
        let mut io = GenericIo::new(&board);
        io.configure(2, PinMode::Output);
        let bit = io.pin_bit(2);

        // Unlike the native toggle, a wrong assumption cannot invert the pin
        io.switch_to(NoRegister, bit, Level::Low);
        assert_eq!(board.level(2), Level::Low);
        io.switch_to(NoRegister, bit, Level::High);
        assert_eq!(board.level(2), Level::High);
    }
}
