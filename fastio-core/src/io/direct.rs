//! Direct port register backend

use fastio_hal::{Level, PinId, PinMode, PortMap, PortRegister};

use super::{FastIo, PinBit};
use crate::config::IoMode;

/// Native backend writing port registers directly
pub struct DirectRegister<M> {
    board: M,
}

impl<M> DirectRegister<M> {
    /// Wrap a board's pin table
    pub const fn new(board: M) -> Self {
        Self { board }
    }

    /// Get the board
    pub fn board(&self) -> &M {
        &self.board
    }

    /// Get the board mutably
    pub fn board_mut(&mut self) -> &mut M {
        &mut self.board
    }

    /// Release the board
    pub fn into_inner(self) -> M {
        self.board
    }
}

impl<M: PortMap> FastIo for DirectRegister<M> {
    type Register = M::Register;

    const MODE: IoMode = IoMode::Native;

    fn configure(&mut self, pin: PinId, mode: PinMode) {
        self.board.pin_mode(pin, mode);
    }

    fn drive(&mut self, pin: PinId, level: Level) {
        self.board.digital_write(pin, level);
    }

    fn output_register(&mut self, pin: PinId) -> M::Register {
        self.board.output_register(pin)
    }

    fn input_register(&mut self, pin: PinId) -> M::Register {
        self.board.input_register(pin)
    }

    fn pin_bit(&self, pin: PinId) -> PinBit {
        PinBit::from_mask(self.board.bit_mask(pin))
    }

    #[inline(always)]
    fn write_low(&mut self, register: M::Register, bit: PinBit) {
        debug_assert_ne!(bit.raw(), 0, "pin bit not resolved");
        register.clear_bits(bit.raw());
    }

    #[inline(always)]
    fn write_high(&mut self, register: M::Register, bit: PinBit) {
        debug_assert_ne!(bit.raw(), 0, "pin bit not resolved");
        register.set_bits(bit.raw());
    }

    #[inline(always)]
    fn toggle(&mut self, register: M::Register, bit: PinBit) {
        debug_assert_ne!(bit.raw(), 0, "pin bit not resolved");
        register.toggle_bits(bit.raw());
    }

    // The caller guarantees the transition, so the target level is not needed
    #[inline(always)]
    fn switch_to(&mut self, register: M::Register, bit: PinBit, _level: Level) {
        self.toggle(register, bit);
    }

    #[inline(always)]
    fn read(&mut self, register: M::Register, bit: PinBit) -> Level {
        Level::from_bit(register.read_bits() & bit.raw() != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimBoard, PIN_COUNT, PORT_COUNT};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn write_touches_exactly_one_bit(
            pin in 0..PIN_COUNT,
            ports in prop::array::uniform4(0u32..=0xFF),
            high in any::<bool>(),
        ) {
            let board = SimBoard::new();
            for (port, value) in ports.iter().enumerate() {
                board.preset_port(port, *value);
            }
            let mut io = DirectRegister::new(&board);

            let register = io.output_register(pin);
            let bit = io.pin_bit(pin);
            io.write(register, bit, Level::from_bit(high));

            let mask = SimBoard::mask_of(pin);
            for port in 0..PORT_COUNT {
                let expected = if port == SimBoard::port_of(pin) {
                    if high { ports[port] | mask } else { ports[port] & !mask }
                } else {
                    ports[port]
                };
                prop_assert_eq!(board.port_value(port), expected);
            }
        }

        #[test]
        fn toggle_twice_restores(pin in 0..PIN_COUNT, value in 0u32..=0xFF) {
            let board = SimBoard::new();
            board.preset_port(SimBoard::port_of(pin), value);
            let mut io = DirectRegister::new(&board);

            let register = io.output_register(pin);
            let bit = io.pin_bit(pin);

            io.toggle(register, bit);
            prop_assert_eq!(board.port_value(SimBoard::port_of(pin)), value ^ SimBoard::mask_of(pin));
            io.toggle(register, bit);
            prop_assert_eq!(board.port_value(SimBoard::port_of(pin)), value);
        }
    }

    #[test]
    fn test_primitives_bypass_generic_path() {
        let board = SimBoard::new();
        let mut io = DirectRegister::new(&board);

        let register = io.output_register(10);
        let bit = io.pin_bit(10);
        io.write_high(register, bit);
        io.switch_to(register, bit, Level::Low);
        io.write_high(register, bit);

        assert_eq!(board.level(10), Level::High);
        assert_eq!(board.generic_calls(), 0);
        assert_eq!(board.edge_count(10), 3);
    }

    #[test]
    fn test_read_input_register() {
        let board = SimBoard::new();
        let mut io = DirectRegister::new(&board);
        io.configure(17, PinMode::Input);

        let register = io.input_register(17);
        let bit = io.pin_bit(17);

        assert_eq!(io.read(register, bit), Level::Low);
        board.set_input(17, Level::High);
        assert_eq!(io.read(register, bit), Level::High);

        // Other pins of the port do not leak into the result
        board.set_input(17, Level::Low);
        board.set_input(18, Level::High);
        assert_eq!(io.read(register, bit), Level::Low);
    }
}
