//! Pin resolution
//!
//! Turns a logical pin number into a [`ResolvedPin`] once, at setup time, so
//! the hot path never looks anything up again.

use fastio_hal::{InitialState, Level, PinId, PinMode};

use super::{FastIo, PinBit};
use crate::config::IoMode;

/// A pin bound to its register and bit
///
/// Valid for as long as the pin keeps the direction it was resolved for. The
/// primitives never re-validate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResolvedPin<R> {
    register: R,
    bit: PinBit,
}

impl<R: Copy> ResolvedPin<R> {
    /// Combine a register handle with a bit
    ///
    /// Both must belong to the same port; mixing ports addresses some other
    /// pin.
    #[inline(always)]
    pub const fn from_parts(register: R, bit: PinBit) -> Self {
        Self { register, bit }
    }

    /// Register handle
    #[inline(always)]
    pub fn register(&self) -> R {
        self.register
    }

    /// Bit within the register
    #[inline(always)]
    pub fn bit(&self) -> PinBit {
        self.bit
    }

    /// Drive the pin to `level`
    #[inline(always)]
    pub fn write<B: FastIo<Register = R>>(&self, io: &mut B, level: Level) {
        io.write(self.register, self.bit, level);
    }

    /// Drive the pin high
    #[inline(always)]
    pub fn set_high<B: FastIo<Register = R>>(&self, io: &mut B) {
        io.write_high(self.register, self.bit);
    }

    /// Drive the pin low
    #[inline(always)]
    pub fn set_low<B: FastIo<Register = R>>(&self, io: &mut B) {
        io.write_low(self.register, self.bit);
    }

    /// Invert the pin
    #[inline(always)]
    pub fn toggle<B: FastIo<Register = R>>(&self, io: &mut B) {
        io.toggle(self.register, self.bit);
    }

    /// Move the pin to `level` from the opposite level
    #[inline(always)]
    pub fn switch_to<B: FastIo<Register = R>>(&self, io: &mut B, level: Level) {
        io.switch_to(self.register, self.bit, level);
    }

    /// Read the pin
    #[inline(always)]
    pub fn read<B: FastIo<Register = R>>(&self, io: &mut B) -> Level {
        io.read(self.register, self.bit)
    }
}

/// Resolves logical pins against a [`FastIo`] backend
pub struct PinResolver<B> {
    io: B,
}

impl<B: FastIo> PinResolver<B> {
    /// Create a resolver over a backend
    pub const fn new(io: B) -> Self {
        Self { io }
    }

    /// Backend mode
    pub fn mode(&self) -> IoMode {
        B::MODE
    }

    /// Configure `pin` as an output and bind it for the write primitives
    ///
    /// Unless `initial` is [`InitialState::Skip`] the pin is driven to that
    /// level first, which also detaches any PWM function bound to it.
    pub fn resolve_output(&mut self, pin: PinId, initial: InitialState) -> ResolvedPin<B::Register> {
        self.io.configure(pin, PinMode::Output);
        if let Some(level) = initial.level() {
            self.io.drive(pin, level);
        }

        #[cfg(feature = "defmt")]
        defmt::trace!("pin {} resolved as output ({})", pin, initial);

        ResolvedPin::from_parts(self.io.output_register(pin), self.io.pin_bit(pin))
    }

    /// Configure `pin` as an input and bind it for the read primitive
    ///
    /// The output latch is driven low, disabling the pull-up.
    pub fn resolve_input(&mut self, pin: PinId) -> ResolvedPin<B::Register> {
        self.io.configure(pin, PinMode::Input);
        self.io.drive(pin, Level::Low);

        #[cfg(feature = "defmt")]
        defmt::trace!("pin {} resolved as input", pin);

        ResolvedPin::from_parts(self.io.input_register(pin), self.io.pin_bit(pin))
    }

    /// Bit of `pin` within its port, or the pin number in fallback mode
    pub fn resolve_bit(&self, pin: PinId) -> PinBit {
        self.io.pin_bit(pin)
    }

    /// Get the backend
    pub fn io(&mut self) -> &mut B {
        &mut self.io
    }

    /// Release the backend
    pub fn into_inner(self) -> B {
        self.io
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{DirectRegister, GenericIo, NoRegister};
    use crate::sim::{SimBoard, PIN_COUNT, PINS_PER_PORT};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn native_bit_is_port_position(pin in 0..PIN_COUNT) {
            let board = SimBoard::new();
            let resolver = PinResolver::new(DirectRegister::new(&board));

            let bit = resolver.resolve_bit(pin).raw();
            prop_assert!(bit.is_power_of_two());
            prop_assert_eq!(bit.trailing_zeros(), (pin % PINS_PER_PORT) as u32);
        }

        #[test]
        fn fallback_bit_is_pin(pin in any::<u8>()) {
            let board = SimBoard::new();
            let resolver = PinResolver::new(GenericIo::new(&board));

            prop_assert_eq!(resolver.resolve_bit(pin).raw(), pin as u32);
            prop_assert_eq!(resolver.resolve_bit(pin).pin(), pin);
        }

        #[test]
        fn resolved_write_touches_one_bit(pin in 0..PIN_COUNT, value in 0u32..=0xFF) {
            let board = SimBoard::new();
            let port = SimBoard::port_of(pin);
            board.preset_port(port, value);

            let mut resolver = PinResolver::new(DirectRegister::new(&board));
            let register = resolver.resolve_output(pin, InitialState::Skip).register();
            let line = ResolvedPin::from_parts(register, resolver.resolve_bit(pin));

            line.set_high(resolver.io());
            prop_assert_eq!(board.port_value(port), value | SimBoard::mask_of(pin));
            line.set_low(resolver.io());
            prop_assert_eq!(board.port_value(port), value & !SimBoard::mask_of(pin));
        }
    }

    #[test]
    fn test_both_modes_side_by_side() {
        let native_board = SimBoard::new();
        let fallback_board = SimBoard::new();
        let mut native = PinResolver::new(DirectRegister::new(&native_board));
        let mut fallback = PinResolver::new(GenericIo::new(&fallback_board));

        assert_eq!(native.mode(), IoMode::Native);
        assert_eq!(fallback.mode(), IoMode::Fallback);

        let a = native.resolve_output(11, InitialState::Low);
        let b = fallback.resolve_output(11, InitialState::Low);
        assert_eq!(b.register(), NoRegister);

        a.set_high(native.io());
        b.set_high(fallback.io());
        assert_eq!(native_board.level(11), Level::High);
        assert_eq!(fallback_board.level(11), Level::High);

        // pin_mode + initial write only; the fast write bypassed the generic path
        assert_eq!(native_board.generic_calls(), 2);
        assert_eq!(fallback_board.generic_calls(), 3);
    }

    #[test]
    fn test_resolve_output_drives_initial_state() {
        let board = SimBoard::new();
        let mut resolver = PinResolver::new(DirectRegister::new(&board));

        resolver.resolve_output(6, InitialState::High);
        assert!(board.is_output(6));
        assert_eq!(board.level(6), Level::High);
    }

    #[test]
    fn test_resolve_output_detaches_pwm_unless_skipped() {
        let board = SimBoard::new();
        board.attach_pwm(3);
        board.attach_pwm(9);
        let mut resolver = PinResolver::new(DirectRegister::new(&board));

        resolver.resolve_output(3, InitialState::Low);
        assert!(!board.has_pwm(3));

        // Skip leaves the latch and the timer untouched
        resolver.resolve_output(9, InitialState::Skip);
        assert!(board.is_output(9));
        assert!(board.has_pwm(9));
        assert_eq!(board.edge_count(9), 0);
    }

    #[test]
    fn test_resolve_input_disables_pullup() {
        let board = SimBoard::new();
        board.preset_port(SimBoard::port_of(20), SimBoard::mask_of(20));
        let mut resolver = PinResolver::new(DirectRegister::new(&board));

        let input = resolver.resolve_input(20);
        assert!(board.is_configured(20));
        assert!(!board.is_output(20));
        assert_eq!(board.level(20), Level::Low);

        board.set_input(20, Level::High);
        assert_eq!(input.read(resolver.io()), Level::High);
        board.set_input(20, Level::Low);
        assert_eq!(input.read(resolver.io()), Level::Low);
    }

    #[test]
    fn test_fallback_input_reads_through_digital_io() {
        let board = SimBoard::new();
        let mut resolver = PinResolver::new(GenericIo::new(&board));

        let input = resolver.resolve_input(4);
        board.set_input(4, Level::High);
        assert_eq!(input.read(resolver.io()), Level::High);
    }
}
