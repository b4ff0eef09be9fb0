//! Three-wire shift register transport
//!
//! Data and clock feed a 74HC595 (or similar); a strobe pulse copies the
//! shifted byte to its outputs.

use fastio_core::io::{FastIo, PinResolver, ResolvedPin};
use fastio_core::protocol::shift_out;
use fastio_hal::{InitialState, PinId};

use super::{FrameLayout, LcdTransport, RegisterSelect};

/// Pins of a [`ShiftRegisterBus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ShiftRegisterPins {
    pub data: PinId,
    pub clock: PinId,
    pub strobe: PinId,
}

/// LCD transport over a latching shift register
pub struct ShiftRegisterBus<B: FastIo> {
    io: B,
    data: ResolvedPin<B::Register>,
    clock: ResolvedPin<B::Register>,
    strobe: ResolvedPin<B::Register>,
    layout: FrameLayout,
    backlight: bool,
}

impl<B: FastIo> ShiftRegisterBus<B> {
    /// Resolve the three pins, all driven low
    pub fn new(mut resolver: PinResolver<B>, pins: ShiftRegisterPins, layout: FrameLayout) -> Self {
        let data = resolver.resolve_output(pins.data, InitialState::Low);
        let clock = resolver.resolve_output(pins.clock, InitialState::Low);
        let strobe = resolver.resolve_output(pins.strobe, InitialState::Low);

        Self {
            io: resolver.into_inner(),
            data,
            clock,
            strobe,
            layout,
            backlight: false,
        }
    }

    /// Shift one frame in and latch it
    pub fn push(&mut self, frame: u8) {
        shift_out(&mut self.io, &self.data, &self.clock, frame);
        self.strobe.set_high(&mut self.io);
        self.strobe.set_low(&mut self.io);
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    /// Release the backend
    pub fn into_inner(self) -> B {
        self.io
    }
}

impl<B: FastIo> LcdTransport for ShiftRegisterBus<B> {
    fn send_nibble(&mut self, nibble: u8, rs: RegisterSelect) {
        let frame = self.layout.frame(nibble, rs, self.backlight);
        self.push(frame | self.layout.enable);
        self.push(frame);
    }

    fn set_backlight(&mut self, on: bool) {
        self.backlight = on;
        let frame = self.layout.idle(on);
        self.push(frame);
    }
}
