//! Single-wire transport
//!
//! Each frame is one [`Shift1`] byte. Bit 0 never reaches the receiver, which
//! [`FrameLayout::STANDARD`](super::FrameLayout::STANDARD) leaves unused.

use embedded_hal::delay::DelayNs;
use fastio_core::io::{FastIo, PinResolver, ResolvedPin};
use fastio_core::protocol::Shift1;
use fastio_hal::{InterruptControl, PinId};

use super::{FrameLayout, LcdTransport, RegisterSelect};

/// LCD transport over a Shift1 line
pub struct Shift1Bus<B: FastIo, D, I> {
    io: B,
    line: ResolvedPin<B::Register>,
    shift1: Shift1<D, I>,
    layout: FrameLayout,
    backlight: bool,
}

impl<B: FastIo, D: DelayNs, I: InterruptControl> Shift1Bus<B, D, I> {
    /// Resolve and initialize the line
    pub fn new(
        mut resolver: PinResolver<B>,
        pin: PinId,
        mut shift1: Shift1<D, I>,
        layout: FrameLayout,
    ) -> Self {
        let line = shift1.init_pin(&mut resolver, pin);

        Self {
            io: resolver.into_inner(),
            line,
            shift1,
            layout,
            backlight: false,
        }
    }

    /// Send one frame and latch it
    pub fn push(&mut self, frame: u8) {
        self.shift1.send(&mut self.io, &self.line, frame);
    }

    pub fn shift1(&mut self) -> &mut Shift1<D, I> {
        &mut self.shift1
    }

    /// Release the backend and the transmitter
    pub fn release(self) -> (B, Shift1<D, I>) {
        (self.io, self.shift1)
    }
}

impl<B: FastIo, D: DelayNs, I: InterruptControl> LcdTransport for Shift1Bus<B, D, I> {
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
