//! Shift1 single-wire protocol
//!
//! One line carries clock, data and latch for a shift register wired behind
//! two RC networks. The line idles HIGH. Each symbol is a LOW pulse followed
//! by a HIGH recovery:
//!
//! | symbol | LOW       | HIGH   |
//! |--------|-----------|--------|
//! | one    | ~1 µs     | ~15 µs |
//! | zero   | ~15 µs    | ~30 µs |
//! | latch  | ~200 µs   | ~300 µs|
//!
//! Every pulse clocks the register, so the latch pulse doubles as the eighth
//! bit and always shifts in a zero. Only bits 7..1 of a byte are usable.
//!
//! The holds are software delays, so [`Shift1::send`] runs with interrupts
//! masked for the whole frame (roughly 0.6 ms to 0.8 ms).

use embedded_hal::delay::DelayNs;
use fastio_hal::{InitialState, InterruptControl, PinId};

use crate::config::timing::{
    LATCH_MIN_LOW_US, MIN_RECOVERY_HIGH_US, ONE_MAX_LOW_US, ZERO_MAX_LOW_US,
};
use crate::config::Shift1Timing;
use crate::interrupt::InterruptGuard;
use crate::io::{FastIo, PinResolver, ResolvedPin};

/// How a frame ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Framing {
    /// Latch pulse: the receiver copies its register to the outputs
    #[default]
    Latch,
    /// Bit 0 goes out as an ordinary zero and nothing is latched, so the next
    /// byte can push this one into a cascaded register
    NoLatch,
}

/// Measured LOW/HIGH pair on the line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseWidth {
    pub low_ns: u32,
    pub high_ns: u32,
}

impl PulseWidth {
    pub const fn new(low_ns: u32, high_ns: u32) -> Self {
        Self { low_ns, high_ns }
    }
}

/// Symbol recognized by a receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pulse {
    One,
    Zero,
    Latch,
}

const NS_PER_US: u32 = 1_000;

/// Classify a pulse the way the receiver's RC networks would
///
/// Returns `None` for widths that fall between the decode windows or for a
/// data bit without enough recovery time.
pub fn classify(width: PulseWidth) -> Option<Pulse> {
    if width.low_ns >= LATCH_MIN_LOW_US * NS_PER_US {
        return Some(Pulse::Latch);
    }
    if width.high_ns < MIN_RECOVERY_HIGH_US * NS_PER_US {
        return None;
    }
    if width.low_ns <= ONE_MAX_LOW_US * NS_PER_US {
        Some(Pulse::One)
    } else if width.low_ns <= ZERO_MAX_LOW_US * NS_PER_US {
        Some(Pulse::Zero)
    } else {
        None
    }
}

/// Model of the receiving shift register
#[derive(Debug, Default)]
pub struct Shift1Decoder {
    register: u8,
    errors: u32,
}

impl Shift1Decoder {
    pub const fn new() -> Self {
        Self {
            register: 0,
            errors: 0,
        }
    }

    /// Feed one measured pulse; returns the byte on latch
    pub fn push(&mut self, width: PulseWidth) -> Option<u8> {
        match classify(width) {
            Some(pulse) => self.shift(pulse),
            None => {
                self.errors += 1;
                None
            }
        }
    }

    /// Feed one symbol; returns the byte on latch
    pub fn shift(&mut self, pulse: Pulse) -> Option<u8> {
        match pulse {
            Pulse::One => {
                self.register = (self.register << 1) | 1;
                None
            }
            Pulse::Zero => {
                self.register <<= 1;
                None
            }
            Pulse::Latch => {
                self.register <<= 1;
                Some(self.register)
            }
        }
    }

    /// Current (unlatched) register contents
    pub fn register(&self) -> u8 {
        self.register
    }

    /// Pulses that matched no symbol
    pub fn errors(&self) -> u32 {
        self.errors
    }
}

/// Shift1 transmitter
pub struct Shift1<D, I> {
    delay: D,
    irq: I,
    timing: Shift1Timing,
}

impl<D: DelayNs, I: InterruptControl> Shift1<D, I> {
    /// Create a transmitter with the default timing table
    pub fn new(delay: D, irq: I) -> Self {
        Self::with_timing(delay, irq, Shift1Timing::default())
    }

    pub fn with_timing(delay: D, irq: I, timing: Shift1Timing) -> Self {
        Self { delay, irq, timing }
    }

    pub fn timing(&self) -> &Shift1Timing {
        &self.timing
    }

    pub fn set_timing(&mut self, timing: Shift1Timing) {
        self.timing = timing;
    }

    /// Drive the line HIGH and let the receiver charge
    ///
    /// Needed after power-up or a long idle period.
    pub fn init<B: FastIo>(&mut self, io: &mut B, line: &ResolvedPin<B::Register>) {
        line.set_high(io);
        hold(&mut self.delay, self.timing.settle_us);
    }

    /// Resolve `pin` as an output driven HIGH, then [`init`](Self::init) it
    pub fn init_pin<B: FastIo>(
        &mut self,
        resolver: &mut PinResolver<B>,
        pin: PinId,
    ) -> ResolvedPin<B::Register> {
        let line = resolver.resolve_output(pin, InitialState::High);
        self.init(resolver.io(), &line);
        line
    }

    /// Send bits 7..1 of `value` and latch them
    pub fn send<B: FastIo>(&mut self, io: &mut B, line: &ResolvedPin<B::Register>, value: u8) {
        self.send_framed(io, line, value, Framing::Latch);
    }

    /// Send bits 7..1 of `value` with the given framing
    ///
    /// The line must be HIGH on entry (after [`init`](Self::init) or a
    /// previous send) and is HIGH on return.
    pub fn send_framed<B: FastIo>(
        &mut self,
        io: &mut B,
        line: &ResolvedPin<B::Register>,
        value: u8,
        framing: Framing,
    ) {
        let t = self.timing;
        let delay = &mut self.delay;
        let _guard = InterruptGuard::acquire(&mut self.irq);

        for bit in (1..8).rev() {
            if value & (1 << bit) != 0 {
                pulse(io, line, delay, t.one_low_us, t.one_high_us);
            } else {
                pulse(io, line, delay, t.zero_low_us, t.zero_high_us);
            }
        }

        match framing {
            Framing::Latch => pulse(io, line, delay, t.latch_low_us, t.latch_high_us),
            Framing::NoLatch => pulse(io, line, delay, t.zero_low_us, t.zero_high_us),
        }
    }

    /// Resolve `pin` without touching it, then [`send`](Self::send)
    pub fn send_pin<B: FastIo>(&mut self, resolver: &mut PinResolver<B>, pin: PinId, value: u8) {
        let line = resolver.resolve_output(pin, InitialState::Skip);
        self.send(resolver.io(), &line, value);
    }

    /// Give back the delay and interrupt controller
    pub fn release(self) -> (D, I) {
        (self.delay, self.irq)
    }
}

#[inline(always)]
fn pulse<B: FastIo, D: DelayNs>(
    io: &mut B,
    line: &ResolvedPin<B::Register>,
    delay: &mut D,
    low_us: u32,
    high_us: u32,
) {
    line.set_low(io);
    hold(delay, low_us);
    line.set_high(io);
    hold(delay, high_us);
}

#[inline(always)]
fn hold<D: DelayNs>(delay: &mut D, us: u32) {
    if us > 0 {
        delay.delay_us(us);
    }
}
