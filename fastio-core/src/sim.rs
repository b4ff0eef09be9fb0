//! Simulated board
//!
//! Host-side stand-in for a microcontroller with four 8-bit ports, a
//! nanosecond clock driven by delays, and one counter-incrementing interrupt.
//! Every change of an output latch is recorded as an [`Edge`] so tests can
//! check line sequencing and pulse widths after the fact.
//!
//! All traits are implemented for `&SimBoard`, so the same board can back a
//! [`FastIo`](crate::io::FastIo) backend, a delay and an interrupt controller
//! at once:
//!
//! ```ignore
//! let board = SimBoard::new();
//! let mut resolver = PinResolver::new(DirectRegister::new(&board));
//! let mut shift1 = Shift1::new(&board, &board);
//! ```

use core::cell::{Cell, RefCell};

use embedded_hal::delay::DelayNs;
use fastio_hal::{
    DigitalIo, InterruptControl, Level, PinId, PinMode, PortMap, PortMask, PortRegister,
};
use heapless::Vec;

use crate::protocol::shift1::PulseWidth;

/// Number of simulated ports
pub const PORT_COUNT: usize = 4;

/// Pins per port (bits used in each port register)
pub const PINS_PER_PORT: u8 = 8;

/// Number of simulated pins
pub const PIN_COUNT: u8 = PORT_COUNT as u8 * PINS_PER_PORT;

/// Maximum recorded edges
pub const TRACE_CAPACITY: usize = 2048;

/// Maximum recorded interrupt services / masked windows
pub const MAX_WINDOWS: usize = 16;

/// Maximum results returned by the trace analysis helpers
pub const MAX_SAMPLES: usize = 64;

/// One recorded level change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Simulated time of the change
    pub at_ns: u64,
    /// Pin that changed
    pub pin: PinId,
    /// New level
    pub level: Level,
}

/// Span of time with interrupts masked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start_ns: u64,
    pub end_ns: u64,
}

impl Window {
    /// Check if `t` lies strictly inside the window
    pub fn contains(&self, t: u64) -> bool {
        t > self.start_ns && t < self.end_ns
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum RegisterKind {
    Output,
    Input,
}

/// Port register handle into a [`SimBoard`]
#[derive(Clone, Copy)]
pub struct SimRegister<'a> {
    board: &'a SimBoard,
    port: usize,
    kind: RegisterKind,
}

impl SimRegister<'_> {
    /// Port index this register belongs to
    pub fn port(&self) -> usize {
        self.port
    }
}

/// Simulated microcontroller
pub struct SimBoard {
    latch: [Cell<PortMask>; PORT_COUNT],
    input: [Cell<PortMask>; PORT_COUNT],
    baseline: [Cell<PortMask>; PORT_COUNT],
    /// Bitmap of pins configured as outputs
    outputs: Cell<u32>,
    /// Bitmap of pins that went through `pin_mode`
    configured: Cell<u32>,
    /// Bitmap of pins with a PWM timer attached
    pwm: Cell<u32>,
    generic_calls: Cell<u32>,
    now_ns: Cell<u64>,
    trace: RefCell<Vec<Edge, TRACE_CAPACITY>>,
    overflowed: Cell<bool>,
    irq_enabled: Cell<bool>,
    irq_pending: Cell<bool>,
    irq_at_ns: Cell<Option<u64>>,
    irq_count: Cell<u32>,
    irq_serviced: RefCell<Vec<u64, MAX_WINDOWS>>,
    masked: RefCell<Vec<Window, MAX_WINDOWS>>,
    masked_since: Cell<Option<u64>>,
}

impl Default for SimBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBoard {
    /// Create a board with all latches low and interrupts enabled
    pub fn new() -> Self {
        Self {
            latch: Default::default(),
            input: Default::default(),
            baseline: Default::default(),
            outputs: Cell::new(0),
            configured: Cell::new(0),
            pwm: Cell::new(0),
            generic_calls: Cell::new(0),
            now_ns: Cell::new(0),
            trace: RefCell::new(Vec::new()),
            overflowed: Cell::new(false),
            irq_enabled: Cell::new(true),
            irq_pending: Cell::new(false),
            irq_at_ns: Cell::new(None),
            irq_count: Cell::new(0),
            irq_serviced: RefCell::new(Vec::new()),
            masked: RefCell::new(Vec::new()),
            masked_since: Cell::new(None),
        }
    }

    /// Port index of a pin
    pub const fn port_of(pin: PinId) -> usize {
        (pin / PINS_PER_PORT) as usize
    }

    /// One-hot mask of a pin within its port
    pub const fn mask_of(pin: PinId) -> PortMask {
        1 << (pin % PINS_PER_PORT)
    }

    fn pin_flag(pin: PinId) -> u32 {
        1 << pin
    }

    // ---- Port state ----

    /// Current output latch level of a pin
    pub fn level(&self, pin: PinId) -> Level {
        let value = self.latch[Self::port_of(pin)].get();
        Level::from_bit(value & Self::mask_of(pin) != 0)
    }

    /// Whole output latch word of a port
    pub fn port_value(&self, port: usize) -> PortMask {
        self.latch[port].get()
    }

    /// Preload a port's output latch without recording edges
    pub fn preset_port(&self, port: usize, value: PortMask) {
        self.latch[port].set(value);
        self.baseline[port].set(value);
    }

    /// Drive an external level onto an input pin
    pub fn set_input(&self, pin: PinId, level: Level) {
        let cell = &self.input[Self::port_of(pin)];
        let mask = Self::mask_of(pin);
        match level {
            Level::High => cell.set(cell.get() | mask),
            Level::Low => cell.set(cell.get() & !mask),
        }
    }

    /// Check if a pin is configured as an output
    pub fn is_output(&self, pin: PinId) -> bool {
        self.outputs.get() & Self::pin_flag(pin) != 0
    }

    /// Check if a pin went through `pin_mode`
    pub fn is_configured(&self, pin: PinId) -> bool {
        self.configured.get() & Self::pin_flag(pin) != 0
    }

    /// Bind a PWM timer to a pin
    pub fn attach_pwm(&self, pin: PinId) {
        self.pwm.set(self.pwm.get() | Self::pin_flag(pin));
    }

    /// Check if a PWM timer is bound to a pin
    pub fn has_pwm(&self, pin: PinId) -> bool {
        self.pwm.get() & Self::pin_flag(pin) != 0
    }

    /// Number of calls through the generic digital I/O path
    pub fn generic_calls(&self) -> u32 {
        self.generic_calls.get()
    }

    fn store_latch(&self, port: usize, value: PortMask) {
        let old = self.latch[port].get();
        self.latch[port].set(value);

        let changed = old ^ value;
        if changed == 0 {
            return;
        }

        let mut trace = self.trace.borrow_mut();
        for bit in 0..PINS_PER_PORT {
            let mask = 1 << bit;
            if changed & mask != 0 {
                let edge = Edge {
                    at_ns: self.now_ns.get(),
                    pin: port as u8 * PINS_PER_PORT + bit,
                    level: Level::from_bit(value & mask != 0),
                };
                if trace.push(edge).is_err() {
                    self.overflowed.set(true);
                }
            }
        }
    }

    fn read_port(&self, port: usize) -> PortMask {
        let mut outputs = 0;
        for bit in 0..PINS_PER_PORT {
            if self.is_output(port as u8 * PINS_PER_PORT + bit) {
                outputs |= 1 << bit;
            }
        }
        (self.latch[port].get() & outputs) | (self.input[port].get() & !outputs)
    }

    // ---- Clock ----

    /// Simulated time
    pub fn now_ns(&self) -> u64 {
        self.now_ns.get()
    }

    /// Advance simulated time, firing a scheduled interrupt on the way
    pub fn advance_ns(&self, ns: u64) {
        let end = self.now_ns.get() + ns;
        if let Some(at) = self.irq_at_ns.get() {
            if at <= end {
                self.irq_at_ns.set(None);
                self.now_ns.set(at.max(self.now_ns.get()));
                self.irq_pending.set(true);
                self.service_pending();
            }
        }
        self.now_ns.set(end);
    }

    // ---- Interrupts ----

    /// Make the interrupt pending at simulated time `at_ns`
    pub fn schedule_interrupt(&self, at_ns: u64) {
        self.irq_at_ns.set(Some(at_ns));
    }

    /// Make the interrupt pending now
    pub fn raise_interrupt(&self) {
        self.irq_pending.set(true);
        self.service_pending();
    }

    /// Number of times the interrupt handler ran
    pub fn interrupt_count(&self) -> u32 {
        self.irq_count.get()
    }

    /// Check if interrupts are currently enabled
    pub fn interrupts_enabled(&self) -> bool {
        self.irq_enabled.get()
    }

    /// Timestamps at which the interrupt handler ran
    pub fn serviced_at(&self) -> Vec<u64, MAX_WINDOWS> {
        self.irq_serviced.borrow().clone()
    }

    /// Completed spans with interrupts masked
    pub fn masked_windows(&self) -> Vec<Window, MAX_WINDOWS> {
        self.masked.borrow().clone()
    }

    fn service_pending(&self) {
        if self.irq_pending.get() && self.irq_enabled.get() {
            self.irq_pending.set(false);
            self.irq_count.set(self.irq_count.get() + 1);
            let _ = self.irq_serviced.borrow_mut().push(self.now_ns.get());
        }
    }

    // ---- Trace ----

    /// Recorded edges, oldest first
    pub fn edges(&self) -> Vec<Edge, TRACE_CAPACITY> {
        self.trace.borrow().clone()
    }

    /// Check if edges were dropped because the trace was full
    pub fn trace_overflowed(&self) -> bool {
        self.overflowed.get()
    }

    /// Forget recorded edges; current latches become the new baseline
    pub fn clear_trace(&self) {
        self.trace.borrow_mut().clear();
        self.overflowed.set(false);
        for (baseline, latch) in self.baseline.iter().zip(self.latch.iter()) {
            baseline.set(latch.get());
        }
    }

    /// Level of a pin when the trace was last cleared
    pub fn baseline_level(&self, pin: PinId) -> Level {
        let value = self.baseline[Self::port_of(pin)].get();
        Level::from_bit(value & Self::mask_of(pin) != 0)
    }

    /// Number of rising edges recorded on a pin
    pub fn rising_edges(&self, pin: PinId) -> usize {
        self.trace
            .borrow()
            .iter()
            .filter(|e| e.pin == pin && e.level == Level::High)
            .count()
    }

    /// Number of edges recorded on a pin
    pub fn edge_count(&self, pin: PinId) -> usize {
        self.trace.borrow().iter().filter(|e| e.pin == pin).count()
    }

    /// Level of `data` at every rising edge of `clock`
    pub fn sample_on_rising(&self, clock: PinId, data: PinId) -> Vec<Level, MAX_SAMPLES> {
        let mut level = self.baseline_level(data);
        let mut samples = Vec::new();

        for edge in self.trace.borrow().iter() {
            if edge.pin == data {
                level = edge.level;
            } else if edge.pin == clock && edge.level == Level::High {
                let _ = samples.push(level);
            }
        }

        samples
    }

    /// Bytes latched by an external shift register wired to the three pins
    ///
    /// Bits shift in on `clock` rising edges, MSB first; a `strobe` rising edge
    /// copies the register to its outputs.
    pub fn latched_bytes(&self, data: PinId, clock: PinId, strobe: PinId) -> Vec<u8, MAX_SAMPLES> {
        let mut level = self.baseline_level(data);
        let mut register = 0u8;
        let mut latched = Vec::new();

        for edge in self.trace.borrow().iter() {
            if edge.pin == data {
                level = edge.level;
            } else if edge.pin == clock && edge.level == Level::High {
                register = (register << 1) | level.is_high() as u8;
            } else if edge.pin == strobe && edge.level == Level::High {
                let _ = latched.push(register);
            }
        }

        latched
    }

    /// LOW/HIGH pulse pairs on a pin, each starting at a falling edge
    ///
    /// The HIGH part of the last pulse runs until the current time.
    pub fn pulses(&self, pin: PinId) -> Vec<PulseWidth, MAX_SAMPLES> {
        let mut pulses = Vec::new();
        let mut fell: Option<u64> = None;
        let mut rose: Option<(u64, u64)> = None;

        for edge in self.trace.borrow().iter().filter(|e| e.pin == pin) {
            match edge.level {
                Level::Low => {
                    if let Some((f, r)) = rose.take() {
                        let _ = pulses.push(PulseWidth::new((r - f) as u32, (edge.at_ns - r) as u32));
                    }
                    fell = Some(edge.at_ns);
                }
                Level::High => {
                    if let Some(f) = fell.take() {
                        rose = Some((f, edge.at_ns));
                    }
                }
            }
        }

        if let Some((f, r)) = rose {
            let _ = pulses.push(PulseWidth::new((r - f) as u32, (self.now_ns() - r) as u32));
        }

        pulses
    }
}

impl<'a> PortRegister for SimRegister<'a> {
    fn set_bits(self, mask: PortMask) {
        match self.kind {
            RegisterKind::Output => {
                let value = self.board.latch[self.port].get() | mask;
                self.board.store_latch(self.port, value);
            }
            RegisterKind::Input => {
                let cell = &self.board.input[self.port];
                cell.set(cell.get() | mask);
            }
        }
    }

    fn clear_bits(self, mask: PortMask) {
        match self.kind {
            RegisterKind::Output => {
                let value = self.board.latch[self.port].get() & !mask;
                self.board.store_latch(self.port, value);
            }
            RegisterKind::Input => {
                let cell = &self.board.input[self.port];
                cell.set(cell.get() & !mask);
            }
        }
    }

    fn toggle_bits(self, mask: PortMask) {
        match self.kind {
            RegisterKind::Output => {
                let value = self.board.latch[self.port].get() ^ mask;
                self.board.store_latch(self.port, value);
            }
            RegisterKind::Input => {
                let cell = &self.board.input[self.port];
                cell.set(cell.get() ^ mask);
            }
        }
    }

    fn read_bits(self) -> PortMask {
        match self.kind {
            RegisterKind::Output => self.board.latch[self.port].get(),
            RegisterKind::Input => self.board.read_port(self.port),
        }
    }
}

impl DigitalIo for &SimBoard {
    fn pin_mode(&mut self, pin: PinId, mode: PinMode) {
        let board = *self;
        board.generic_calls.set(board.generic_calls.get() + 1);

        let flag = SimBoard::pin_flag(pin);
        board.configured.set(board.configured.get() | flag);
        match mode {
            PinMode::Output => board.outputs.set(board.outputs.get() | flag),
            PinMode::Input => board.outputs.set(board.outputs.get() & !flag),
        }
    }

    fn digital_write(&mut self, pin: PinId, level: Level) {
        let board = *self;
        board.generic_calls.set(board.generic_calls.get() + 1);

        // Like the Arduino core, a write detaches the pin's PWM timer
        board.pwm.set(board.pwm.get() & !SimBoard::pin_flag(pin));

        let port = SimBoard::port_of(pin);
        let mask = SimBoard::mask_of(pin);
        let value = match level {
            Level::High => board.latch[port].get() | mask,
            Level::Low => board.latch[port].get() & !mask,
        };
        board.store_latch(port, value);
    }

    fn digital_read(&mut self, pin: PinId) -> Level {
        let board = *self;
        board.generic_calls.set(board.generic_calls.get() + 1);

        let port = SimBoard::port_of(pin);
        Level::from_bit(board.read_port(port) & SimBoard::mask_of(pin) != 0)
    }
}

impl<'a> PortMap for &'a SimBoard {
    type Register = SimRegister<'a>;

    fn output_register(&self, pin: PinId) -> SimRegister<'a> {
        SimRegister {
            board: *self,
            port: SimBoard::port_of(pin),
            kind: RegisterKind::Output,
        }
    }

    fn input_register(&self, pin: PinId) -> SimRegister<'a> {
        SimRegister {
            board: *self,
            port: SimBoard::port_of(pin),
            kind: RegisterKind::Input,
        }
    }

    fn bit_mask(&self, pin: PinId) -> PortMask {
        SimBoard::mask_of(pin)
    }
}

impl DelayNs for &SimBoard {
    fn delay_ns(&mut self, ns: u32) {
        self.advance_ns(ns as u64);
    }
}

impl InterruptControl for &SimBoard {
    type State = bool;

    fn disable(&mut self) -> bool {
        let board = *self;
        let was_enabled = board.irq_enabled.replace(false);
        if was_enabled {
            board.masked_since.set(Some(board.now_ns()));
        }
        was_enabled
    }

    fn restore(&mut self, was_enabled: bool) {
        let board = *self;
        if !was_enabled {
            return;
        }

        board.irq_enabled.set(true);
        if let Some(start_ns) = board.masked_since.take() {
            let _ = board.masked.borrow_mut().push(Window {
                start_ns,
                end_ns: board.now_ns(),
            });
        }
        board.service_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduled_interrupt_fires_when_enabled() {
        let board = SimBoard::new();
        board.schedule_interrupt(500);

        board.advance_ns(400);
        assert_eq!(board.interrupt_count(), 0);

        board.advance_ns(200);
        assert_eq!(board.interrupt_count(), 1);
        assert_eq!(board.serviced_at().as_slice(), &[500]);
        assert_eq!(board.now_ns(), 600);
    }

    #[test]
    fn test_masked_interrupt_waits_for_restore() {
        let board = SimBoard::new();
        let mut irq = &board;

        let saved = irq.disable();
        board.raise_interrupt();
        board.advance_ns(1_000);
        assert_eq!(board.interrupt_count(), 0);

        irq.restore(saved);
        assert_eq!(board.interrupt_count(), 1);
        assert_eq!(board.serviced_at().as_slice(), &[1_000]);
        assert_eq!(
            board.masked_windows().as_slice(),
            &[Window {
                start_ns: 0,
                end_ns: 1_000
            }]
        );
    }

    #[test]
    fn test_edges_record_only_changes() {
        let board = SimBoard::new();
        let reg = (&board).output_register(9);

        reg.set_bits(SimBoard::mask_of(9));
        reg.set_bits(SimBoard::mask_of(9));
        reg.clear_bits(SimBoard::mask_of(9));

        let edges = board.edges();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].pin, 9);
        assert_eq!(edges[0].level, Level::High);
        assert_eq!(edges[1].level, Level::Low);
    }

    #[test]
    fn test_input_register_reflects_pins() {
        let board = SimBoard::new();
        let mut io = &board;

        io.pin_mode(3, PinMode::Input);
        io.pin_mode(4, PinMode::Output);
        board.set_input(3, Level::High);
        io.digital_write(4, Level::High);

        let reg = io.input_register(3);
        assert_eq!(reg.read_bits(), 0b0001_1000);
        assert_eq!(io.digital_read(3), Level::High);
        assert_eq!(io.digital_read(4), Level::High);
    }
}
