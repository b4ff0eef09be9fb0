//! Clocked shift-out
//!
//! Feeds a byte into an external shift register over a data and a clock
//! line. The clock idles LOW; data is set before each rising edge. Latching
//! the register's outputs is left to the caller.

use fastio_hal::Level;

use crate::io::{FastIo, ResolvedPin};

/// Order in which the bits of a byte go out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitOrder {
    /// Bit 7 first
    #[default]
    MsbFirst,
    /// Bit 0 first
    LsbFirst,
}

/// Shift `value` out MSB first
///
/// `clock` must be LOW on entry and is LOW on return.
#[inline]
pub fn shift_out<B: FastIo>(
    io: &mut B,
    data: &ResolvedPin<B::Register>,
    clock: &ResolvedPin<B::Register>,
    value: u8,
) {
    shift_out_ordered(io, data, clock, value, BitOrder::MsbFirst);
}

/// Shift `value` out in the given bit order
pub fn shift_out_ordered<B: FastIo>(
    io: &mut B,
    data: &ResolvedPin<B::Register>,
    clock: &ResolvedPin<B::Register>,
    value: u8,
    order: BitOrder,
) {
    for i in 0..8 {
        let bit = match order {
            BitOrder::MsbFirst => 7 - i,
            BitOrder::LsbFirst => i,
        };
        data.write(io, Level::from_bit(value & (1 << bit) != 0));
        clock.set_high(io);
        clock.switch_to(io, Level::Low);
    }
}

/// Shift out eight zero bits
///
/// Data is driven LOW once and held for all eight clock pulses.
pub fn shift_out_zero<B: FastIo>(
    io: &mut B,
    data: &ResolvedPin<B::Register>,
    clock: &ResolvedPin<B::Register>,
) {
    data.set_low(io);
    for _ in 0..8 {
        clock.set_high(io);
        clock.switch_to(io, Level::Low);
    }
}
