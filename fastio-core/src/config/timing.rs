//! Shift1 timing table
//!
//! A Shift1 receiver is a shift register whose clock and data inputs are fed
//! from one line through two RC networks. A short LOW pulse is too short to
//! discharge the data capacitor (a one), a longer pulse discharges it (a
//! zero), and a very long pulse also discharges the latch capacitor.
//!
//! Every hold below is a best-effort delay. The code around each delay call
//! adds latency of its own, so the default table sits a little below the
//! nominal protocol numbers. Boards with different instruction timing should
//! measure and use [`Shift1Timing::calibrated`].

use serde::{Deserialize, Serialize};

use crate::protocol::shift1::Framing;

/// Longest LOW still read as a one bit (µs)
pub const ONE_MAX_LOW_US: u32 = 7;

/// Longest LOW still read as a zero bit (µs)
pub const ZERO_MAX_LOW_US: u32 = 30;

/// Shortest LOW read as the latch pulse (µs)
pub const LATCH_MIN_LOW_US: u32 = 150;

/// Shortest HIGH after a data bit that lets the receiver recharge (µs)
pub const MIN_RECOVERY_HIGH_US: u32 = 10;

/// Per-hold call overhead assumed by the default table (µs)
pub const DEFAULT_OVERHEAD_US: u32 = 1;

/// Number of timed holds in one frame (7 data bits + framing, LOW and HIGH each)
pub const HOLDS_PER_FRAME: u32 = 16;

/// Errors from [`Shift1Timing::validate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimingError {
    /// One-bit LOW would be read as a zero
    OneLowTooLong,
    /// Zero-bit LOW would be read as a one
    ZeroLowTooShort,
    /// Zero-bit LOW runs into the latch window
    ZeroLowTooLong,
    /// Latch LOW would be read as a data bit
    LatchTooShort,
    /// A data bit's HIGH is too short for the receiver to recharge
    RecoveryTooShort,
}

/// Shift1 hold durations in microseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Shift1Timing {
    /// HIGH hold of the init phase (receiver capacitors charge)
    pub settle_us: u32,
    /// LOW hold of a zero bit
    pub zero_low_us: u32,
    /// HIGH hold of a zero bit
    pub zero_high_us: u32,
    /// LOW hold of a one bit (0 = immediate transition)
    pub one_low_us: u32,
    /// HIGH hold of a one bit
    pub one_high_us: u32,
    /// LOW hold of the latch pulse
    pub latch_low_us: u32,
    /// HIGH hold after the latch pulse
    pub latch_high_us: u32,
}

impl Default for Shift1Timing {
    fn default() -> Self {
        Self::compensated(DEFAULT_OVERHEAD_US)
    }
}

impl Shift1Timing {
    /// Protocol numbers without any overhead compensation
    pub const NOMINAL: Self = Self {
        settle_us: 300,
        zero_low_us: 15,
        zero_high_us: 30,
        one_low_us: 1,
        one_high_us: 15,
        latch_low_us: 200,
        latch_high_us: 300,
    };

    /// Nominal table with `overhead_us` taken off every timed hold
    ///
    /// The init settle time is not compensated; it only has to be long enough.
    pub const fn compensated(overhead_us: u32) -> Self {
        let n = Self::NOMINAL;
        Self {
            settle_us: n.settle_us,
            zero_low_us: n.zero_low_us.saturating_sub(overhead_us),
            zero_high_us: n.zero_high_us.saturating_sub(overhead_us),
            one_low_us: n.one_low_us.saturating_sub(overhead_us),
            one_high_us: n.one_high_us.saturating_sub(overhead_us),
            latch_low_us: n.latch_low_us.saturating_sub(overhead_us),
            latch_high_us: n.latch_high_us.saturating_sub(overhead_us),
        }
    }

    /// Derive a table from a measured frame
    ///
    /// `measured_frame_us` is the wall time of one `send` of `value` with
    /// [`NOMINAL`](Self::NOMINAL) timing. The excess over the programmed holds
    /// is spread evenly over the frame's holds and compensated.
    pub fn calibrated(measured_frame_us: u32, value: u8, framing: Framing) -> Self {
        Self::compensated(Self::overhead_from_frame(measured_frame_us, value, framing))
    }

    /// Per-hold overhead implied by a frame measured with nominal timing
    pub fn overhead_from_frame(measured_frame_us: u32, value: u8, framing: Framing) -> u32 {
        let programmed = Self::NOMINAL.frame_duration_us(value, framing);
        let overhead_us = measured_frame_us.saturating_sub(programmed) / HOLDS_PER_FRAME;

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "shift1: frame took {}us for {}us programmed, {}us per hold",
            measured_frame_us,
            programmed,
            overhead_us
        );

        overhead_us
    }

    /// Sum of the programmed holds for one frame
    pub fn frame_duration_us(&self, value: u8, framing: Framing) -> u32 {
        let data: u32 = (1..8)
            .map(|i| {
                if value & (1 << i) != 0 {
                    self.one_period_us()
                } else {
                    self.zero_period_us()
                }
            })
            .sum();

        let tail = match framing {
            Framing::Latch => self.latch_low_us + self.latch_high_us,
            Framing::NoLatch => self.zero_period_us(),
        };

        data + tail
    }

    /// Programmed period of a zero bit
    pub const fn zero_period_us(&self) -> u32 {
        self.zero_low_us + self.zero_high_us
    }

    /// Programmed period of a one bit
    pub const fn one_period_us(&self) -> u32 {
        self.one_low_us + self.one_high_us
    }

    /// Check that every symbol stays inside the receiver's decode windows
    pub fn validate(&self) -> Result<(), TimingError> {
        if self.one_low_us > ONE_MAX_LOW_US {
            return Err(TimingError::OneLowTooLong);
        }
        if self.zero_low_us <= ONE_MAX_LOW_US {
            return Err(TimingError::ZeroLowTooShort);
        }
        if self.zero_low_us > ZERO_MAX_LOW_US {
            return Err(TimingError::ZeroLowTooLong);
        }
        if self.latch_low_us < LATCH_MIN_LOW_US {
            return Err(TimingError::LatchTooShort);
        }
        if self.zero_high_us < MIN_RECOVERY_HIGH_US || self.one_high_us < MIN_RECOVERY_HIGH_US {
            return Err(TimingError::RecoveryTooShort);
        }
        Ok(())
    }
}
