//! Bit-banged serial protocols built on [`FastIo`](crate::io::FastIo)

pub mod shift;
pub mod shift1;

pub use shift::{shift_out, shift_out_ordered, shift_out_zero, BitOrder};
pub use shift1::{classify, Framing, Pulse, PulseWidth, Shift1, Shift1Decoder};
