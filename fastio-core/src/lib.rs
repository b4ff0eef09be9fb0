//! Board-agnostic fast pin access
//!
//! This crate contains everything above the board traits of `fastio-hal`:
//!
//! - Capability interface over native port registers vs. generic digital I/O
//! - Pin resolution into register/bit handles
//! - Clocked shift-out (shift register) protocol
//! - Shift1 single-wire self-clocked protocol and its pulse decoder
//! - Interrupt masking guard for timing-critical sections
//! - Shift1 timing tables and calibration records
//!
//! # Thread safety
//!
//! None. Port registers are unsynchronized shared hardware. Two pins on the
//! same port driven from preempting contexts race; callers serialize access
//! or stay single-threaded.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod interrupt;
pub mod io;
pub mod protocol;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use config::{IoMode, Shift1Timing};
pub use interrupt::InterruptGuard;
pub use io::{BoardIo, DirectRegister, FastIo, GenericIo, NoRegister, PinBit, PinResolver, ResolvedPin};
