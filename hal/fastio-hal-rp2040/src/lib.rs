//! RP2040 board support for fastio
//!
//! Implements the `fastio-hal` traits on the RP2040:
//!
//! - Port registers through the SIO block's set/clear/xor aliases, so a
//!   single pin write is one atomic store
//! - Pin table handing out GPIOs by number for config-driven wiring
//! - PRIMASK-based interrupt masking
//! - Flash-backed record storage for calibration data

#![no_std]

pub mod board;
pub mod flash;
pub mod interrupt;
pub mod pins;
pub mod sio;

pub use board::Rp2040Board;
pub use flash::Rp2040FlashStorage;
pub use interrupt::CortexInterrupts;
pub use pins::{PinBank, PinError, RemainingPeripherals};
pub use sio::SioRegister;
