//! Drivers built on fastio transports
//!
//! - HD44780 character LCD sequencing
//! - LCD transports over a clocked shift register or a Shift1 line

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod lcd;
