//! FastIO Hardware Abstraction Layer
//!
//! This crate defines the board-facing traits the fast I/O layer is built on.
//! A board crate implements them once; `fastio-core` turns them into resolved
//! pin handles, single-instruction primitives and bit-banged protocols.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Consumers (fastio-drivers, firmware)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  fastio-core (resolver, protocols)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  fastio-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │  fastio-hal-  │
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::DigitalIo`] - Generic (slow path) pin configuration and access
//! - [`gpio::PortMap`], [`gpio::PortRegister`] - Direct port register access
//! - [`interrupt::InterruptControl`] - Masking interrupts around timed code
//! - [`storage::RecordStorage`] - Persisting calibration records

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod interrupt;
pub mod storage;

// Re-export key traits at crate root for convenience
pub use gpio::{
    DigitalIo, InitialState, Level, PinId, PinMode, PortMap, PortMask, PortRegister, SKIP,
};
pub use interrupt::InterruptControl;
pub use storage::{RecordStorage, StorageError, StorageKey};
