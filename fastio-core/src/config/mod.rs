//! Configuration types
//!
//! Build-time I/O mode selection and the Shift1 timing table, including the
//! calibration record that can be persisted as postcard binary data.

pub mod calibration;
pub mod timing;
pub mod types;

pub use calibration::*;
pub use timing::*;
pub use types::*;
