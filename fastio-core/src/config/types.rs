//! I/O mode selection

/// How resolved pins reach the hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoMode {
    /// Direct port register writes
    Native,
    /// Generic per-pin digital I/O calls
    Fallback,
}

impl IoMode {
    /// Mode selected by the `fallback` cargo feature
    pub const fn selected() -> Self {
        if cfg!(feature = "fallback") {
            IoMode::Fallback
        } else {
            IoMode::Native
        }
    }

    /// Check if this is the direct register mode
    pub const fn is_native(self) -> bool {
        matches!(self, IoMode::Native)
    }
}
