//! Persistent storage for calibration records
//!
//! Chip HALs back this with wear-leveled flash. Records are opaque byte
//! strings; encoding and integrity checks belong to the caller.

/// Storage keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StorageKey {
    /// Shift1 timing calibration (postcard record)
    Shift1Calibration = 0,
}

impl StorageKey {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(StorageKey::Shift1Calibration),
            _ => None,
        }
    }
}

/// Errors from storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// Flash operation failed
    Flash,
    /// Key-value layer failed
    Storage,
    /// Key not found
    NotFound,
    /// Buffer too small for the record
    BufferTooSmall,
}

/// Key-value record storage
pub trait RecordStorage {
    /// Read a record into `buffer`, returning its length
    fn read(
        &mut self,
        key: StorageKey,
        buffer: &mut [u8],
    ) -> impl core::future::Future<Output = Result<usize, StorageError>>;

    /// Write a record, replacing any previous one
    fn write(
        &mut self,
        key: StorageKey,
        data: &[u8],
    ) -> impl core::future::Future<Output = Result<(), StorageError>>;
}

#[cfg(feature = "sequential-storage")]
impl sequential_storage::map::Key for StorageKey {
    fn serialize_into(
        &self,
        buffer: &mut [u8],
    ) -> Result<usize, sequential_storage::map::SerializationError> {
        if buffer.is_empty() {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        buffer[0] = self.as_u8();
        Ok(1)
    }

    fn deserialize_from(
        buffer: &[u8],
    ) -> Result<(Self, usize), sequential_storage::map::SerializationError> {
        if buffer.is_empty() {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        match StorageKey::from_u8(buffer[0]) {
            Some(key) => Ok((key, 1)),
            None => Err(sequential_storage::map::SerializationError::InvalidFormat),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_byte_mapping() {
        assert_eq!(StorageKey::Shift1Calibration.as_u8(), 0);
        assert_eq!(StorageKey::from_u8(0), Some(StorageKey::Shift1Calibration));
        assert_eq!(StorageKey::from_u8(7), None);
    }
}
