//! Shift1 calibration record
//!
//! Stores a measured timing table so it can be persisted and loaded on boot
//! instead of re-measuring.

use serde::{Deserialize, Serialize};

use super::timing::{Shift1Timing, TimingError};

/// Magic number to identify valid calibration data
pub const CALIBRATION_MAGIC: u32 = 0x5348_3143; // "SH1C"

/// Current calibration data version
pub const CALIBRATION_VERSION: u8 = 1;

/// Upper bound of an encoded record (postcard varints, worst case)
pub const CALIBRATION_MAX_SIZE: usize = 64;

/// Errors from encoding or decoding a calibration record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// Output buffer too small for the record
    BufferTooSmall,
    /// Serialization failed
    Encode,
    /// Bytes are not a postcard-encoded record
    Decode,
    /// Magic number mismatch
    BadMagic,
    /// Record written by an incompatible version
    UnsupportedVersion,
    /// Checksum mismatch
    CrcMismatch,
    /// Stored table fails validation
    InvalidTiming(TimingError),
}

/// Persisted Shift1 calibration
///
/// This struct is serialized using postcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Shift1Calibration {
    /// Magic number for validation
    pub magic: u32,
    /// Data format version
    pub version: u8,
    /// Measured per-hold overhead (µs)
    pub overhead_us: u32,
    /// Timing table derived from the overhead
    pub timing: Shift1Timing,
    /// CRC32 checksum (calculated over magic..timing)
    pub crc: u32,
}

impl Default for Shift1Calibration {
    fn default() -> Self {
        Self::from_overhead(super::timing::DEFAULT_OVERHEAD_US)
    }
}

impl Shift1Calibration {
    /// Create a record for a measured per-hold overhead
    pub fn from_overhead(overhead_us: u32) -> Self {
        let mut cal = Self {
            magic: CALIBRATION_MAGIC,
            version: CALIBRATION_VERSION,
            overhead_us,
            timing: Shift1Timing::compensated(overhead_us),
            crc: 0,
        };
        cal.update_crc();
        cal
    }

    /// Check if the header is valid (magic and version match)
    pub fn is_valid(&self) -> bool {
        self.magic == CALIBRATION_MAGIC && self.version == CALIBRATION_VERSION
    }

    /// Calculate CRC32 over the record (excluding the crc field itself)
    pub fn calculate_crc(&self) -> u32 {
        let t = &self.timing;
        let mut crc: u32 = 0xFFFF_FFFF;

        crc = crc32_update(crc, &self.magic.to_le_bytes());
        crc = crc32_update(crc, &[self.version]);
        crc = crc32_update(crc, &self.overhead_us.to_le_bytes());

        for hold in [
            t.settle_us,
            t.zero_low_us,
            t.zero_high_us,
            t.one_low_us,
            t.one_high_us,
            t.latch_low_us,
            t.latch_high_us,
        ] {
            crc = crc32_update(crc, &hold.to_le_bytes());
        }

        !crc
    }

    /// Update the CRC field
    pub fn update_crc(&mut self) {
        self.crc = self.calculate_crc();
    }

    /// Verify the CRC is correct
    pub fn verify_crc(&self) -> bool {
        self.crc == self.calculate_crc()
    }

    /// Serialize into `buf`, returning the used prefix
    pub fn encode<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], CalibrationError> {
        postcard::to_slice(self, buf).map_err(|e| match e {
            postcard::Error::SerializeBufferFull => CalibrationError::BufferTooSmall,
            _ => CalibrationError::Encode,
        })
    }

    /// Deserialize and check a stored record
    pub fn decode(bytes: &[u8]) -> Result<Self, CalibrationError> {
        let cal: Self = postcard::from_bytes(bytes).map_err(|_| CalibrationError::Decode)?;

        if cal.magic != CALIBRATION_MAGIC {
            return Err(CalibrationError::BadMagic);
        }
        if cal.version != CALIBRATION_VERSION {
            return Err(CalibrationError::UnsupportedVersion);
        }
        if !cal.verify_crc() {
            return Err(CalibrationError::CrcMismatch);
        }
        cal.timing
            .validate()
            .map_err(CalibrationError::InvalidTiming)?;

        Ok(cal)
    }
}

/// CRC32 update (IEEE 802.3 polynomial, reflected)
fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc = crc;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record() {
        let cal = Shift1Calibration::default();
        assert!(cal.is_valid());
        assert!(cal.verify_crc());
        assert_eq!(cal.timing, Shift1Timing::default());
    }

    #[test]
    fn test_encode_decode() {
        let cal = Shift1Calibration::from_overhead(2);
        let mut buf = [0u8; CALIBRATION_MAX_SIZE];
        let used = cal.encode(&mut buf).unwrap().len();

        let decoded = Shift1Calibration::decode(&buf[..used]).unwrap();
        assert_eq!(decoded, cal);
        assert_eq!(decoded.timing.zero_low_us, 13);
    }

    #[test]
    fn test_encode_small_buffer() {
        let cal = Shift1Calibration::default();
        let mut buf = [0u8; 4];
        assert_eq!(cal.encode(&mut buf), Err(CalibrationError::BufferTooSmall));
    }

    #[test]
    fn test_crc_consistency() {
        let mut cal = Shift1Calibration::from_overhead(1);
        assert!(cal.verify_crc());

        // Modify data without updating CRC
        cal.timing.latch_low_us = 250;
        assert!(!cal.verify_crc());

        let mut buf = [0u8; CALIBRATION_MAX_SIZE];
        let used = cal.encode(&mut buf).unwrap().len();
        assert_eq!(
            Shift1Calibration::decode(&buf[..used]),
            Err(CalibrationError::CrcMismatch)
        );
    }

    #[test]
    fn test_decode_rejects_foreign_data() {
        let mut cal = Shift1Calibration::default();
        cal.magic = 0x5049_4443;
        cal.update_crc();

        let mut buf = [0u8; CALIBRATION_MAX_SIZE];
        let used = cal.encode(&mut buf).unwrap().len();
        assert_eq!(
            Shift1Calibration::decode(&buf[..used]),
            Err(CalibrationError::BadMagic)
        );

        assert_eq!(
            Shift1Calibration::decode(&[]),
            Err(CalibrationError::Decode)
        );
    }

    #[test]
    fn test_decode_rejects_unusable_timing() {
        let cal = Shift1Calibration::from_overhead(10);
        let mut buf = [0u8; CALIBRATION_MAX_SIZE];
        let used = cal.encode(&mut buf).unwrap().len();
        assert_eq!(
            Shift1Calibration::decode(&buf[..used]),
            Err(CalibrationError::InvalidTiming(TimingError::ZeroLowTooShort))
        );
    }
}
