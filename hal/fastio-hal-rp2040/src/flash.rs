//! Flash record storage for RP2040
//!
//! Uses sequential-storage for wear-leveled key-value storage in the last
//! 64KB of flash.

use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use fastio_hal::{RecordStorage, StorageError, StorageKey};
use sequential_storage::cache::NoCache;
use sequential_storage::map;

/// Flash size of the target board (Raspberry Pi Pico)
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;
/// Partition reserved for records
pub const RECORD_PARTITION_SIZE: usize = 64 * 1024;
pub const RECORD_PARTITION_START: usize = FLASH_SIZE - RECORD_PARTITION_SIZE;

/// Flash range for the record partition
pub const RECORD_RANGE: core::ops::Range<u32> =
    (RECORD_PARTITION_START as u32)..(FLASH_SIZE as u32);

/// Scratch space for one item (key, record and sequential-storage header)
const ITEM_BUFFER_SIZE: usize = 128;

/// RP2040 flash record storage
pub struct Rp2040FlashStorage<'d> {
    flash: Flash<'d, FLASH, Async, FLASH_SIZE>,
}

impl<'d> Rp2040FlashStorage<'d> {
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
        }
    }
}

impl RecordStorage for Rp2040FlashStorage<'_> {
    async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, StorageError> {
        let mut data_buffer = [0u8; ITEM_BUFFER_SIZE];

        let result = map::fetch_item::<StorageKey, &[u8], _>(
            &mut self.flash,
            RECORD_RANGE,
            &mut NoCache::new(),
            &mut data_buffer,
            &key,
        )
        .await;

        match result {
            Ok(Some(data)) => {
                let len = data.len();
                if buffer.len() < len {
                    return Err(StorageError::BufferTooSmall);
                }
                buffer[..len].copy_from_slice(data);
                Ok(len)
            }
            Ok(None) => Err(StorageError::NotFound),
            Err(_) => Err(StorageError::Storage),
        }
    }

    async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), StorageError> {
        let mut data_buffer = [0u8; ITEM_BUFFER_SIZE];

        map::store_item(
            &mut self.flash,
            RECORD_RANGE,
            &mut NoCache::new(),
            &mut data_buffer,
            &key,
            &data,
        )
        .await
        .map_err(|_| StorageError::Storage)
    }
}
