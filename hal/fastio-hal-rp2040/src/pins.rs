//! GPIO pin table
//!
//! Holds every GPIO so pins can be handed out by number, as read from the
//! board configuration, instead of by peripheral name.

use embassy_rp::gpio::AnyPin;
use embassy_rp::peripherals::{DMA_CH0, FLASH};
use embassy_rp::{Peri, Peripherals};

/// Number of user GPIOs on the RP2040
pub const GPIO_COUNT: usize = 30;

/// Error when requesting a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number out of range (0-29 valid)
    InvalidPin,
    /// Pin already taken
    AlreadyTaken,
}

/// Pin bank that holds all GPIO pins and allows taking them by number
pub struct PinBank {
    pins: [Option<Peri<'static, AnyPin>>; GPIO_COUNT],
}

/// Non-GPIO peripherals left over after building the [`PinBank`]
pub struct RemainingPeripherals {
    pub flash: Peri<'static, FLASH>,
    pub dma_ch0: Peri<'static, DMA_CH0>,
}

impl PinBank {
    /// Split the peripherals into the pin bank and the rest
    pub fn from_peripherals(p: Peripherals) -> (Self, RemainingPeripherals) {
        let bank = Self {
            pins: [
                Some(p.PIN_0.into()),
                Some(p.PIN_1.into()),
                Some(p.PIN_2.into()),
                Some(p.PIN_3.into()),
                Some(p.PIN_4.into()),
                Some(p.PIN_5.into()),
                Some(p.PIN_6.into()),
                Some(p.PIN_7.into()),
                Some(p.PIN_8.into()),
                Some(p.PIN_9.into()),
                Some(p.PIN_10.into()),
                Some(p.PIN_11.into()),
                Some(p.PIN_12.into()),
                Some(p.PIN_13.into()),
                Some(p.PIN_14.into()),
                Some(p.PIN_15.into()),
                Some(p.PIN_16.into()),
                Some(p.PIN_17.into()),
                Some(p.PIN_18.into()),
                Some(p.PIN_19.into()),
                Some(p.PIN_20.into()),
                Some(p.PIN_21.into()),
                Some(p.PIN_22.into()),
                Some(p.PIN_23.into()),
                Some(p.PIN_24.into()),
                Some(p.PIN_25.into()),
                Some(p.PIN_26.into()),
                Some(p.PIN_27.into()),
                Some(p.PIN_28.into()),
                Some(p.PIN_29.into()),
            ],
        };
        let remaining = RemainingPeripherals {
            flash: p.FLASH,
            dma_ch0: p.DMA_CH0,
        };
        (bank, remaining)
    }

    /// Take a pin by number
    pub fn take(&mut self, pin_num: u8) -> Result<Peri<'static, AnyPin>, PinError> {
        self.pins
            .get_mut(pin_num as usize)
            .ok_or(PinError::InvalidPin)?
            .take()
            .ok_or(PinError::AlreadyTaken)
    }

    /// Check if a pin is available
    pub fn is_available(&self, pin_num: u8) -> bool {
        matches!(self.pins.get(pin_num as usize), Some(Some(_)))
    }
}
