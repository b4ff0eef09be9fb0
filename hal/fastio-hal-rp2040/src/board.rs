//! RP2040 pin table for the fast I/O layer
//!
//! Pins are claimed from the [`PinBank`] the first time they are configured
//! and stay claimed for the life of the board. Claiming a pin switches its
//! function to SIO, which detaches PWM or any other peripheral from it.

use embassy_rp::gpio::{Flex, Pull};
use fastio_hal::{DigitalIo, Level, PinId, PinMode, PortMap, PortMask};

use crate::pins::{PinBank, GPIO_COUNT};
use crate::sio::SioRegister;

/// Board pin table backed by embassy `Flex` pins
pub struct Rp2040Board {
    bank: PinBank,
    pins: [Option<Flex<'static>>; GPIO_COUNT],
}

impl Rp2040Board {
    pub fn new(bank: PinBank) -> Self {
        Self {
            bank,
            pins: core::array::from_fn(|_| None),
        }
    }

    /// Claimed pin, claiming it from the bank on first use
    ///
    /// Unknown or unavailable pins are logged and ignored.
    fn flex(&mut self, pin: PinId) -> Option<&mut Flex<'static>> {
        let slot = self.pins.get_mut(pin as usize)?;
        if slot.is_none() {
            match self.bank.take(pin) {
                Ok(p) => *slot = Some(Flex::new(p)),
                Err(_e) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("gpio{}: {}", pin, _e);
                    return None;
                }
            }
        }
        slot.as_mut()
    }
}

impl DigitalIo for Rp2040Board {
    fn pin_mode(&mut self, pin: PinId, mode: PinMode) {
        if let Some(flex) = self.flex(pin) {
            match mode {
                PinMode::Output => flex.set_as_output(),
                PinMode::Input => {
                    flex.set_pull(Pull::None);
                    flex.set_as_input();
                }
            }
        }
    }

    fn digital_write(&mut self, pin: PinId, level: Level) {
        if let Some(flex) = self.flex(pin) {
            match level {
                Level::High => flex.set_high(),
                Level::Low => flex.set_low(),
            }
        }
    }

    fn digital_read(&mut self, pin: PinId) -> Level {
        match self.flex(pin) {
            Some(flex) => Level::from_bit(flex.is_high()),
            None => Level::Low,
        }
    }
}

impl PortMap for Rp2040Board {
    type Register = SioRegister;

    fn output_register(&self, _pin: PinId) -> SioRegister {
        SioRegister::Output
    }

    fn input_register(&self, _pin: PinId) -> SioRegister {
        SioRegister::Input
    }

    fn bit_mask(&self, pin: PinId) -> PortMask {
        1 << pin
    }
}
