//! Character LCD over a serial expander
//!
//! The LCD runs in 4-bit mode behind an 8-bit shift register. Each nibble
//! goes out as one register frame with EN set, then again with EN cleared;
//! the LCD samples its data lines on the falling edge of EN.

pub mod hd44780;
pub mod shift1;
pub mod shift_register;

pub use hd44780::{Font, Hd44780};
pub use shift1::Shift1Bus;
pub use shift_register::{ShiftRegisterBus, ShiftRegisterPins};

/// HD44780 instruction set
pub mod cmd {
    pub const CLEAR_DISPLAY: u8 = 0x01;
    pub const RETURN_HOME: u8 = 0x02;
    pub const ENTRY_MODE_SET: u8 = 0x04;
    pub const DISPLAY_CONTROL: u8 = 0x08;
    pub const CURSOR_SHIFT: u8 = 0x10;
    pub const FUNCTION_SET: u8 = 0x20;
    pub const SET_DDRAM_ADDR: u8 = 0x80;

    // Entry mode
    pub const ENTRY_LEFT: u8 = 0x02;
    pub const ENTRY_SHIFT_INCREMENT: u8 = 0x01;
    pub const ENTRY_SHIFT_DECREMENT: u8 = 0x00;

    // Display control
    pub const DISPLAY_ON: u8 = 0x04;
    pub const CURSOR_ON: u8 = 0x02;
    pub const BLINK_ON: u8 = 0x01;

    // Cursor / display shift
    pub const DISPLAY_MOVE: u8 = 0x08;
    pub const CURSOR_MOVE: u8 = 0x00;
    pub const MOVE_RIGHT: u8 = 0x04;
    pub const MOVE_LEFT: u8 = 0x00;

    // Function set
    pub const EIGHT_BIT_MODE: u8 = 0x10;
    pub const TWO_LINE: u8 = 0x08;
    pub const FONT_5X10: u8 = 0x04;
}

/// Target register of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegisterSelect {
    /// Instruction register (RS low)
    Command,
    /// Data register (RS high)
    Data,
}

/// Moves nibbles from the sequencer to the LCD
pub trait LcdTransport {
    /// Send the low four bits of `nibble`
    fn send_nibble(&mut self, nibble: u8, rs: RegisterSelect);

    /// Send a full byte, high nibble first
    fn send_byte(&mut self, value: u8, rs: RegisterSelect) {
        self.send_nibble(value >> 4, rs);
        self.send_nibble(value & 0x0F, rs);
    }

    /// Switch the backlight
    fn set_backlight(&mut self, on: bool);
}

impl<T: LcdTransport + ?Sized> LcdTransport for &mut T {
    fn send_nibble(&mut self, nibble: u8, rs: RegisterSelect) {
        (**self).send_nibble(nibble, rs);
    }

    fn send_byte(&mut self, value: u8, rs: RegisterSelect) {
        (**self).send_byte(value, rs);
    }

    fn set_backlight(&mut self, on: bool) {
        (**self).set_backlight(on);
    }
}

/// Bit assignment of the expander frame
///
/// Bit 0 is left unused so the same layout works over Shift1, which cannot
/// carry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameLayout {
    /// Position of D4 (D5..D7 follow)
    pub data_shift: u8,
    pub enable: u8,
    pub register_select: u8,
    pub backlight: u8,
}

impl Default for FrameLayout {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl FrameLayout {
    /// D4..D7 on bits 4..7, EN on bit 3, RS on bit 2, backlight on bit 1
    pub const STANDARD: Self = Self {
        data_shift: 4,
        enable: 0x08,
        register_select: 0x04,
        backlight: 0x02,
    };

    /// Frame carrying `nibble` with EN low
    pub fn frame(&self, nibble: u8, rs: RegisterSelect, backlight: bool) -> u8 {
        let mut frame = (nibble & 0x0F) << self.data_shift;
        if rs == RegisterSelect::Data {
            frame |= self.register_select;
        }
        frame | self.idle(backlight)
    }

    /// Frame with nothing but the backlight bit
    pub fn idle(&self, backlight: bool) -> u8 {
        if backlight {
            self.backlight
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_layout() {
        let layout = FrameLayout::default();

        assert_eq!(layout.frame(0xA, RegisterSelect::Command, false), 0xA0);
        assert_eq!(layout.frame(0xA, RegisterSelect::Data, false), 0xA4);
        assert_eq!(layout.frame(0x3, RegisterSelect::Data, true), 0x36);
        assert_eq!(layout.idle(true), 0x02);
    }

    #[test]
    fn test_frames_never_use_bit_zero() {
        let layout = FrameLayout::STANDARD;
        for nibble in 0..16 {
            for rs in [RegisterSelect::Command, RegisterSelect::Data] {
                let frame = layout.frame(nibble, rs, true) | layout.enable;
                assert_eq!(frame & 0x01, 0);
            }
        }
    }
}
