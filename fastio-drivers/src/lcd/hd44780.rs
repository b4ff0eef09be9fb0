//! HD44780 command sequencing
//!
//! Drives any [`LcdTransport`] in 4-bit mode. Timing follows the datasheet:
//! a 100 ms power-on wait, the three-step wake-up (figure 24), then the usual
//! function set / display / clear / entry mode setup.

use embedded_hal::delay::DelayNs;

use super::{cmd, LcdTransport, RegisterSelect};

/// Power-on wait before the first instruction (ms)
const POWER_ON_MS: u32 = 100;

/// Waits after each wake-up nibble (µs)
const WAKE_UP: [(u8, u32); 4] = [(0x03, 4500), (0x03, 150), (0x03, 150), (0x02, 150)];

/// Wait after the final function set (µs)
const FUNCTION_SET_US: u32 = 60;

/// Execution time of clear and home (µs)
const HOME_CLEAR_EXEC_US: u32 = 2000;

/// Execution time of every other instruction (µs)
const EXEC_US: u32 = 37;

const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];
const ROW_OFFSETS_16X4: [u8; 4] = [0x00, 0x40, 0x10, 0x50];

/// Character font
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Font {
    #[default]
    Dots5x8,
    /// Only available on single-line displays
    Dots5x10,
}

/// HD44780 character LCD
pub struct Hd44780<T, D> {
    transport: T,
    delay: D,
    cols: u8,
    lines: u8,
    function: u8,
    control: u8,
    mode: u8,
}

impl<T: LcdTransport, D: DelayNs> Hd44780<T, D> {
    pub fn new(transport: T, delay: D) -> Self {
        Self {
            transport,
            delay,
            cols: 16,
            lines: 1,
            function: 0,
            control: 0,
            mode: 0,
        }
    }

    /// Initialize the display
    ///
    /// Works from any controller state, including one left in 8-bit mode.
    pub fn begin(&mut self, cols: u8, lines: u8, font: Font) {
        self.cols = cols;
        self.lines = lines.max(1);
        self.function = 0;
        if self.lines > 1 {
            self.function |= cmd::TWO_LINE;
        }
        if font == Font::Dots5x10 && self.lines == 1 {
            self.function |= cmd::FONT_5X10;
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("hd44780: begin {}x{} ({})", cols, self.lines, font);

        self.delay.delay_ms(POWER_ON_MS);

        for (nibble, wait_us) in WAKE_UP {
            self.transport.send_nibble(nibble, RegisterSelect::Command);
            self.delay.delay_us(wait_us);
        }

        self.command(cmd::FUNCTION_SET | self.function);
        self.delay.delay_us(FUNCTION_SET_US);

        self.control = cmd::DISPLAY_ON;
        self.display();

        self.clear();

        self.mode = cmd::ENTRY_LEFT | cmd::ENTRY_SHIFT_DECREMENT;
        self.command(cmd::ENTRY_MODE_SET | self.mode);

        self.backlight();
    }

    /// Send an instruction
    pub fn command(&mut self, value: u8) {
        self.send(value, RegisterSelect::Command);
    }

    /// Write a character code at the cursor
    pub fn write(&mut self, value: u8) {
        self.send(value, RegisterSelect::Data);
    }

    fn send(&mut self, value: u8, rs: RegisterSelect) {
        self.transport.send_byte(value, rs);
        self.delay.delay_us(EXEC_US);
    }

    /// Clear the display and return the cursor home
    pub fn clear(&mut self) {
        self.command(cmd::CLEAR_DISPLAY);
        self.delay.delay_us(HOME_CLEAR_EXEC_US);
    }

    /// Return the cursor home and undo any scrolling
    pub fn home(&mut self) {
        self.command(cmd::RETURN_HOME);
        self.delay.delay_us(HOME_CLEAR_EXEC_US);
    }

    /// Move the cursor; rows past the last one land on the last one
    pub fn set_cursor(&mut self, col: u8, row: u8) {
        let row = row.min(self.lines - 1).min(3) as usize;
        let offsets = if self.cols == 16 && self.lines == 4 {
            &ROW_OFFSETS_16X4
        } else {
            &ROW_OFFSETS
        };
        self.command(cmd::SET_DDRAM_ADDR | col.wrapping_add(offsets[row]));
    }

    pub fn display(&mut self) {
        self.control |= cmd::DISPLAY_ON;
        self.update_control();
    }

    pub fn no_display(&mut self) {
        self.control &= !cmd::DISPLAY_ON;
        self.update_control();
    }

    pub fn cursor(&mut self) {
        self.control |= cmd::CURSOR_ON;
        self.update_control();
    }

    pub fn no_cursor(&mut self) {
        self.control &= !cmd::CURSOR_ON;
        self.update_control();
    }

    pub fn blink(&mut self) {
        self.control |= cmd::BLINK_ON;
        self.update_control();
    }

    pub fn no_blink(&mut self) {
        self.control &= !cmd::BLINK_ON;
        self.update_control();
    }

    fn update_control(&mut self) {
        self.command(cmd::DISPLAY_CONTROL | self.control);
    }

    /// Scroll the display left without touching display RAM
    pub fn scroll_display_left(&mut self) {
        self.command(cmd::CURSOR_SHIFT | cmd::DISPLAY_MOVE | cmd::MOVE_LEFT);
    }

    /// Scroll the display right without touching display RAM
    pub fn scroll_display_right(&mut self) {
        self.command(cmd::CURSOR_SHIFT | cmd::DISPLAY_MOVE | cmd::MOVE_RIGHT);
    }

    pub fn move_cursor_left(&mut self) {
        self.command(cmd::CURSOR_SHIFT | cmd::CURSOR_MOVE | cmd::MOVE_LEFT);
    }

    pub fn move_cursor_right(&mut self) {
        self.command(cmd::CURSOR_SHIFT | cmd::CURSOR_MOVE | cmd::MOVE_RIGHT);
    }

    pub fn left_to_right(&mut self) {
        self.mode |= cmd::ENTRY_LEFT;
        self.update_mode();
    }

    pub fn right_to_left(&mut self) {
        self.mode &= !cmd::ENTRY_LEFT;
        self.update_mode();
    }

    /// Shift the display on every write, right-justifying text at the cursor
    pub fn autoscroll(&mut self) {
        self.mode |= cmd::ENTRY_SHIFT_INCREMENT;
        self.update_mode();
    }

    pub fn no_autoscroll(&mut self) {
        self.mode &= !cmd::ENTRY_SHIFT_INCREMENT;
        self.update_mode();
    }

    fn update_mode(&mut self) {
        self.command(cmd::ENTRY_MODE_SET | self.mode);
    }

    pub fn backlight(&mut self) {
        self.transport.set_backlight(true);
    }

    pub fn no_backlight(&mut self) {
        self.transport.set_backlight(false);
    }

    /// Display and backlight on
    pub fn on(&mut self) {
        self.display();
        self.backlight();
    }

    /// Backlight and display off
    pub fn off(&mut self) {
        self.no_backlight();
        self.no_display();
    }

    pub fn transport(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Release the transport and delay
    pub fn release(self) -> (T, D) {
        (self.transport, self.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lcd::shift_register::ShiftRegisterPins;
    use crate::lcd::{FrameLayout, ShiftRegisterBus};
    use fastio_core::io::{DirectRegister, PinResolver};
    use fastio_core::sim::SimBoard;
    use heapless::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Op {
        Nibble(u8, RegisterSelect),
        Backlight(bool),
        WaitUs(u32),
    }

    /// Records transport traffic and delays in one timeline
    #[derive(Default)]
    struct Log {
        ops: core::cell::RefCell<Vec<Op, 128>>,
    }

    impl Log {
        fn push(&self, op: Op) {
            self.ops.borrow_mut().push(op).unwrap();
        }

        fn ops(&self) -> Vec<Op, 128> {
            self.ops.borrow().clone()
        }

        fn clear(&self) {
            self.ops.borrow_mut().clear();
        }

        /// Bytes sent, reassembled from nibble pairs, ignoring waits
        fn bytes(&self) -> Vec<(u8, RegisterSelect), 64> {
            let mut bytes = Vec::new();
            let mut high: Option<u8> = None;
            for op in self.ops.borrow().iter() {
                if let Op::Nibble(n, rs) = *op {
                    match high.take() {
                        Some(h) => bytes.push(((h << 4) | n, rs)).unwrap(),
                        None => high = Some(n),
                    }
                }
            }
            bytes
        }
    }

    struct MockTransport<'a>(&'a Log);

    impl LcdTransport for MockTransport<'_> {
        fn send_nibble(&mut self, nibble: u8, rs: RegisterSelect) {
            self.0.push(Op::Nibble(nibble, rs));
        }

        fn set_backlight(&mut self, on: bool) {
            self.0.push(Op::Backlight(on));
        }
    }

    struct MockDelay<'a>(&'a Log);

    impl DelayNs for MockDelay<'_> {
        fn delay_ns(&mut self, ns: u32) {
            self.0.push(Op::WaitUs(ns / 1000));
        }

        fn delay_us(&mut self, us: u32) {
            self.0.push(Op::WaitUs(us));
        }

        fn delay_ms(&mut self, ms: u32) {
            self.0.push(Op::WaitUs(ms * 1000));
        }
    }

    fn lcd(log: &Log) -> Hd44780<MockTransport<'_>, MockDelay<'_>> {
        Hd44780::new(MockTransport(log), MockDelay(log))
    }

    #[test]
    fn test_begin_sequence() {
        use Op::*;
        use RegisterSelect::Command;

        let log = Log::default();
        let mut lcd = lcd(&log);
        lcd.begin(20, 4, Font::Dots5x8);

        let expected = [
            WaitUs(100_000),
            Nibble(0x3, Command),
            WaitUs(4500),
            Nibble(0x3, Command),
            WaitUs(150),
            Nibble(0x3, Command),
            WaitUs(150),
            Nibble(0x2, Command),
            WaitUs(150),
            // Function set: 4-bit, 2 lines, 5x8
            Nibble(0x2, Command),
            Nibble(0x8, Command),
            WaitUs(EXEC_US),
            WaitUs(60),
            // Display on, cursor off, blink off
            Nibble(0x0, Command),
            Nibble(0xC, Command),
            WaitUs(EXEC_US),
            // Clear
            Nibble(0x0, Command),
            Nibble(0x1, Command),
            WaitUs(EXEC_US),
            WaitUs(2000),
            // Entry mode: left to right, no shift
            Nibble(0x0, Command),
            Nibble(0x6, Command),
            WaitUs(EXEC_US),
            Backlight(true),
        ];
        assert_eq!(log.ops().as_slice(), &expected);
    }

    #[test]
    fn test_large_font_only_on_one_line() {
        let log = Log::default();
        let mut lcd = lcd(&log);

        // The four wake-up nibbles pair up into two bytes ahead of function set
        lcd.begin(16, 1, Font::Dots5x10);
        assert_eq!(log.bytes()[2], (0x24, RegisterSelect::Command));

        log.clear();
        lcd.begin(16, 2, Font::Dots5x10);
        assert_eq!(log.bytes()[2], (0x28, RegisterSelect::Command));
    }

    #[test]
    fn test_set_cursor_row_offsets() {
        let log = Log::default();
        let mut lcd = lcd(&log);

        lcd.begin(20, 4, Font::Dots5x8);
        log.clear();
        lcd.set_cursor(3, 2);
        lcd.set_cursor(0, 9);
        assert_eq!(
            log.bytes().as_slice(),
            &[(0x80 | 0x17, RegisterSelect::Command), (0x80 | 0x54, RegisterSelect::Command)]
        );

        lcd.begin(16, 4, Font::Dots5x8);
        log.clear();
        lcd.set_cursor(3, 2);
        lcd.set_cursor(1, 3);
        assert_eq!(
            log.bytes().as_slice(),
            &[(0x80 | 0x13, RegisterSelect::Command), (0x80 | 0x51, RegisterSelect::Command)]
        );
    }

    #[test]
    fn test_control_flags_accumulate() {
        use RegisterSelect::Command;

        let log = Log::default();
        let mut lcd = lcd(&log);
        lcd.begin(16, 2, Font::Dots5x8);
        log.clear();

        lcd.cursor();
        lcd.blink();
        lcd.no_display();
        lcd.no_cursor();
        lcd.display();
        lcd.no_blink();

        assert_eq!(
            log.bytes().as_slice(),
            &[
                (0x0E, Command),
                (0x0F, Command),
                (0x0B, Command),
                (0x09, Command),
                (0x0D, Command),
                (0x0C, Command),
            ]
        );
    }

    #[test]
    fn test_entry_mode_and_shifts() {
        use RegisterSelect::Command;

        let log = Log::default();
        let mut lcd = lcd(&log);
        lcd.begin(16, 2, Font::Dots5x8);
        log.clear();

        lcd.autoscroll();
        lcd.right_to_left();
        lcd.no_autoscroll();
        lcd.left_to_right();
        lcd.scroll_display_left();
        lcd.scroll_display_right();
        lcd.move_cursor_left();
        lcd.move_cursor_right();

        assert_eq!(
            log.bytes().as_slice(),
            &[
                (0x07, Command),
                (0x05, Command),
                (0x04, Command),
                (0x06, Command),
                (0x18, Command),
                (0x1C, Command),
                (0x10, Command),
                (0x14, Command),
            ]
        );
    }

    #[test]
    fn test_home_waits_for_execution() {
        let log = Log::default();
        let mut lcd = lcd(&log);

        lcd.home();
        assert_eq!(
            log.ops().as_slice(),
            &[
                Op::Nibble(0x0, RegisterSelect::Command),
                Op::Nibble(0x2, RegisterSelect::Command),
                Op::WaitUs(EXEC_US),
                Op::WaitUs(HOME_CLEAR_EXEC_US),
            ]
        );
    }

    #[test]
    fn test_write_sends_data() {
        let log = Log::default();
        let mut lcd = lcd(&log);

        lcd.write(b'H');
        assert_eq!(
            log.ops().as_slice(),
            &[
                Op::Nibble(0x4, RegisterSelect::Data),
                Op::Nibble(0x8, RegisterSelect::Data),
                Op::WaitUs(EXEC_US),
            ]
        );
    }

    #[test]
    fn test_on_off() {
        let log = Log::default();
        let mut lcd = lcd(&log);
        lcd.begin(16, 2, Font::Dots5x8);
        log.clear();

        lcd.off();
        lcd.on();

        let ops = log.ops();
        assert_eq!(ops[0], Op::Backlight(false));
        assert_eq!(ops.last(), Some(&Op::Backlight(true)));
        assert_eq!(
            log.bytes().as_slice(),
            &[(0x08, RegisterSelect::Command), (0x0C, RegisterSelect::Command)]
        );
    }

    #[test]
    fn test_begin_over_shift_register() {
        let board = SimBoard::new();
        let pins = ShiftRegisterPins {
            data: 0,
            clock: 1,
            strobe: 2,
        };
        let bus = ShiftRegisterBus::new(
            PinResolver::new(DirectRegister::new(&board)),
            pins,
            FrameLayout::STANDARD,
        );
        board.clear_trace();

        let mut lcd = Hd44780::new(bus, &board);
        lcd.begin(16, 2, Font::Dots5x8);

        let frames = board.latched_bytes(pins.data, pins.clock, pins.strobe);
        // Wake-up nibbles: EN high then low, no backlight yet
        assert_eq!(&frames[..8], &[0x38, 0x30, 0x38, 0x30, 0x38, 0x30, 0x28, 0x20]);
        // Then the function set byte 0x28
        assert_eq!(&frames[8..12], &[0x28, 0x20, 0x88, 0x80]);
        // Backlight comes on last
        assert_eq!(frames.last(), Some(&0x02));
        // 4 wake-up nibbles, 4 commands of 2 nibbles, 2 frames each, + backlight
        assert_eq!(frames.len(), 4 * 2 + 4 * 2 * 2 + 1);
        assert!(board.now_ns() >= 104_500_000);
    }
}
