//! fastio demo firmware
//!
//! Brings up an HD44780 LCD behind an 8-bit shift register, driven either
//! over a single Shift1 line or over data/clock/strobe, as wired in
//! board.toml. On the Shift1 path the call overhead of the timing loop is
//! measured once and stored in flash.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_time::{Delay, Instant, Timer};
use fastio_core::config::calibration::{Shift1Calibration, CALIBRATION_MAX_SIZE};
use fastio_core::io::{BoardIo, FastIo, PinResolver};
use fastio_core::protocol::{Framing, Shift1};
use fastio_core::{IoMode, Shift1Timing};
use fastio_drivers::lcd::{
    Font, FrameLayout, Hd44780, LcdTransport, Shift1Bus, ShiftRegisterBus, ShiftRegisterPins,
};
use fastio_hal::{RecordStorage, StorageKey};
use fastio_hal_rp2040::{CortexInterrupts, PinBank, Rp2040Board, Rp2040FlashStorage};
use {defmt_rtt as _, panic_probe as _};

mod board {
    include!(concat!(env!("OUT_DIR"), "/board.rs"));
}

type Io = BoardIo<Rp2040Board>;

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("fastio firmware starting ({})", IoMode::selected());

    let p = embassy_rp::init(Default::default());
    let (bank, rest) = PinBank::from_peripherals(p);
    let mut storage = Rp2040FlashStorage::new(rest.flash, rest.dma_ch0);
    let resolver = PinResolver::new(Io::new(Rp2040Board::new(bank)));
    info!("Peripherals initialized");

    let font = if board::LCD_FONT_5X10 {
        Font::Dots5x10
    } else {
        Font::Dots5x8
    };

    if board::TRANSPORT_SHIFT1 {
        let mut resolver = resolver;
        let timing = shift1_timing(&mut resolver, &mut storage).await;
        let shift1 = Shift1::with_timing(Delay, CortexInterrupts, timing);
        let bus = Shift1Bus::new(resolver, board::SHIFT1_PIN, shift1, FrameLayout::STANDARD);
        info!("LCD on Shift1 line gpio{}", board::SHIFT1_PIN);
        run(Hd44780::new(bus, Delay), font).await;
    } else {
        let pins = ShiftRegisterPins {
            data: board::DATA_PIN,
            clock: board::CLOCK_PIN,
            strobe: board::STROBE_PIN,
        };
        let bus = ShiftRegisterBus::new(resolver, pins, FrameLayout::STANDARD);
        info!(
            "LCD on shift register data=gpio{} clock=gpio{} strobe=gpio{}",
            pins.data, pins.clock, pins.strobe
        );
        run(Hd44780::new(bus, Delay), font).await;
    }
}

/// Initialize the display and blink the cursor forever
async fn run<T: LcdTransport>(mut lcd: Hd44780<T, Delay>, font: Font) {
    lcd.begin(board::LCD_COLS, board::LCD_LINES, font);
    lcd.set_cursor(0, 0);
    lcd.cursor();
    info!("LCD ready ({}x{})", board::LCD_COLS, board::LCD_LINES);

    let mut on = true;
    loop {
        Timer::after_millis(500).await;
        on = !on;
        if on {
            lcd.blink();
        } else {
            lcd.no_blink();
        }
    }
}

/// Stored calibration, a fresh measurement, or the default table
async fn shift1_timing(
    resolver: &mut PinResolver<Io>,
    storage: &mut Rp2040FlashStorage<'_>,
) -> Shift1Timing {
    let mut buf = [0u8; CALIBRATION_MAX_SIZE];

    match storage.read(StorageKey::Shift1Calibration, &mut buf).await {
        Ok(len) => match Shift1Calibration::decode(&buf[..len]) {
            Ok(cal) => {
                info!("Shift1 calibration loaded: {}us per hold", cal.overhead_us);
                return cal.timing;
            }
            Err(e) => warn!("Stored Shift1 calibration rejected: {}", e),
        },
        Err(e) => debug!("No stored Shift1 calibration: {}", e),
    }

    if !board::CALIBRATE {
        return Shift1Timing::default();
    }

    let overhead_us = measure_overhead(resolver);
    let cal = Shift1Calibration::from_overhead(overhead_us);
    if let Err(e) = cal.timing.validate() {
        warn!("Measured overhead {}us unusable ({}), using defaults", overhead_us, e);
        return Shift1Timing::default();
    }

    match cal.encode(&mut buf) {
        Ok(bytes) => match storage.write(StorageKey::Shift1Calibration, bytes).await {
            Ok(()) => info!("Shift1 calibration stored: {}us per hold", overhead_us),
            Err(e) => warn!("Failed to store Shift1 calibration: {}", e),
        },
        Err(e) => warn!("Failed to encode Shift1 calibration: {}", e),
    }

    cal.timing
}

/// Time one nominal frame on the Shift1 line and derive the per-hold overhead
fn measure_overhead<B: FastIo>(resolver: &mut PinResolver<B>) -> u32 {
    let mut shift1 = Shift1::with_timing(Delay, CortexInterrupts, Shift1Timing::NOMINAL);
    let line = shift1.init_pin(resolver, board::SHIFT1_PIN);

    let start = Instant::now();
    shift1.send(resolver.io(), &line, board::CALIBRATION_BYTE);
    let measured_us = start.elapsed().as_micros() as u32;

    let overhead_us =
        Shift1Timing::overhead_from_frame(measured_us, board::CALIBRATION_BYTE, Framing::Latch);
    debug!("Shift1 frame took {}us, {}us per hold", measured_us, overhead_us);
    overhead_us
}
