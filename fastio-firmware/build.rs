//! Build script for fastio-firmware
//!
//! - Sets up linker search paths and arguments for memory.x
//! - Validates board.toml and turns it into constants (`board.rs` in OUT_DIR)

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// RP2040 user GPIOs
const GPIO_COUNT: i64 = 30;

/// LCD enable bit of the expander frame
const ENABLE_BIT: i64 = 0x08;

fn main() {
    setup_linker();
    let board = validate_config();
    generate_constants(&board);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validated board wiring
struct Board {
    shift1: bool,
    cols: i64,
    lines: i64,
    font_5x10: bool,
    shift1_pin: i64,
    data_pin: i64,
    clock_pin: i64,
    strobe_pin: i64,
    calibrate: bool,
    calibration_byte: i64,
}

/// Validate board.toml at compile time
fn validate_config() -> Board {
    println!("cargo:rerun-if-changed=board.toml");

    let config_path = Path::new("board.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: board.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a board.toml wiring file in the           ║\n\
            ║  fastio-firmware directory.                                      ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read board.toml                                ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in board.toml                        ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();

    let transport = get_str(&config, "lcd", "transport", &mut errors);
    let shift1 = match transport.as_deref() {
        Some("shift1") => true,
        Some("shift_register") => false,
        Some(other) => {
            errors.push(format!(
                "[lcd] transport must be \"shift1\" or \"shift_register\", got \"{}\"",
                other
            ));
            true
        }
        None => true,
    };

    let cols = get_int(&config, "lcd", "cols", &mut errors).unwrap_or(16);
    if !(1..=40).contains(&cols) {
        errors.push(format!("[lcd] cols must be 1-40, got {}", cols));
    }
    let lines = get_int(&config, "lcd", "lines", &mut errors).unwrap_or(2);
    if !(1..=4).contains(&lines) {
        errors.push(format!("[lcd] lines must be 1-4, got {}", lines));
    }

    let font_5x10 = match get_str(&config, "lcd", "font", &mut errors).as_deref() {
        Some("5x8") | None => false,
        Some("5x10") => true,
        Some(other) => {
            errors.push(format!("[lcd] font must be \"5x8\" or \"5x10\", got \"{}\"", other));
            false
        }
    };
    if font_5x10 && lines > 1 {
        println!("cargo:warning=board.toml: 5x10 font is ignored on multi-line displays");
    }

    let mut pin = |key: &str| {
        let value = get_int(&config, "pins", key, &mut errors).unwrap_or(0);
        if !(0..GPIO_COUNT).contains(&value) {
            errors.push(format!("[pins] {} must be gpio 0-29, got {}", key, value));
        }
        value
    };
    let shift1_pin = pin("shift1");
    let data_pin = pin("data");
    let clock_pin = pin("clock");
    let strobe_pin = pin("strobe");

    if !shift1 && (data_pin == clock_pin || data_pin == strobe_pin || clock_pin == strobe_pin) {
        errors.push("[pins] data, clock and strobe must be distinct".to_string());
    }

    let calibrate = match config.get("shift1").and_then(|s| s.get("calibrate")) {
        Some(toml::Value::Boolean(b)) => *b,
        Some(_) => {
            errors.push("[shift1] calibrate must be a boolean".to_string());
            false
        }
        None => false,
    };
    let calibration_byte = get_int(&config, "shift1", "calibration_byte", &mut errors).unwrap_or(0);
    if !(0..=0xFF).contains(&calibration_byte) {
        errors.push(format!("[shift1] calibration_byte must be 0-255, got {}", calibration_byte));
    } else if calibration_byte & ENABLE_BIT != 0 {
        errors.push("[shift1] calibration_byte must keep the LCD enable bit (0x08) clear".to_string());
    }

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid board.toml                                       ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=board.toml validated successfully");

    Board {
        shift1,
        cols,
        lines,
        font_5x10,
        shift1_pin,
        data_pin,
        clock_pin,
        strobe_pin,
        calibrate,
        calibration_byte,
    }
}

/// Read a required string field
fn get_str(config: &toml::Value, section: &str, key: &str, errors: &mut Vec<String>) -> Option<String> {
    match config.get(section).and_then(|s| s.get(key)) {
        Some(toml::Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.push(format!("[{}] {} must be a string", section, key));
            None
        }
        None => {
            errors.push(format!("[{}] missing '{}'", section, key));
            None
        }
    }
}

/// Read a required integer field
fn get_int(config: &toml::Value, section: &str, key: &str, errors: &mut Vec<String>) -> Option<i64> {
    match config.get(section).and_then(|s| s.get(key)) {
        Some(toml::Value::Integer(i)) => Some(*i),
        Some(_) => {
            errors.push(format!("[{}] {} must be an integer", section, key));
            None
        }
        None => {
            errors.push(format!("[{}] missing '{}'", section, key));
            None
        }
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write the board constants for `include!`
fn generate_constants(board: &Board) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let mut f = File::create(out_dir.join("board.rs")).unwrap();

    writeln!(f, "// Generated from board.toml by build.rs").unwrap();
    writeln!(f, "pub const TRANSPORT_SHIFT1: bool = {};", board.shift1).unwrap();
    writeln!(f, "pub const LCD_COLS: u8 = {};", board.cols).unwrap();
    writeln!(f, "pub const LCD_LINES: u8 = {};", board.lines).unwrap();
    writeln!(f, "pub const LCD_FONT_5X10: bool = {};", board.font_5x10).unwrap();
    writeln!(f, "pub const SHIFT1_PIN: u8 = {};", board.shift1_pin).unwrap();
    writeln!(f, "pub const DATA_PIN: u8 = {};", board.data_pin).unwrap();
    writeln!(f, "pub const CLOCK_PIN: u8 = {};", board.clock_pin).unwrap();
    writeln!(f, "pub const STROBE_PIN: u8 = {};", board.strobe_pin).unwrap();
    writeln!(f, "pub const CALIBRATE: bool = {};", board.calibrate).unwrap();
    writeln!(f, "pub const CALIBRATION_BYTE: u8 = {:#04x};", board.calibration_byte).unwrap();
}
