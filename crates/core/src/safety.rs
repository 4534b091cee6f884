//! Safety layer: validates all command arguments before anything is encoded.
//!
//! No command is built from an argument that failed validation, so nothing
//! out of range ever reaches the device.
//!
//! # Argument Formats
//!
//! ## Color
//! - `RRGGBB` or `RGB`, with or without a leading `#`
//! - Short form duplicates each nibble: `f00` is `ff0000`
//!
//! ## Rate
//! - Effect period in milliseconds, 100 – 60,000
//! - **Default**: 10,000 ms when the argument is empty
//!
//! ## Brightness
//! - Percentage, 1 – 100
//! - **Default**: 100 % when the argument is empty
//!
//! ## Toggle
//! - Exactly `on` or `off`

use crate::error::{Error, Result};
use crate::led::{Brightness, Rate, Rgb, Toggle};

/// Parse a hex color argument.
pub fn validate_color(arg: &str) -> Result<Rgb> {
    if arg.is_empty() {
        return Err(Error::MissingArgument("color"));
    }

    let digits = arg.strip_prefix('#').unwrap_or(arg);
    let invalid = |reason| Error::InvalidColor {
        value: arg.to_string(),
        reason,
    };

    if digits.len() != 6 && digits.len() != 3 {
        return Err(invalid("expected 3 or 6 hex digits"));
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid("not a hex value"));
    }

    let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid("not a hex value"));

    if digits.len() == 6 {
        Ok(Rgb::new(
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        ))
    } else {
        // 0xN * 17 == 0xNN
        Ok(Rgb::new(
            channel(&digits[0..1])? * 17,
            channel(&digits[1..2])? * 17,
            channel(&digits[2..3])? * 17,
        ))
    }
}

/// Parse a rate argument in milliseconds. Empty selects the default.
pub fn validate_rate(arg: &str) -> Result<Rate> {
    if arg.is_empty() {
        return Ok(Rate::default());
    }

    let value = parse_integer("rate", arg)?;
    u16::try_from(value)
        .ok()
        .and_then(Rate::from_ms)
        .ok_or(Error::OutOfRange {
            field: "rate",
            value,
            min: Rate::MIN as i64,
            max: Rate::MAX as i64,
        })
}

/// Parse a brightness percentage. Empty selects the default.
pub fn validate_brightness(arg: &str) -> Result<Brightness> {
    if arg.is_empty() {
        return Ok(Brightness::default());
    }

    let value = parse_integer("brightness", arg)?;
    u8::try_from(value)
        .ok()
        .and_then(Brightness::from_percent)
        .ok_or(Error::OutOfRange {
            field: "brightness",
            value,
            min: Brightness::MIN as i64,
            max: Brightness::MAX as i64,
        })
}

/// Parse the startup effect toggle.
pub fn validate_toggle(arg: &str) -> Result<Toggle> {
    Toggle::from_name(arg).ok_or_else(|| Error::InvalidToggle(arg.to_string()))
}

fn parse_integer(field: &'static str, arg: &str) -> Result<i64> {
    arg.parse::<i64>().map_err(|_| Error::InvalidNumber {
        field,
        value: arg.to_string(),
    })
}
