//! LED field values carried by the lighting commands.
//!
//! Each type has a fixed-width lowercase hex encoding matching its slot in the
//! command body: color 6 digits, rate 4 digits, brightness 2 digits, toggle 2 digits.

use serde::Serialize;
use std::fmt;

/// RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Six lowercase hex digits, `rrggbb`.
    pub fn hex(&self) -> String {
        format!("{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.hex())
    }
}

/// Effect period in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Rate(u16);

impl Rate {
    pub const MIN: u16 = 100;
    pub const MAX: u16 = 60000;
    pub const DEFAULT: u16 = 10000;

    /// Build from milliseconds, rejecting values outside `MIN..=MAX`.
    pub fn from_ms(ms: u16) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&ms).then_some(Self(ms))
    }

    pub fn as_ms(&self) -> u16 {
        self.0
    }

    /// Four lowercase hex digits, big-endian.
    pub fn hex(&self) -> String {
        format!("{:04x}", self.0)
    }
}

impl Default for Rate {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Brightness in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Brightness(u8);

impl Brightness {
    // Lower bound is 1, not 0.
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 100;
    pub const DEFAULT: u8 = 100;

    pub fn from_percent(percent: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX)
            .contains(&percent)
            .then_some(Self(percent))
    }

    pub fn as_percent(&self) -> u8 {
        self.0
    }

    /// Two lowercase hex digits.
    pub fn hex(&self) -> String {
        format!("{:02x}", self.0)
    }
}

impl Default for Brightness {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Startup effect switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Toggle {
    On = 0x01,
    Off = 0x02,
}

impl Toggle {
    /// Look up from the CLI name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "on" => Some(Self::On),
            "off" => Some(Self::Off),
            _ => None,
        }
    }

    /// CLI name, `on` or `off`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn hex(&self) -> String {
        format!("{:02x}", self.code())
    }
}
