//! LED command encoding for the G102/G203 Prodigy.
//!
//! Every command is a 20-byte long report (report ID 0x11) sharing one envelope:
//!
//! ```text
//! 11 ff 0e <11-byte body> 00 00 00 00 00 00
//! ```
//!
//! Body layouts (hex, big-endian fields):
//! - solid:   `3b 00 01 RR GG BB 00 00 00 00 00`
//! - cycle:   `3b 00 02 00 00 00 00 00 RATE RATE BB`
//! - breathe: `3b 00 03 RR GG BB RATE RATE 00 BB 00`
//! - intro:   `5b 00 01 TT 00 00 00 00 00 00 00`

use crate::error::{Error, Result};
use crate::led::{Brightness, Rate, Rgb, Toggle};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Envelope header: report ID 0x11, device index 0xff, feature index 0x0e.
const ENVELOPE_HEADER: &str = "11ff0e";
/// Envelope trailer padding the report to its full length.
const ENVELOPE_TRAILER: &str = "000000000000";

/// Encoded payload length in bytes.
pub const PAYLOAD_LEN: usize = 20;

/// A lighting command, one variant per mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum LedCommand {
    /// Fixed color.
    Solid { color: Rgb },
    /// Cycle through all colors.
    Cycle { rate: Rate, brightness: Brightness },
    /// Single color breathing.
    Breathe {
        color: Rgb,
        rate: Rate,
        brightness: Brightness,
    },
    /// Enable or disable the power-on effect.
    Intro { toggle: Toggle },
}

impl LedCommand {
    /// CLI name of the mode.
    pub fn mode_name(&self) -> &'static str {
        match self {
            Self::Solid { .. } => "solid",
            Self::Cycle { .. } => "cycle",
            Self::Breathe { .. } => "breathe",
            Self::Intro { .. } => "intro",
        }
    }

    /// Mode-specific body as 22 hex digits.
    pub fn body_hex(&self) -> String {
        match self {
            Self::Solid { color } => format!("3b0001{}0000000000", color.hex()),
            Self::Cycle { rate, brightness } => {
                format!("3b00020000000000{}{}", rate.hex(), brightness.hex())
            }
            Self::Breathe {
                color,
                rate,
                brightness,
            } => format!(
                "3b0003{}{}00{}00",
                color.hex(),
                rate.hex(),
                brightness.hex()
            ),
            Self::Intro { toggle } => format!("5b0001{}00000000000000", toggle.hex()),
        }
    }

    /// Full report as hex, body wrapped in the envelope.
    pub fn payload_hex(&self) -> String {
        format!("{ENVELOPE_HEADER}{}{ENVELOPE_TRAILER}", self.body_hex())
    }

    /// Encode into the raw report bytes sent over the control pipe.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let payload = self.payload_hex();
        debug!(mode = self.mode_name(), payload = %payload, "Encoding LED command");
        hex::decode(&payload)
            .map_err(|e| Error::Encoding(format!("payload {payload:?} is not valid hex: {e}")))
    }

    /// Summary used for dry runs.
    pub fn summary(&self) -> CommandSummary {
        CommandSummary {
            command: *self,
            body: self.body_hex(),
            payload: self.payload_hex(),
        }
    }
}

impl fmt::Display for LedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Solid { color } => write!(f, "solid {color}"),
            Self::Cycle { rate, brightness } => write!(
                f,
                "cycle {}ms {}%",
                rate.as_ms(),
                brightness.as_percent()
            ),
            Self::Breathe {
                color,
                rate,
                brightness,
            } => write!(
                f,
                "breathe {color} {}ms {}%",
                rate.as_ms(),
                brightness.as_percent()
            ),
            Self::Intro { toggle } => write!(f, "intro {}", toggle.name()),
        }
    }
}

/// Encoded view of a command, printed instead of sending it.
#[derive(Debug, Clone, Serialize)]
pub struct CommandSummary {
    pub command: LedCommand,
    pub body: String,
    pub payload: String,
}

impl CommandSummary {
    /// Render as a JSON object.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Encoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safety::{validate_brightness, validate_color, validate_rate, validate_toggle};

    fn all_modes() -> Vec<LedCommand> {
        vec![
            LedCommand::Solid {
                color: Rgb::new(0x12, 0x34, 0x56),
            },
            LedCommand::Cycle {
                rate: Rate::default(),
                brightness: Brightness::default(),
            },
            LedCommand::Breathe {
                color: Rgb::new(0xff, 0xff, 0xff),
                rate: Rate::from_ms(60000).unwrap(),
                brightness: Brightness::from_percent(1).unwrap(),
            },
            LedCommand::Intro {
                toggle: Toggle::Off,
            },
        ]
    }

    #[test]
    fn solid_red_payload() {
        let cmd = LedCommand::Solid {
            color: validate_color("ff0000").unwrap(),
        };
        assert_eq!(cmd.body_hex(), "3b0001ff00000000000000");
        assert_eq!(
            cmd.payload_hex(),
            "11ff0e3b0001ff00000000000000000000000000"
        );
    }

    #[test]
    fn cycle_defaults_body() {
        let cmd = LedCommand::Cycle {
            rate: validate_rate("").unwrap(),
            brightness: validate_brightness("").unwrap(),
        };
        // 3b0002 | 0000000000 | rate 2710 | brightness 64
        assert_eq!(cmd.body_hex(), "3b00020000000000271064");
    }

    #[test]
    fn breathe_short_color_body() {
        let cmd = LedCommand::Breathe {
            color: validate_color("f00").unwrap(),
            rate: validate_rate("100").unwrap(),
            brightness: validate_brightness("50").unwrap(),
        };
        assert_eq!(cmd.body_hex(), "3b0003ff00000064003200");
    }

    #[test]
    fn intro_on_body() {
        let cmd = LedCommand::Intro {
            toggle: validate_toggle("on").unwrap(),
        };
        assert_eq!(cmd.body_hex(), "5b00010100000000000000");
        assert_eq!(
            cmd.encode().unwrap(),
            vec![
                0x11, 0xff, 0x0e, 0x5b, 0x00, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
                0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            ]
        );
    }

    #[test]
    fn every_mode_encodes_to_full_report() {
        for cmd in all_modes() {
            assert_eq!(cmd.body_hex().len(), 22, "{}", cmd.mode_name());
            let bytes = cmd.encode().unwrap();
            assert_eq!(bytes.len(), PAYLOAD_LEN, "{}", cmd.mode_name());
            assert_eq!(&bytes[..3], &[0x11, 0xff, 0x0e]);
            assert!(bytes[14..].iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn payload_hex_is_lowercase() {
        for cmd in all_modes() {
            let hex = cmd.payload_hex();
            assert!(!hex.chars().any(|c| c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn summary_serializes_mode_and_payload() {
        let cmd = LedCommand::Breathe {
            color: Rgb::new(0xff, 0, 0),
            rate: Rate::from_ms(100).unwrap(),
            brightness: Brightness::from_percent(50).unwrap(),
        };
        let json = cmd.summary().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["command"]["mode"], "breathe");
        assert_eq!(value["command"]["rate"], 100);
        assert_eq!(value["command"]["brightness"], 50);
        assert_eq!(value["command"]["color"]["r"], 255);
        assert_eq!(value["body"], "3b0003ff00000064003200");
        assert_eq!(value["payload"], cmd.payload_hex());
    }

    #[test]
    fn display_shows_decoded_fields() {
        let names: Vec<String> = all_modes().iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            [
                "solid #123456",
                "cycle 10000ms 100%",
                "breathe #ffffff 60000ms 1%",
                "intro off",
            ]
        );
    }

    #[test]
    fn toggle_serializes_lowercase() {
        let json = serde_json::to_string(&LedCommand::Intro { toggle: Toggle::On }).unwrap();
        assert_eq!(json, r#"{"mode":"intro","toggle":"on"}"#);
    }
}
