//! Error types for gled-core.

use thiserror::Error;

/// Core library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A required argument was empty or absent.
    #[error("no {0} argument found")]
    MissingArgument(&'static str),

    /// Color string is not a 3- or 6-digit hex value.
    #[error("invalid color {value:?}: {reason}")]
    InvalidColor { value: String, reason: &'static str },

    /// Numeric argument could not be parsed as a base-10 integer.
    #[error("invalid {field} {value:?}: not a base-10 integer")]
    InvalidNumber { field: &'static str, value: String },

    /// Value out of the range accepted by the device.
    #[error("{field} {value} is out of range (allowed {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Toggle was neither "on" nor "off".
    #[error("invalid toggle {0:?}: expected \"on\" or \"off\"")]
    InvalidToggle(String),

    /// Payload could not be converted to bytes.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// USB communication failure.
    #[error("USB error: {0}")]
    Usb(String),

    /// Device not present on the bus.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// Permission denied opening or claiming the device.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Control transfer timed out.
    #[error("timeout: {0}")]
    Timeout(String),
}

impl Error {
    /// Whether this error came from user input rather than the device.
    ///
    /// Usage errors are reported together with the usage text.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::MissingArgument(_)
                | Self::InvalidColor { .. }
                | Self::InvalidNumber { .. }
                | Self::OutOfRange { .. }
                | Self::InvalidToggle(_)
        )
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
