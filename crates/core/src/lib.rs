//! gled-core: argument validation, LED command encoding, and USB transport.
//!
//! This crate provides the logic for driving the RGB lighting of Logitech
//! G102 and G203 Prodigy mice with a single HID SET_REPORT control transfer.

pub mod command;
pub mod error;
pub mod led;
pub mod safety;
pub mod transport;

/// Logitech USB Vendor ID.
pub const LOGITECH_VID: u16 = 0x046D;

/// Known Logitech product IDs.
pub mod pids {
    /// G102 and G203 Prodigy gaming mouse.
    pub const G102_G203_PRODIGY: u16 = 0xC084;
}
