//! USB transport abstraction for device communication.
//!
//! Provides a trait-based transport layer so that the libusb-backed device and
//! mock devices share the same interface.

use crate::command::LedCommand;
use crate::error::Result;
use crate::{pids, LOGITECH_VID};
use tracing::{debug, info, warn};

/// Interface claimed before the transfer (#0, alt #0 of the active config).
pub const DEFAULT_INTERFACE: u8 = 0;

/// Setup packet fields of a control transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRequest {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub index: u16,
}

/// HID SET_REPORT: class request to interface, host-to-device,
/// output report (type 2) with report ID 0x11, interface 1.
pub const SET_REPORT: ControlRequest = ControlRequest {
    request_type: 0x21,
    request: 0x09,
    value: 0x0211,
    index: 0x0001,
};

/// Abstraction over the USB host library.
///
/// Implementations hold at most one open device. `close` must release the
/// interface (if claimed), reset the device and drop the handle, and must be
/// safe to call in any state.
pub trait UsbTransport {
    /// Open the device matching the vendor/product pair and enable kernel
    /// driver auto-detach. On error the device may remain open until `close`.
    fn open(&mut self, vid: u16, pid: u16) -> Result<()>;

    /// Claim an interface on the open device.
    fn claim_interface(&mut self, interface: u8) -> Result<()>;

    /// Issue a host-to-device control transfer; returns bytes transferred.
    fn control_transfer(&mut self, request: &ControlRequest, data: &[u8]) -> Result<usize>;

    /// Release the interface, reset and close the device.
    fn close(&mut self);
}

/// Encode a command and deliver it to the mouse in a single control transfer.
///
/// Encoding happens before the device is opened, so a bad command never
/// touches the bus. Once `open` has been attempted the transport is closed on
/// every path, since a failed open may still hold a handle.
pub fn send_command(transport: &mut dyn UsbTransport, command: &LedCommand) -> Result<usize> {
    let payload = command.encode()?;
    info!(
        %command,
        payload = %hex::encode(&payload),
        "Sending command"
    );

    let result = open_and_transfer(transport, &payload);
    transport.close();
    debug!("Device released");

    let transferred = result?;
    if transferred < payload.len() {
        warn!(
            transferred,
            expected = payload.len(),
            "Short control transfer"
        );
    }
    info!(bytes = transferred, "Bytes transferred to device");
    Ok(transferred)
}

fn open_and_transfer(transport: &mut dyn UsbTransport, payload: &[u8]) -> Result<usize> {
    transport.open(LOGITECH_VID, pids::G102_G203_PRODIGY)?;
    debug!(
        vid = format_args!("0x{:04X}", LOGITECH_VID),
        pid = format_args!("0x{:04X}", pids::G102_G203_PRODIGY),
        "Device opened"
    );

    transport.claim_interface(DEFAULT_INTERFACE)?;
    transport.control_transfer(&SET_REPORT, payload)
}

impl<T: UsbTransport + ?Sized> UsbTransport for &mut T {
    fn open(&mut self, vid: u16, pid: u16) -> Result<()> {
        (**self).open(vid, pid)
    }

    fn claim_interface(&mut self, interface: u8) -> Result<()> {
        (**self).claim_interface(interface)
    }

    fn control_transfer(&mut self, request: &ControlRequest, data: &[u8]) -> Result<usize> {
        (**self).control_transfer(request, data)
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// A mock USB transport for testing.
///
/// Records every call and can be primed to fail at any step.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use crate::error::Error;

    /// A recorded transport call.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Open { vid: u16, pid: u16 },
        Claim(u8),
        Control {
            request: ControlRequest,
            data: Vec<u8>,
        },
        Close,
    }

    /// Step at which the mock reports an error.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum FailAt {
        Open,
        Claim,
        Control,
    }

    /// Mock transport that records calls instead of touching hardware.
    #[derive(Default)]
    pub struct MockTransport {
        pub calls: Vec<Call>,
        fail_at: Option<FailAt>,
        short_write: Option<usize>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make the given step return an error.
        pub fn failing_at(step: FailAt) -> Self {
            Self {
                fail_at: Some(step),
                ..Self::default()
            }
        }

        /// Report only `n` bytes written by the control transfer.
        pub fn short_write(n: usize) -> Self {
            Self {
                short_write: Some(n),
                ..Self::default()
            }
        }

        /// Data stages of all control transfers, in order.
        pub fn transfers(&self) -> Vec<&[u8]> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Control { data, .. } => Some(data.as_slice()),
                    _ => None,
                })
                .collect()
        }
    }

    impl UsbTransport for MockTransport {
        fn open(&mut self, vid: u16, pid: u16) -> Result<()> {
            self.calls.push(Call::Open { vid, pid });
            if self.fail_at == Some(FailAt::Open) {
                return Err(Error::DeviceNotFound(format!("{vid:04x}:{pid:04x}")));
            }
            Ok(())
        }

        fn claim_interface(&mut self, interface: u8) -> Result<()> {
            self.calls.push(Call::Claim(interface));
            if self.fail_at == Some(FailAt::Claim) {
                return Err(Error::Usb("mock: resource busy".to_string()));
            }
            Ok(())
        }

        fn control_transfer(&mut self, request: &ControlRequest, data: &[u8]) -> Result<usize> {
            self.calls.push(Call::Control {
                request: *request,
                data: data.to_vec(),
            });
            if self.fail_at == Some(FailAt::Control) {
                return Err(Error::Timeout("mock: control transfer".to_string()));
            }
            Ok(self.short_write.unwrap_or(data.len()))
        }

        fn close(&mut self) {
            self.calls.push(Call::Close);
        }
    }
}
