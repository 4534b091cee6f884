//! gled CLI: LED control for Logitech G102 and G203 Prodigy mice.

use std::ffi::OsString;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::{CommandFactory, Parser, Subcommand};
use gled_core::command::LedCommand;
use gled_core::error::Error as CoreError;
use gled_core::safety;
use gled_core::transport::{send_command, ControlRequest, UsbTransport};
use rusb::UsbContext;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// libusb needs an explicit timeout for control transfers.
const CONTROL_TIMEOUT: Duration = Duration::from_secs(1);

struct CliUsbTransport {
    context: rusb::Context,
    handle: Option<rusb::DeviceHandle<rusb::Context>>,
    claimed: Option<u8>,
}

impl CliUsbTransport {
    fn new(debug_level: u8) -> Result<Self> {
        let mut context = rusb::Context::new().context("libusb init")?;
        context.set_log_level(libusb_log_level(debug_level));
        Ok(Self {
            context,
            handle: None,
            claimed: None,
        })
    }

    fn handle(&mut self) -> gled_core::error::Result<&mut rusb::DeviceHandle<rusb::Context>> {
        self.handle
            .as_mut()
            .ok_or_else(|| CoreError::Usb("device is not open".to_string()))
    }
}

impl UsbTransport for CliUsbTransport {
    fn open(&mut self, vid: u16, pid: u16) -> gled_core::error::Result<()> {
        let handle = self
            .context
            .open_device_with_vid_pid(vid, pid)
            .ok_or_else(|| {
                CoreError::DeviceNotFound(format!(
                    "VID=0x{vid:04X} PID=0x{pid:04X} (is the mouse connected? root permissions or a udev rule may be required)"
                ))
            })?;

        // Held from here on so that `close` resets the device even if detach fails.
        let handle = self.handle.insert(handle);
        match handle.set_auto_detach_kernel_driver(true) {
            Ok(()) => Ok(()),
            // No kernel driver to detach on this platform.
            Err(rusb::Error::NotSupported) => {
                debug!("Kernel driver auto-detach not supported");
                Ok(())
            }
            Err(e) => Err(usb_error("set auto detach kernel driver", e)),
        }
    }

    fn claim_interface(&mut self, interface: u8) -> gled_core::error::Result<()> {
        self.handle()?
            .claim_interface(interface)
            .map_err(|e| usb_error("claim interface", e))?;
        self.claimed = Some(interface);
        Ok(())
    }

    fn control_transfer(
        &mut self,
        request: &ControlRequest,
        data: &[u8],
    ) -> gled_core::error::Result<usize> {
        self.handle()?
            .write_control(
                request.request_type,
                request.request,
                request.value,
                request.index,
                data,
                CONTROL_TIMEOUT,
            )
            .map_err(|e| usb_error("control transfer", e))
    }

    fn close(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        if let Some(interface) = self.claimed.take() {
            if let Err(e) = handle.release_interface(interface) {
                warn!(interface, error = %e, "Failed to release interface");
            }
        }

        // Reset so the next command in a sequence is accepted.
        if let Err(e) = handle.reset() {
            warn!(error = %e, "Failed to reset device");
        }
    }
}

impl Drop for CliUsbTransport {
    fn drop(&mut self) {
        self.close();
    }
}

/// Map the `-debug` level onto libusb's log levels.
fn libusb_log_level(level: u8) -> rusb::LogLevel {
    match level {
        0 => rusb::LogLevel::None,
        1 => rusb::LogLevel::Error,
        2 => rusb::LogLevel::Warning,
        _ => rusb::LogLevel::Info,
    }
}

fn usb_error(op: &str, err: rusb::Error) -> CoreError {
    match err {
        rusb::Error::Access => CoreError::PermissionDenied(format!("{op}: {err}")),
        rusb::Error::NoDevice | rusb::Error::NotFound => {
            CoreError::DeviceNotFound(format!("{op}: {err}"))
        }
        rusb::Error::Timeout => CoreError::Timeout(format!("{op}: {err}")),
        _ => CoreError::Usb(format!("{op}: {err}")),
    }
}

#[derive(Parser)]
#[command(
    name = "gled",
    version,
    about = "Logitech G102 and G203 Prodigy mouse LED control"
)]
struct Cli {
    /// Debug level for libusb (0-3).
    #[arg(
        long,
        global = true,
        default_value_t = 0,
        value_name = "0..3",
        value_parser = clap::value_parser!(u8).range(0..=3)
    )]
    debug: u8,

    /// Print the encoded payload instead of sending it.
    #[arg(long, global = true)]
    dry_run: bool,

    /// Print the dry run as JSON.
    #[arg(long, global = true, requires = "dry_run")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solid color mode.
    Solid {
        /// Color as RRGGBB or RGB hex, with or without a leading '#'.
        color: String,
    },
    /// Cycle through all colors.
    Cycle {
        /// Cycle period in milliseconds, 100-60000 (default: 10000).
        #[arg(allow_negative_numbers = true)]
        rate: Option<String>,
        /// Brightness percentage, 1-100 (default: 100).
        #[arg(allow_negative_numbers = true)]
        brightness: Option<String>,
    },
    /// Single color breathing.
    Breathe {
        /// Color as RRGGBB or RGB hex, with or without a leading '#'.
        color: String,
        /// Breathing period in milliseconds, 100-60000 (default: 10000).
        #[arg(allow_negative_numbers = true)]
        rate: Option<String>,
        /// Brightness percentage, 1-100 (default: 100).
        #[arg(allow_negative_numbers = true)]
        brightness: Option<String>,
    },
    /// Enable or disable the startup effect.
    Intro {
        /// on|off
        toggle: String,
    },
}

impl Commands {
    /// Validate the raw arguments into a device command.
    fn to_led_command(&self) -> gled_core::error::Result<LedCommand> {
        let command = match self {
            Self::Solid { color } => LedCommand::Solid {
                color: safety::validate_color(color)?,
            },
            Self::Cycle { rate, brightness } => LedCommand::Cycle {
                rate: safety::validate_rate(rate.as_deref().unwrap_or_default())?,
                brightness: safety::validate_brightness(
                    brightness.as_deref().unwrap_or_default(),
                )?,
            },
            Self::Breathe {
                color,
                rate,
                brightness,
            } => LedCommand::Breathe {
                color: safety::validate_color(color)?,
                rate: safety::validate_rate(rate.as_deref().unwrap_or_default())?,
                brightness: safety::validate_brightness(
                    brightness.as_deref().unwrap_or_default(),
                )?,
            },
            Self::Intro { toggle } => LedCommand::Intro {
                toggle: safety::validate_toggle(toggle)?,
            },
        };
        Ok(command)
    }
}

/// Accept the single-dash `-debug` spelling alongside `--debug`.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some("-debug") => OsString::from("--debug"),
            Some(s) if s.starts_with("-debug=") => OsString::from(format!("-{s}")),
            _ => arg,
        })
        .collect()
}

fn init_tracing(debug_level: u8) {
    let default_directive = if debug_level > 0 { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    execute(cli, || CliUsbTransport::new(cli.debug))
}

/// Validate, then either print the payload or hand it to the transport.
///
/// `connect` is only called once the command is fully validated.
fn execute<T, F>(cli: &Cli, connect: F) -> Result<()>
where
    T: UsbTransport,
    F: FnOnce() -> Result<T>,
{
    let command = cli.command.to_led_command()?;

    if cli.dry_run {
        let summary = command.summary();
        if cli.json {
            println!("{}", summary.to_json()?);
        } else {
            println!("{}", summary.payload);
        }
        return Ok(());
    }

    let mut transport = connect()?;
    let transferred = send_command(&mut transport, &command)
        .with_context(|| format!("failed to apply {} mode", command.mode_name()))?;
    println!("{command} applied ({transferred} bytes transferred)");

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    init_tracing(cli.debug);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let usage_error = err
                .downcast_ref::<CoreError>()
                .is_some_and(|e| e.is_usage_error());
            if usage_error {
                eprintln!("{}", Cli::command().render_help());
            }
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gled_core::transport::mock::{Call, FailAt, MockTransport};

    fn parse(args: &[&str]) -> clap::error::Result<Cli> {
        Cli::try_parse_from(normalize_args(args.iter().map(OsString::from)))
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn single_dash_debug_is_accepted() {
        let cli = parse(&["gled", "-debug", "2", "solid", "fff"]).unwrap();
        assert_eq!(cli.debug, 2);

        let cli = parse(&["gled", "-debug=3", "intro", "on"]).unwrap();
        assert_eq!(cli.debug, 3);

        let cli = parse(&["gled", "--debug", "1", "cycle"]).unwrap();
        assert_eq!(cli.debug, 1);
    }

    #[test]
    fn debug_level_above_three_is_rejected() {
        assert!(parse(&["gled", "-debug", "4", "solid", "fff"]).is_err());
    }

    #[test]
    fn normalize_leaves_other_args_alone() {
        let args = normalize_args(["gled", "breathe", "#f00", "-debugx"].map(OsString::from));
        assert_eq!(args, ["gled", "breathe", "#f00", "-debugx"].map(OsString::from));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(parse(&["gled", "rainbow"]).is_err());
        assert!(parse(&["gled"]).is_err());
    }

    #[test]
    fn cycle_without_args_uses_defaults() {
        let cli = parse(&["gled", "cycle"]).unwrap();
        let cmd = cli.command.to_led_command().unwrap();
        assert_eq!(cmd.body_hex(), "3b00020000000000271064");
    }

    #[test]
    fn breathe_with_all_args() {
        let cli = parse(&["gled", "breathe", "f00", "100", "50"]).unwrap();
        let cmd = cli.command.to_led_command().unwrap();
        assert_eq!(cmd.body_hex(), "3b0003ff00000064003200");
    }

    #[test]
    fn negative_rate_is_out_of_range() {
        let cli = parse(&["gled", "cycle", "-5"]).unwrap();
        let err = cli.command.to_led_command().unwrap_err();
        assert!(matches!(err, CoreError::OutOfRange { field: "rate", .. }));
    }

    #[test]
    fn invalid_toggle_is_usage_error() {
        let cli = parse(&["gled", "intro", "maybe"]).unwrap();
        let err = cli.command.to_led_command().unwrap_err();
        assert!(err.is_usage_error());
    }

    #[test]
    fn json_requires_dry_run() {
        assert!(parse(&["gled", "--json", "solid", "fff"]).is_err());
        let cli = parse(&["gled", "--dry-run", "--json", "solid", "fff"]).unwrap();
        assert!(cli.dry_run && cli.json);
    }

    #[test]
    fn invalid_toggle_never_reaches_transport() {
        let cli = parse(&["gled", "intro", "maybe"]).unwrap();
        let mut mock = MockTransport::new();
        let mut connected = false;
        let (transport, flag) = (&mut mock, &mut connected);

        let err = execute(&cli, move || {
            *flag = true;
            Ok(transport)
        })
        .unwrap_err();

        assert!(err
            .downcast_ref::<CoreError>()
            .is_some_and(|e| matches!(e, CoreError::InvalidToggle(_))));
        assert!(!connected);
        assert!(mock.calls.is_empty());
    }

    #[test]
    fn out_of_range_brightness_never_reaches_transport() {
        let cli = parse(&["gled", "breathe", "f00", "100", "0"]).unwrap();
        let mut mock = MockTransport::new();

        assert!(execute(&cli, connect_to(&mut mock)).is_err());
        assert!(mock.calls.is_empty());
    }

    #[test]
    fn valid_command_is_sent_once() {
        let cli = parse(&["gled", "solid", "ff0000"]).unwrap();
        let mut mock = MockTransport::new();

        execute(&cli, connect_to(&mut mock)).unwrap();

        assert_eq!(
            mock.transfers(),
            [hex_bytes("11ff0e3b0001ff00000000000000000000000000").as_slice()]
        );
        assert_eq!(mock.calls.last(), Some(&Call::Close));
    }

    #[test]
    fn device_error_is_not_usage_error() {
        let cli = parse(&["gled", "intro", "on"]).unwrap();
        let mut mock = MockTransport::failing_at(FailAt::Open);

        let err = execute(&cli, connect_to(&mut mock)).unwrap_err();

        assert!(err
            .downcast_ref::<CoreError>()
            .is_some_and(|e| !e.is_usage_error()));
        assert_eq!(mock.calls.last(), Some(&Call::Close));
    }

    #[test]
    fn dry_run_never_opens_usb() {
        let cli = parse(&["gled", "--dry-run", "intro", "off"]).unwrap();
        let mut mock = MockTransport::new();

        execute(&cli, connect_to(&mut mock)).unwrap();

        assert!(mock.calls.is_empty());
    }

    #[test]
    fn validation_error_surfaces_through_anyhow() {
        let cli = parse(&["gled", "--dry-run", "solid", "12345"]).unwrap();
        let err = run(&cli).unwrap_err();
        assert!(err
            .downcast_ref::<CoreError>()
            .is_some_and(|e| e.is_usage_error()));
    }

    fn connect_to<'a>(mock: &'a mut MockTransport) -> impl FnOnce() -> Result<&'a mut MockTransport> + 'a {
        move || Ok(mock)
    }

    fn hex_bytes(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }
}
