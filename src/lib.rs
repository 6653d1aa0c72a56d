//! tty-serial is a small serial port library for POSIX hosts.
//!
//! A port is opened with a baud rate and a parity mode and is configured raw (8 data bits, one
//! stop bit, no flow control, no echo and no line editing). Writes go straight to the device.
//! Reads are timed polls: the port never blocks inside the kernel, and
//! [`TTYPort::read_timeout`] polls the device in fixed steps until the buffer is full, the
//! timeout runs out, or the sender appears to have finished.
//!
//! ```no_run
//! use std::time::Duration;
//! use tty_serial::Parity;
//!
//! let mut port = tty_serial::open("/dev/ttyUSB0", 115_200, Parity::None)?;
//! port.write_text("*IDN?\r")?;
//! let answer = port.read_bytes(50, Duration::from_millis(200));
//! println!("{}", String::from_utf8_lossy(&answer));
//! # Ok::<(), tty_serial::Error>(())
//! ```

#![deny(
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    unused
)]
// Document feature-gated elements on docs.rs. See
// https://doc.rust-lang.org/rustdoc/unstable-features.html?highlight=doc(cfg#doc_cfg-recording-what-platforms-or-features-are-required-for-code-to-be-documented
// and
// https://doc.rust-lang.org/rustdoc/unstable-features.html#doc_auto_cfg-automatically-generate-doccfg
// for details.
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::time::Duration;

mod baud;
pub use crate::baud::{BaudRate, BaudRequest, SUPPORTED_BAUD_RATES};

mod poll;
pub use crate::poll::PollPolicy;

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        mod posix;
        pub use posix::{Speed, TTYPort};

        pub mod ffi;
    } else {
        compile_error!("tty-serial only supports POSIX hosts");
    }
}

/// A type for results generated by interacting with serial ports
///
/// The `Err` type is hard-wired to [`tty_serial::Error`](struct.Error.html).
pub type Result<T> = std::result::Result<T, Error>;

/// The step in which attributes were being transferred when configuring a port failed
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The current terminal attributes could not be queried
    ReadAttributesFailed,
    /// The new terminal attributes could not be committed
    WriteAttributesFailed,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ReadAttributesFailed => write!(f, "reading terminal attributes failed"),
            ConfigError::WriteAttributesFailed => write!(f, "writing terminal attributes failed"),
        }
    }
}

/// Categories of errors that can occur when interacting with serial ports
///
/// This list is intended to grow over time and it is not recommended to
/// exhaustively match against it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The device could not be opened. It may be missing, busy, or the caller may lack the
    /// permissions for it.
    DeviceUnavailable,

    /// The device was opened but could not be configured. The descriptor has already been
    /// released when this error is reported from an open.
    Configuration(ConfigError),

    /// A parameter was incorrect.
    InvalidInput,

    /// An I/O error occurred.
    ///
    /// The type of I/O error is determined by the inner `io::ErrorKind`.
    Io(io::ErrorKind),
}

/// An error type for serial port operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// The kind of error this is
    pub kind: ErrorKind,
    /// A description of the error suitable for end-users
    pub description: String,
}

impl Error {
    /// Instantiates a new error
    pub fn new<T: Into<String>>(kind: ErrorKind, description: T) -> Self {
        Error {
            kind,
            description: description.into(),
        }
    }

    /// Returns the corresponding `ErrorKind` for this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> std::result::Result<(), fmt::Error> {
        fmt.write_str(&self.description)
    }
}

impl StdError for Error {
    fn description(&self) -> &str {
        &self.description
    }
}

impl From<io::Error> for Error {
    fn from(io_error: io::Error) -> Error {
        Error::new(ErrorKind::Io(io_error.kind()), format!("{}", io_error))
    }
}

impl From<Error> for io::Error {
    fn from(error: Error) -> io::Error {
        let kind = match error.kind {
            ErrorKind::DeviceUnavailable => io::ErrorKind::NotFound,
            ErrorKind::Configuration(_) => io::ErrorKind::Other,
            ErrorKind::InvalidInput => io::ErrorKind::InvalidInput,
            ErrorKind::Io(kind) => kind,
        };
        io::Error::new(kind, error.description)
    }
}

/// Parity checking modes
///
/// When parity checking is enabled (`Odd` or `Even`) an extra bit is transmitted with
/// each character. The value of the parity bit is arranged so that the number of 1 bits in the
/// character (including the parity bit) is an even number (`Even`) or an odd number
/// (`Odd`).
///
/// Parity checking is disabled by setting `None`, in which case parity bits are not
/// transmitted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Parity {
    /// No parity bit.
    None,

    /// Parity bit sets odd number of 1 bits.
    Odd,

    /// Parity bit sets even number of 1 bits.
    Even,
}

impl Parity {
    /// Decodes the numeric parity mode used at the C boundary.
    ///
    /// `1` selects odd and `2` even parity. Every other value, `0` included, disables parity.
    pub fn from_mode(mode: u32) -> Parity {
        match mode {
            1 => Parity::Odd,
            2 => Parity::Even,
            _ => Parity::None,
        }
    }

    /// The numeric parity mode used at the C boundary.
    pub fn mode(self) -> u32 {
        match self {
            Parity::None => 0,
            Parity::Odd => 1,
            Parity::Even => 2,
        }
    }
}

impl Default for Parity {
    fn default() -> Self {
        Parity::None
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Parity::None => write!(f, "None"),
            Parity::Odd => write!(f, "Odd"),
            Parity::Even => write!(f, "Even"),
        }
    }
}

/// A struct containing all serial port settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialPortBuilder {
    /// The port name, usually the device path
    path: String,
    /// The baud rate, already resolved to a supported one
    baud_rate: BaudRate,
    /// Parity bit mode (none, odd, even)
    parity: Parity,
    /// How timed reads poll the device
    poll_policy: PollPolicy,
}

impl SerialPortBuilder {
    /// Set the path to the serial port
    #[must_use]
    pub fn path<'a>(mut self, path: impl Into<std::borrow::Cow<'a, str>>) -> Self {
        self.path = path.into().into_owned();
        self
    }

    /// Set the baud rate
    ///
    /// Unsupported rates fall back to 115200 baud, see [`BaudRate::resolve`].
    #[must_use]
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = BaudRate::resolve(baud_rate);
        self
    }

    /// Set the baud rate from a request given either as number or as text
    #[must_use]
    pub fn baud_request(mut self, request: BaudRequest<'_>) -> Self {
        self.baud_rate = BaudRate::resolve_request(request);
        self
    }

    /// Set the parity mode
    #[must_use]
    pub fn parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    /// Set the step and the early termination limit used by timed reads
    #[must_use]
    pub fn poll_policy(mut self, poll_policy: PollPolicy) -> Self {
        self.poll_policy = poll_policy;
        self
    }

    /// Open a platform-specific interface to the port with the specified settings
    pub fn open(&self) -> Result<TTYPort> {
        TTYPort::open(self)
    }
}

/// Construct a builder of `TTYPort` objects
///
/// `TTYPort` objects are built using the Builder pattern through the `new` function. The
/// resultant `SerialPortBuilder` object can be cloned, reconfigured, and saved making working with
/// multiple serial ports a little easier. Unsupported baud rates fall back to 115200.
///
/// To open a new serial port:
/// ```no_run
/// tty_serial::new("/dev/ttyUSB0", 9600).open().expect("Failed to open port");
/// ```
pub fn new<'a>(path: impl Into<std::borrow::Cow<'a, str>>, baud_rate: u32) -> SerialPortBuilder {
    SerialPortBuilder {
        path: path.into().into_owned(),
        baud_rate: BaudRate::resolve(baud_rate),
        parity: Parity::None,
        poll_policy: PollPolicy::default(),
    }
}

/// Open and configure the device at `path`
///
/// Shorthand for `new(path, baud_rate).parity(parity).open()`.
pub fn open<'a>(
    path: impl Into<std::borrow::Cow<'a, str>>,
    baud_rate: u32,
    parity: Parity,
) -> Result<TTYPort> {
    new(path, baud_rate).parity(parity).open()
}

/// Default timeout used by callers which do not have a device specific one
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(200);
