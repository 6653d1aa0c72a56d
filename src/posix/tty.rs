use std::io;
use std::mem;
use std::os::unix::prelude::*;
use std::path::Path;
use std::time::Duration;

use nix::fcntl::OFlag;
use nix::poll::{PollFd, PollFlags};
use nix::sys::stat::Mode;
use nix::unistd;
use scopeguard::ScopeGuard;

use super::error::unavailable;
use super::termios;
use crate::poll::read_polled;
use crate::{BaudRate, Parity, PollPolicy, Result, SerialPortBuilder};

/// Closes `fd` unless the guard is defused with `ScopeGuard::into_inner`.
fn close_on_failure(fd: RawFd) -> ScopeGuard<RawFd, impl FnOnce(RawFd)> {
    scopeguard::guard(fd, |fd| {
        log::warn!("releasing fd {} after failed setup", fd);
        let _ = unistd::close(fd);
    })
}

/// Read side of a timed read: hands out only what the device has pending, whatever VMIN says.
struct Pending(RawFd);

impl io::Read for Pending {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut fds = [PollFd::new(self.0, PollFlags::POLLIN)];
        nix::poll::poll(&mut fds, 0).map_err(io::Error::from)?;
        match fds[0].revents() {
            Some(events) if events.contains(PollFlags::POLLIN) => {
                unistd::read(self.0, buf).map_err(io::Error::from)
            }
            _ => Err(io::ErrorKind::WouldBlock.into()),
        }
    }
}

/// A serial port implementation for POSIX TTY ports
///
/// The port is closed when the value is dropped. Use [`TTYPort::close`] to learn about errors
/// when closing.
#[derive(Debug)]
pub struct TTYPort {
    fd: RawFd,
    name: Option<String>,
    poll_policy: PollPolicy,
}

impl TTYPort {
    /// Opens a TTY device as a serial port.
    ///
    /// `path` should be the path to a TTY device, e.g., `/dev/ttyS0`.
    ///
    /// The device is opened for reading and writing, without becoming the controlling terminal of
    /// this process, and with synchronous writes. It is then configured raw at the requested
    /// baud rate and parity, and reads are set to return immediately.
    ///
    /// ## Errors
    ///
    /// * `DeviceUnavailable` if the device could not be opened.
    /// * `Configuration` if the device is not a terminal or rejects the settings. The device
    ///   has been closed again in this case.
    pub fn open(builder: &SerialPortBuilder) -> Result<TTYPort> {
        Self::open_with(builder, |fd| {
            termios::configure(fd, builder.baud_rate, builder.parity)?;
            termios::set_blocking(fd, false)
        })
    }

    /// Opens the device at `builder.path` and hands the descriptor to `setup`. The descriptor
    /// is closed again if `setup` fails.
    fn open_with<F>(builder: &SerialPortBuilder, setup: F) -> Result<TTYPort>
    where
        F: FnOnce(RawFd) -> Result<()>,
    {
        let path = Path::new(&builder.path);
        let flags = OFlag::O_RDWR | OFlag::O_NOCTTY | OFlag::O_SYNC;
        let fd = nix::fcntl::open(path, flags, Mode::empty())
            .map_err(|e| unavailable(&builder.path, e))?;
        let fd = close_on_failure(fd);

        setup(*fd)?;

        let fd = ScopeGuard::into_inner(fd);
        log::debug!("opened {} as fd {}", builder.path, fd);

        Ok(TTYPort {
            fd,
            name: Some(builder.path.clone()),
            poll_policy: builder.poll_policy,
        })
    }

    /// Create a pair of pseudo serial terminals
    ///
    /// ## Returns
    /// Two connected `TTYPort` objects: `(master, slave)`
    ///
    /// ## Errors
    /// Attempting any IO or parameter settings on the slave tty after the master
    /// tty is closed will return errors.
    ///
    /// On some platforms manipulating the master port will fail and only
    /// modifying the slave port is possible.
    ///
    /// ## Examples
    ///
    /// ```
    /// use tty_serial::TTYPort;
    ///
    /// let (master, slave) = TTYPort::pair().unwrap();
    /// ```
    pub fn pair() -> Result<(Self, Self)> {
        // Open the next free pty.
        let next_pty_fd = nix::pty::posix_openpt(OFlag::O_RDWR | OFlag::O_NOCTTY)?;

        // Grant access to the associated slave pty
        nix::pty::grantpt(&next_pty_fd)?;

        // Unlock the slave pty
        nix::pty::unlockpt(&next_pty_fd)?;

        // Get the path of the attached slave ptty
        #[cfg(not(any(
            target_os = "linux",
            target_os = "android",
            target_os = "emscripten",
            target_os = "fuchsia"
        )))]
        let ptty_name = unsafe { nix::pty::ptsname(&next_pty_fd)? };

        #[cfg(any(
            target_os = "linux",
            target_os = "android",
            target_os = "emscripten",
            target_os = "fuchsia"
        ))]
        let ptty_name = nix::pty::ptsname_r(&next_pty_fd)?;

        let master_fd = close_on_failure(next_pty_fd.into_raw_fd());

        let slave = crate::new(ptty_name, BaudRate::DEFAULT.as_u32()).open()?;

        termios::configure(*master_fd, BaudRate::DEFAULT, Parity::None)?;
        termios::set_blocking(*master_fd, false)?;

        let master = TTYPort {
            fd: ScopeGuard::into_inner(master_fd),
            name: None,
            poll_policy: PollPolicy::default(),
        };

        Ok((master, slave))
    }

    /// Returns the name of this port if it exists.
    ///
    /// This name may not be the canonical device name and instead be shorthand.
    /// Additionally it may not exist for virtual ports.
    pub fn name(&self) -> Option<String> {
        self.name.clone()
    }

    /// Returns the poll policy used by timed reads.
    pub fn poll_policy(&self) -> PollPolicy {
        self.poll_policy
    }

    /// Sets the poll policy used by timed reads.
    pub fn set_poll_policy(&mut self, poll_policy: PollPolicy) {
        self.poll_policy = poll_policy;
    }

    /// Returns the baud rate the device is currently configured for.
    pub fn baud_rate(&self) -> Result<BaudRate> {
        termios::baud_rate_of(&termios::get_termios(self.fd)?)
    }

    /// Returns the parity mode the device is currently configured for.
    pub fn parity(&self) -> Result<Parity> {
        Ok(termios::parity_of(&termios::get_termios(self.fd)?))
    }

    /// Returns whether plain reads wait for at least one byte.
    pub fn is_blocking(&self) -> Result<bool> {
        Ok(termios::is_blocking(&termios::get_termios(self.fd)?))
    }

    /// Lets plain reads wait for at least one byte (`true`) or return immediately (`false`).
    ///
    /// Baud rate, parity and the other attributes stay untouched. Only plain reads through
    /// [`io::Read`] are affected: timed reads check for pending input before each read and keep
    /// their timeout either way.
    pub fn set_blocking(&self, should_block: bool) -> Result<()> {
        termios::set_blocking(self.fd, should_block)
    }

    /// Writes `data` with a single write call.
    ///
    /// Returns the number of bytes the device accepted, which may be less than `data.len()`.
    /// Short writes are not retried.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<usize> {
        Ok(unistd::write(self.fd, data)?)
    }

    /// Writes the bytes of `text`, nothing more.
    pub fn write_text(&mut self, text: &str) -> Result<usize> {
        self.write_bytes(text.as_bytes())
    }

    /// Reads into `buf` for at most `timeout`, returning early once the sender has gone quiet.
    ///
    /// See [`PollPolicy`] for the polling schedule. Returns the number of bytes read. Zero bytes
    /// or a short read mean the timeout ran out; read errors, like a device going away, end up
    /// the same way.
    pub fn read_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> usize {
        read_polled(&mut Pending(self.fd), buf, timeout, &self.poll_policy)
    }

    /// Reads up to `max_bytes` like [`read_timeout`](TTYPort::read_timeout) into a fresh buffer.
    pub fn read_bytes(&mut self, max_bytes: usize, timeout: Duration) -> Vec<u8> {
        let mut buf = vec![0; max_bytes];
        let n = self.read_timeout(&mut buf, timeout);
        buf.truncate(n);
        buf
    }

    /// Closes the port and reports the result.
    pub fn close(self) -> Result<()> {
        let fd = self.into_raw_fd();
        log::debug!("closing fd {}", fd);
        Ok(unistd::close(fd)?)
    }
}

impl Drop for TTYPort {
    fn drop(&mut self) {
        log::debug!("dropping fd {}", self.fd);
        let _ = unistd::close(self.fd);
    }
}

impl AsRawFd for TTYPort {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl IntoRawFd for TTYPort {
    fn into_raw_fd(self) -> RawFd {
        // Pull just the file descriptor out. We also prevent the destructor
        // from being run by wrapping the port into `ManuallyDrop`. If we didn't
        // do this, the port would be closed, which would make `into_raw_fd`
        // unusable.
        let mut port = mem::ManuallyDrop::new(self);
        port.name = None;
        port.fd
    }
}

impl FromRawFd for TTYPort {
    /// Takes ownership of an already opened and configured port.
    ///
    /// ## Safety
    ///
    /// `fd` has to be an open terminal descriptor not owned by anything else.
    unsafe fn from_raw_fd(fd: RawFd) -> Self {
        TTYPort {
            fd,
            name: None,
            poll_policy: PollPolicy::default(),
        }
    }
}

impl io::Read for TTYPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        unistd::read(self.fd, buf).map_err(io::Error::from)
    }
}

impl io::Write for TTYPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        unistd::write(self.fd, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        nix::sys::termios::tcdrain(self.fd).map_err(io::Error::from)
    }
}
