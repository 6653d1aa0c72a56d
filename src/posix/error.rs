use std::io;

use crate::{ConfigError, Error, ErrorKind};

impl From<nix::Error> for Error {
    fn from(e: nix::Error) -> Error {
        use io::ErrorKind as IO;
        use nix::errno::Errno as E;
        use ErrorKind as K;
        let kind = match e {
            E::ETIMEDOUT => K::Io(IO::TimedOut),
            E::ECONNABORTED => K::Io(IO::ConnectionAborted),
            E::ECONNRESET => K::Io(IO::ConnectionReset),
            E::ECONNREFUSED => K::Io(IO::ConnectionRefused),
            E::ENOTCONN => K::Io(IO::NotConnected),
            E::EADDRINUSE => K::Io(IO::AddrInUse),
            E::EADDRNOTAVAIL => K::Io(IO::AddrNotAvailable),
            E::EAGAIN => K::Io(IO::WouldBlock),
            E::EINTR => K::Io(IO::Interrupted),
            E::EACCES => K::Io(IO::PermissionDenied),
            E::ENOENT => K::Io(IO::NotFound),
            E::EINVAL => K::InvalidInput,
            _ => K::Io(IO::Other),
        };

        Error::new(kind, e.desc())
    }
}

/// Reports the failed attribute transfer together with the underlying cause
pub(super) fn config_error(step: ConfigError, e: nix::Error) -> Error {
    Error::new(
        ErrorKind::Configuration(step),
        format!("{}: {}", step, e.desc()),
    )
}

/// Reports a device node that could not be opened
pub(super) fn unavailable(path: &str, e: nix::Error) -> Error {
    Error::new(
        ErrorKind::DeviceUnavailable,
        format!("cannot open {}: {}", path, e.desc()),
    )
}
