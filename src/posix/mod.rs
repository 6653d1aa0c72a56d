pub use self::termios::Speed;
pub use self::tty::TTYPort;

mod error;
pub(crate) mod termios;
mod tty;
