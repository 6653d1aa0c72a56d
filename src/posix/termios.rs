//! Raw mode configuration of terminal attributes.

use std::os::unix::io::RawFd;

use nix::sys::termios::{
    self, ControlFlags, InputFlags, LocalFlags, OutputFlags, SetArg, SpecialCharacterIndices,
    Termios,
};

use super::error::config_error;
use crate::{BaudRate, ConfigError, Error, ErrorKind, Parity, Result, SUPPORTED_BAUD_RATES};

cfg_if::cfg_if! {
    if #[cfg(any(target_os = "linux", target_os = "android"))] {
        /// Platform encoding of a baud rate as understood by `cfsetispeed`/`cfsetospeed`
        pub type Speed = termios::BaudRate;

        impl BaudRate {
            /// The platform encoding of this rate
            pub fn speed(self) -> Speed {
                match self {
                    BaudRate::B19200 => Speed::B19200,
                    BaudRate::B38400 => Speed::B38400,
                    BaudRate::B57600 => Speed::B57600,
                    BaudRate::B115200 => Speed::B115200,
                    BaudRate::B230400 => Speed::B230400,
                    BaudRate::B460800 => Speed::B460800,
                    BaudRate::B500000 => Speed::B500000,
                    BaudRate::B576000 => Speed::B576000,
                    BaudRate::B921600 => Speed::B921600,
                }
            }
        }
    } else {
        /// Platform encoding of a baud rate as understood by `cfsetispeed`/`cfsetospeed`
        ///
        /// BSD derived systems take the rate in bits per second.
        pub type Speed = u32;

        impl BaudRate {
            /// The platform encoding of this rate
            pub fn speed(self) -> Speed {
                self.as_u32()
            }
        }
    }
}

pub(crate) fn get_termios(fd: RawFd) -> Result<Termios> {
    termios::tcgetattr(fd).map_err(|e| config_error(ConfigError::ReadAttributesFailed, e))
}

pub(crate) fn set_termios(fd: RawFd, termios: &Termios) -> Result<()> {
    termios::tcsetattr(fd, SetArg::TCSANOW, termios)
        .map_err(|e| config_error(ConfigError::WriteAttributesFailed, e))
}

/// Control flags selecting `parity`
pub(crate) fn parity_flags(parity: Parity) -> ControlFlags {
    match parity {
        Parity::None => ControlFlags::empty(),
        Parity::Odd => ControlFlags::PARENB | ControlFlags::PARODD,
        Parity::Even => ControlFlags::PARENB,
    }
}

pub(crate) fn parity_of(termios: &Termios) -> Parity {
    let flags = termios.control_flags;
    if !flags.contains(ControlFlags::PARENB) {
        Parity::None
    } else if flags.contains(ControlFlags::PARODD) {
        Parity::Odd
    } else {
        Parity::Even
    }
}

pub(crate) fn baud_rate_of(termios: &Termios) -> Result<BaudRate> {
    let speed = termios::cfgetospeed(termios);
    SUPPORTED_BAUD_RATES
        .iter()
        .copied()
        .find(|baud| baud.speed() == speed)
        .ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidInput,
                "device runs at an unsupported baud rate",
            )
        })
}

pub(crate) fn is_blocking(termios: &Termios) -> bool {
    termios.control_chars[SpecialCharacterIndices::VMIN as usize] > 0
}

/// Puts `termios` into raw mode with 8 data bits, one stop bit, the given speed and parity, no
/// flow control, and reads that return immediately.
pub(crate) fn make_raw(termios: &mut Termios, baud_rate: BaudRate, parity: Parity) -> Result<()> {
    let speed = baud_rate.speed();
    termios::cfsetospeed(termios, speed)
        .map_err(|e| config_error(ConfigError::WriteAttributesFailed, e))?;
    termios::cfsetispeed(termios, speed)
        .map_err(|e| config_error(ConfigError::WriteAttributesFailed, e))?;

    termios.control_flags.remove(ControlFlags::CSIZE);
    termios.control_flags.insert(ControlFlags::CS8);
    // A break would otherwise arrive as NUL byte.
    termios.input_flags.remove(InputFlags::IGNBRK);
    // Line ending translation would alter binary data.
    termios.input_flags.remove(
        InputFlags::ICRNL | InputFlags::INLCR | InputFlags::IGNCR | InputFlags::ISTRIP,
    );
    termios.local_flags = LocalFlags::empty();
    termios.output_flags = OutputFlags::empty();
    termios.control_chars[SpecialCharacterIndices::VMIN as usize] = 0;
    termios.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;

    termios
        .input_flags
        .remove(InputFlags::IXON | InputFlags::IXOFF | InputFlags::IXANY);
    termios
        .control_flags
        .insert(ControlFlags::CLOCAL | ControlFlags::CREAD);
    termios
        .control_flags
        .remove(ControlFlags::PARENB | ControlFlags::PARODD);
    termios.control_flags.insert(parity_flags(parity));
    termios.control_flags.remove(ControlFlags::CSTOPB);
    termios.control_flags.remove(ControlFlags::CRTSCTS);

    Ok(())
}

/// Lets reads wait for at least one byte, or return immediately when `should_block` is false.
/// All other attributes stay as they are.
pub(crate) fn make_blocking(termios: &mut Termios, should_block: bool) {
    termios.control_chars[SpecialCharacterIndices::VMIN as usize] = u8::from(should_block);
    termios.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
}

/// Applies the raw mode configuration to the open terminal `fd`
pub(crate) fn configure(fd: RawFd, baud_rate: BaudRate, parity: Parity) -> Result<()> {
    let mut termios = get_termios(fd)?;
    make_raw(&mut termios, baud_rate, parity)?;
    set_termios(fd, &termios)?;
    log::debug!(
        "configured fd {}: {} baud, parity {}",
        fd,
        baud_rate,
        parity
    );
    Ok(())
}

/// Switches reads on `fd` between waiting for a byte and returning immediately
pub(crate) fn set_blocking(fd: RawFd, should_block: bool) -> Result<()> {
    let mut termios = get_termios(fd)?;
    make_blocking(&mut termios, should_block);
    set_termios(fd, &termios)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn blank() -> Termios {
        // All flags cleared, like `memset` on a fresh `struct termios`.
        let raw: nix::libc::termios = unsafe { std::mem::zeroed() };
        Termios::from(raw)
    }

    fn cooked() -> Termios {
        let mut termios = blank();
        termios.local_flags = LocalFlags::ICANON | LocalFlags::ECHO | LocalFlags::ISIG;
        termios.output_flags = OutputFlags::OPOST | OutputFlags::ONLCR;
        termios.input_flags =
            InputFlags::IXON | InputFlags::IXOFF | InputFlags::IGNBRK | InputFlags::ICRNL;
        termios.control_flags =
            ControlFlags::CS7 | ControlFlags::CSTOPB | ControlFlags::CRTSCTS | ControlFlags::PARODD;
        termios.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        termios.control_chars[SpecialCharacterIndices::VTIME as usize] = 5;
        termios
    }

    #[rstest]
    #[case(0, ControlFlags::empty())]
    #[case(1, ControlFlags::PARENB | ControlFlags::PARODD)]
    #[case(2, ControlFlags::PARENB)]
    #[case(3, ControlFlags::empty())]
    #[case(42, ControlFlags::empty())]
    fn parity_modes_expand_to_control_flags(#[case] mode: u32, #[case] expected: ControlFlags) {
        let mut termios = cooked();
        make_raw(&mut termios, BaudRate::B115200, Parity::from_mode(mode)).unwrap();

        let parity_bits = ControlFlags::PARENB | ControlFlags::PARODD;
        assert_eq!(termios.control_flags & parity_bits, expected);
        assert_eq!(parity_of(&termios), Parity::from_mode(mode));
    }

    #[test]
    fn raw_mode_clears_line_discipline_and_flow_control() {
        let mut termios = cooked();
        make_raw(&mut termios, BaudRate::B57600, Parity::Even).unwrap();

        assert!(termios.local_flags.is_empty());
        assert!(termios.output_flags.is_empty());
        assert!(!termios.input_flags.intersects(
            InputFlags::IXON
                | InputFlags::IXOFF
                | InputFlags::IXANY
                | InputFlags::IGNBRK
                | InputFlags::ICRNL
        ));
        assert_eq!(
            termios.control_flags & ControlFlags::CSIZE,
            ControlFlags::CS8
        );
        assert!(termios
            .control_flags
            .contains(ControlFlags::CLOCAL | ControlFlags::CREAD));
        assert!(!termios
            .control_flags
            .intersects(ControlFlags::CSTOPB | ControlFlags::CRTSCTS));
        assert!(!is_blocking(&termios));
        assert_eq!(
            termios.control_chars[SpecialCharacterIndices::VTIME as usize],
            0
        );
    }

    #[test]
    fn every_supported_rate_is_applied_to_both_directions() {
        for baud in SUPPORTED_BAUD_RATES {
            let mut termios = blank();
            make_raw(&mut termios, baud, Parity::None).unwrap();
            assert_eq!(termios::cfgetispeed(&termios), baud.speed());
            assert_eq!(termios::cfgetospeed(&termios), baud.speed());
            assert_eq!(baud_rate_of(&termios), Ok(baud));
        }
    }

    #[test]
    fn blocking_toggle_leaves_speed_and_parity_alone() {
        let mut termios = blank();
        make_raw(&mut termios, BaudRate::B460800, Parity::Odd).unwrap();
        let before = termios.control_flags;

        make_blocking(&mut termios, true);
        assert!(is_blocking(&termios));
        make_blocking(&mut termios, false);
        assert!(!is_blocking(&termios));

        assert_eq!(termios.control_flags, before);
        assert_eq!(baud_rate_of(&termios), Ok(BaudRate::B460800));
        assert_eq!(parity_of(&termios), Parity::Odd);
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    #[test]
    fn speeds_are_the_platform_constants() {
        assert_eq!(BaudRate::resolve(19_200).speed(), Speed::B19200);
        assert_eq!(BaudRate::resolve_text("921600").speed(), Speed::B921600);
        assert_eq!(BaudRate::resolve(9600).speed(), Speed::B115200);
        assert_eq!(BaudRate::resolve_text("nope").speed(), Speed::B115200);
    }

    #[test]
    fn attributes_of_a_non_terminal_cannot_be_read() {
        let file = std::fs::File::open("/dev/null").unwrap();
        let fd = std::os::unix::io::AsRawFd::as_raw_fd(&file);

        let err = configure(fd, BaudRate::B115200, Parity::None).unwrap_err();
        assert_eq!(
            err.kind(),
            ErrorKind::Configuration(ConfigError::ReadAttributesFailed)
        );
        let err = set_blocking(fd, false).unwrap_err();
        assert_eq!(
            err.kind(),
            ErrorKind::Configuration(ConfigError::ReadAttributesFailed)
        );
    }
}
