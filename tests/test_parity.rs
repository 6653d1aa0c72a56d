mod config;

use assert_hex::assert_eq_hex;
use config::{hw_config, HardwareConfig};
use rstest::rstest;
use rstest_reuse::{self, apply, template};
use std::time::Duration;
use tty_serial::Parity;

// Both ports of the hardware setup have to be wired to each other (TX to RX and RX to TX).

#[template]
#[rstest]
#[case(Parity::None)]
#[case(Parity::Odd)]
#[case(Parity::Even)]
fn standard_parities(#[case] parity: Parity) {}

#[apply(standard_parities)]
#[cfg_attr(not(feature = "hardware-tests"), ignore)]
fn test_end_to_end(hw_config: HardwareConfig, #[case] parity: Parity) {
    const MESSAGE: [u8; 10] = *b"0123456789";

    let mut sender = tty_serial::open(hw_config.port_1, 115200, parity).unwrap();
    let mut receiver = tty_serial::open(hw_config.port_2, 115200, parity).unwrap();

    assert_eq!(sender.write_bytes(&MESSAGE).unwrap(), MESSAGE.len());

    let received = receiver.read_bytes(MESSAGE.len(), Duration::from_millis(1000));

    assert_eq_hex!(received.as_slice(), &MESSAGE[..]);
}

#[apply(standard_parities)]
#[cfg_attr(not(feature = "hardware-tests"), ignore)]
fn test_parity_is_applied(hw_config: HardwareConfig, #[case] parity: Parity) {
    let port = tty_serial::open(hw_config.port_1, 57600, parity).unwrap();

    assert_eq!(port.parity().unwrap(), parity);
    assert_eq!(port.baud_rate().unwrap(), tty_serial::BaudRate::B57600);

    port.set_blocking(true).unwrap();
    port.set_blocking(false).unwrap();

    assert_eq!(port.parity().unwrap(), parity);
    assert_eq!(port.baud_rate().unwrap(), tty_serial::BaudRate::B57600);
}

#[rstest]
#[case(3)]
#[case(255)]
#[cfg_attr(not(feature = "hardware-tests"), ignore)]
fn test_unknown_parity_modes_disable_parity(hw_config: HardwareConfig, #[case] mode: u32) {
    let port = tty_serial::open(hw_config.port_1, 115200, Parity::from_mode(mode)).unwrap();

    assert_eq!(port.parity().unwrap(), Parity::None);
}
