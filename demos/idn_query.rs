//! Asks an instrument for its identification and prints the answer.
//!
//! Run with `RUST_LOG=debug` to follow the port setup.

use clap::Parser;
use log::{error, info};
use tty_serial::{BaudRequest, Parity};

const QUERY: &str = "*IDN?\r";

#[derive(Debug, Parser)]
struct Config {
    #[clap(long, default_value = "/dev/ttyUSB0")]
    port: String,
    /// Unsupported rates fall back to 115200
    #[clap(long, default_value = "115200")]
    baud: String,
}

pub fn main() {
    env_logger::init();

    let config = Config::parse();

    let mut port = match tty_serial::new(config.port.as_str(), 115200)
        .baud_request(BaudRequest::Text(&config.baud))
        .parity(Parity::None)
        .open()
    {
        Ok(port) => port,
        Err(e) => {
            error!("{}", e);
            return;
        }
    };

    info!(
        "Serial port baud rate: {}",
        port.baud_rate().expect("Could not get baud rate.")
    );

    port.write_text(QUERY).expect("Could not send query.");

    let answer = port.read_bytes(50, tty_serial::DEFAULT_READ_TIMEOUT);
    if !answer.is_empty() {
        println!("Read returned {}", String::from_utf8_lossy(&answer));
    }

    port.close().expect("Could not close port.");
}
