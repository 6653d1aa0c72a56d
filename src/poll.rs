//! Timed polling reads.
//!
//! Ports are configured so that a read returns at once with whatever the device has buffered.
//! The loop here turns that into a read with an overall timeout which also returns early once
//! the sender has gone quiet after delivering some data.

use std::io::{self, Read};
use std::thread;
use std::time::Duration;

/// How timed reads poll a device
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PollPolicy {
    /// Pause between two read attempts. The timeout is spent in units of this step.
    pub step: Duration,
    /// Number of consecutive empty polls, following at least one successful read, after which
    /// the sender is considered finished.
    pub quiet_polls: u32,
}

impl PollPolicy {
    /// Poll every 10 ms and stop after 2 empty polls
    pub const DEFAULT: PollPolicy = PollPolicy {
        step: Duration::from_millis(10),
        quiet_polls: 2,
    };

    // A zero step would never use up the time budget.
    fn effective_step(&self) -> Duration {
        self.step.max(Duration::from_millis(1))
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Reads into `buf` until it is full, `timeout` is used up, or `policy.quiet_polls` consecutive
/// polls came back empty after data had arrived
///
/// Returns the number of bytes placed into `buf`. Failed reads count as empty polls, so a device
/// that goes away mid-read yields whatever was read up to then.
pub(crate) fn read_polled<R: Read + ?Sized>(
    source: &mut R,
    buf: &mut [u8],
    timeout: Duration,
    policy: &PollPolicy,
) -> usize {
    read_polled_with(source, buf, timeout, policy, thread::sleep)
}

pub(crate) fn read_polled_with<R, S>(
    source: &mut R,
    buf: &mut [u8],
    timeout: Duration,
    policy: &PollPolicy,
    mut sleep: S,
) -> usize
where
    R: Read + ?Sized,
    S: FnMut(Duration),
{
    let step = policy.effective_step();
    let mut offset = 0;
    let mut empty_polls = 0;
    let mut elapsed = Duration::ZERO;

    while elapsed < timeout && offset < buf.len() {
        match source.read(&mut buf[offset..]) {
            Ok(n) if n > 0 => {
                offset += n;
                empty_polls = 0;
                log::trace!("poll got {} bytes, {} of {} read", n, offset, buf.len());
            }
            result => {
                if let Err(ref e) = result {
                    if e.kind() != io::ErrorKind::WouldBlock {
                        log::trace!("poll failed: {}", e);
                    }
                }
                if offset > 0 {
                    empty_polls += 1;
                    if empty_polls >= policy.quiet_polls {
                        log::trace!("sender quiet after {} bytes", offset);
                        break;
                    }
                }
            }
        }

        sleep(step);
        elapsed += step;
    }

    offset
}
