//! Descriptor accounting for failed opens. Kept in its own test binary so no other test opens or
//! closes descriptors at the same time.

use tty_serial::{ConfigError, ErrorKind, Parity};

fn open_descriptors() -> usize {
    std::fs::read_dir("/proc/self/fd").unwrap().count()
}

#[test]
#[cfg_attr(not(target_os = "linux"), ignore)]
fn test_failed_configuration_closes_the_device() {
    let before = open_descriptors();

    for _ in 0..8 {
        let err = tty_serial::open("/dev/null", 115200, Parity::Even).unwrap_err();
        assert_eq!(
            err.kind(),
            ErrorKind::Configuration(ConfigError::ReadAttributesFailed)
        );
    }

    assert_eq!(open_descriptors(), before);
}
