//! C interface with integer handles.
//!
//! A handle is the raw descriptor of an open port, negative values denote "no device". Handles
//! returned by [`tty_serial_open`] are owned by the caller until they are passed to
//! [`tty_serial_close`]. Closing a handle twice is undefined, as it is for `close(2)`.
//!
//! Each function is also exported under its `SerialPortLib` name (`SerialPort_Open`,
//! `SerialPort_Close`, `SerialPort_Write_ByteArray`, `SerialPort_Write_StringA` and
//! `SerialPort_Read_ByteArray`) with the same signature, so existing callers can load the
//! shared library built from this crate.

use std::ffi::CStr;
use std::mem::ManuallyDrop;
use std::os::raw::c_char;
use std::os::unix::io::{FromRawFd, IntoRawFd, RawFd};
use std::slice;
use std::time::Duration;

use crate::{Parity, TTYPort};

/// Lends out the port behind `handle` without taking over the descriptor.
unsafe fn borrow(handle: RawFd) -> Option<ManuallyDrop<TTYPort>> {
    if handle < 0 {
        None
    } else {
        Some(ManuallyDrop::new(TTYPort::from_raw_fd(handle)))
    }
}

fn clamp(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// Opens and configures the device at `path`.
///
/// `parity` is 0 for none, 1 for odd and 2 for even parity; other values disable parity.
/// Unsupported baud rates fall back to 115200. Returns the handle or -1 on failure.
///
/// # Safety
///
/// `path` has to be null or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn tty_serial_open(path: *const c_char, baud_rate: u32, parity: u32) -> i32 {
    if path.is_null() {
        return -1;
    }
    let path = match CStr::from_ptr(path).to_str() {
        Ok(path) => path,
        Err(_) => return -1,
    };

    match crate::open(path, baud_rate, Parity::from_mode(parity)) {
        Ok(port) => port.into_raw_fd(),
        Err(e) => {
            log::debug!("{}", e);
            -1
        }
    }
}

/// Closes a handle returned by [`tty_serial_open`].
///
/// # Safety
///
/// `handle` has to be open and must not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn tty_serial_close(handle: i32) {
    if handle >= 0 {
        let _ = TTYPort::from_raw_fd(handle).close();
    }
}

/// Writes `len` bytes from `data`. Returns the number of bytes written or -1 on error.
///
/// # Safety
///
/// `handle` has to be open and `data` has to point to at least `len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn tty_serial_write_bytes(handle: i32, data: *const u8, len: u32) -> i32 {
    let mut port = match borrow(handle) {
        Some(port) => port,
        None => return -1,
    };
    let data: &[u8] = if len == 0 {
        &[]
    } else if data.is_null() {
        return -1;
    } else {
        slice::from_raw_parts(data, len as usize)
    };

    port.write_bytes(data).map_or(-1, clamp)
}

/// Writes the NUL-terminated string `text` without its terminator.
///
/// Returns the number of bytes written or -1 on error.
///
/// # Safety
///
/// `handle` has to be open and `text` has to point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn tty_serial_write_text(handle: i32, text: *const c_char) -> i32 {
    let mut port = match borrow(handle) {
        Some(port) => port,
        None => return -1,
    };
    if text.is_null() {
        return -1;
    }

    port.write_bytes(CStr::from_ptr(text).to_bytes()).map_or(-1, clamp)
}

/// Reads up to `capacity` bytes into `buf` within `timeout_ms` milliseconds.
///
/// Returns the number of bytes read, 0 if nothing arrived in time, and -1 for a negative handle
/// or a missing buffer.
///
/// # Safety
///
/// `handle` has to be open and `buf` has to point to at least `capacity` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn tty_serial_read_bytes(
    handle: i32,
    buf: *mut u8,
    capacity: u32,
    timeout_ms: u32,
) -> i32 {
    let mut port = match borrow(handle) {
        Some(port) => port,
        None => return -1,
    };
    if buf.is_null() {
        return -1;
    }
    let buf = slice::from_raw_parts_mut(buf, capacity as usize);

    clamp(port.read_timeout(buf, Duration::from_millis(u64::from(timeout_ms))))
}

/// Same as [`tty_serial_open`].
///
/// # Safety
///
/// See [`tty_serial_open`].
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn SerialPort_Open(path: *const c_char, baud_rate: u32, parity: u32) -> i32 {
    tty_serial_open(path, baud_rate, parity)
}

/// Same as [`tty_serial_close`].
///
/// # Safety
///
/// See [`tty_serial_close`].
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn SerialPort_Close(handle: i32) {
    tty_serial_close(handle)
}

/// Same as [`tty_serial_write_bytes`].
///
/// # Safety
///
/// See [`tty_serial_write_bytes`].
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn SerialPort_Write_ByteArray(
    handle: i32,
    data: *const u8,
    len: u32,
) -> i32 {
    tty_serial_write_bytes(handle, data, len)
}

/// Same as [`tty_serial_write_text`].
///
/// # Safety
///
/// See [`tty_serial_write_text`].
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn SerialPort_Write_StringA(handle: i32, text: *const c_char) -> i32 {
    tty_serial_write_text(handle, text)
}

/// Same as [`tty_serial_read_bytes`].
///
/// # Safety
///
/// See [`tty_serial_read_bytes`].
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn SerialPort_Read_ByteArray(
    handle: i32,
    buf: *mut u8,
    capacity: u32,
    timeout_ms: u32,
) -> i32 {
    tty_serial_read_bytes(handle, buf, capacity, timeout_ms)
}
