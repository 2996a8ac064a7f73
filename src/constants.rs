//! Wire-level constants shared by the driver channel, port I/O and the EC
//! handshake.

use std::time::Duration;

/*────────── PawnIO driver ─────────*/

pub const DRIVER_PATH: &str = r"\\.\PawnIO";
pub const PAWNIO_DEVICE_TYPE: u32 = 41394;

const METHOD_BUFFERED: u32 = 0;
const FILE_ANY_ACCESS: u32 = 0;

/// Rust equivalent of the `CTL_CODE` macro.
pub const fn ctl_code(device_type: u32, function: u32, method: u32, access: u32) -> u32 {
    (device_type << 16) | (access << 14) | (function << 2) | method
}

pub const IOCTL_PAWNIO_LOAD_BINARY: u32 =
    ctl_code(PAWNIO_DEVICE_TYPE, 0x821, METHOD_BUFFERED, FILE_ANY_ACCESS);
pub const IOCTL_PAWNIO_EXECUTE: u32 =
    ctl_code(PAWNIO_DEVICE_TYPE, 0x841, METHOD_BUFFERED, FILE_ANY_ACCESS);

/// Width of the zero-padded function-name field in an execute request.
pub const FN_NAME_LENGTH: usize = 32;
/// Upper bound for a module blob handed to the driver.
pub const MAX_MODULE_SIZE: usize = 1024 * 1024;
pub const DEFAULT_MODULE: &str = "LpcACPIEC.bin";

pub const FN_PIO_READ: &str = "ioctl_pio_read";
pub const FN_PIO_WRITE: &str = "ioctl_pio_write";

/*────────── EC ports & status flags ─────────*/

pub const EC_DATA_PORT: u16 = 0x62;
pub const EC_CMD_PORT: u16 = 0x66;
/// Input buffer full: EC has not consumed the last byte yet.
pub const EC_IBF: u8 = 0x02;
/// Output buffer full: a data byte is waiting on the data port.
pub const EC_OBF: u8 = 0x01;
pub const EC_CMD_READ: u8 = 0x80;

/// Value reported for a register whose read failed.
pub const FAILURE_SENTINEL: u8 = 0xFF;
pub const REGISTER_COUNT: usize = 256;

/*────────── timing ─────────*/

pub const EC_WAIT_TIMEOUT: Duration = Duration::from_millis(20);
pub const EC_BUSY_WAIT_ITERATIONS: u32 = 100;
pub const EC_MAX_ATTEMPTS: u32 = 3;

/*────────── Access_EC mutex ─────────*/

pub const EC_MUTEX_NAME: &str = "Access_EC";
pub const EC_MUTEX_GLOBAL_NAME: &str = r"Global\Access_EC";
pub const MUTEX_TIMEOUT: Duration = Duration::from_millis(1000);
pub const MUTEX_ATTEMPTS: u32 = 3;
pub const MUTEX_RETRY_DELAY: Duration = Duration::from_millis(100);

/*────────── monitor ─────────*/

pub const MIN_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
