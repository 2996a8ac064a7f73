//! Everything between the reader and the hardware: driver channel, port I/O
//! and the shared EC mutex.

pub mod driver;
pub mod ec_mutex;
#[cfg(windows)]
pub mod ioctl;
pub mod pio;

pub use driver::{DriverChannel, DriverTransport};
pub use ec_mutex::{EcMutexGuard, NamedLock, SystemMutex, WaitOutcome};
pub use pio::PortIo;

/// Open the PawnIO device.
#[cfg(windows)]
pub fn open_driver() -> Result<DriverChannel<ioctl::PawnIo>, crate::error::EcError> {
    DriverChannel::open(ioctl::PawnIo::open)
}

/// Transport type on hosts without the PawnIO driver; it can never be opened.
#[cfg(not(windows))]
pub enum Unsupported {}

#[cfg(not(windows))]
impl DriverTransport for Unsupported {
    fn load_binary(&mut self, _blob: &[u8]) -> std::io::Result<()> {
        match *self {}
    }
    fn execute(&mut self, _request: &[u8], _reply: &mut [u8]) -> std::io::Result<usize> {
        match *self {}
    }
}

#[cfg(not(windows))]
pub fn open_driver() -> Result<DriverChannel<Unsupported>, crate::error::EcError> {
    DriverChannel::open(|| {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "PawnIO is only available on Windows",
        ))
    })
}
