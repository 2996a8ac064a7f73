//! Byte-wide port I/O on top of the driver channel.

use super::driver::{CallError, DriverChannel, DriverTransport};
use crate::constants::{FN_PIO_READ, FN_PIO_WRITE};
use crate::error::EcError;

/// Byte access to hardware I/O ports. No retries at this layer.
pub trait PortIo {
    fn read_port(&mut self, port: u16) -> Result<u8, EcError>;
    fn write_port(&mut self, port: u16, value: u8) -> Result<(), EcError>;
}

impl<T: DriverTransport> PortIo for DriverChannel<T> {
    fn read_port(&mut self, port: u16) -> Result<u8, EcError> {
        let out = self
            .call(FN_PIO_READ, &[i64::from(port)], 1)
            .map_err(|e| port_failed(port, e))?;
        Ok(out.first().copied().unwrap_or(0) as u8)
    }

    fn write_port(&mut self, port: u16, value: u8) -> Result<(), EcError> {
        self.call(FN_PIO_WRITE, &[i64::from(port), i64::from(value)], 0)
            .map(|_| ())
            .map_err(|e| port_failed(port, e))
    }
}

fn port_failed(port: u16, err: CallError) -> EcError {
    match err {
        CallError::Closed => EcError::ChannelClosed,
        CallError::NotLoaded => EcError::ModuleNotLoaded,
        CallError::Io(source) => EcError::PortOpFailed { port, source },
    }
}
