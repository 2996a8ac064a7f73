//! Error taxonomy for driver access and the EC handshake.

use std::{io, path::PathBuf, time::Duration};
use thiserror::Error;

use crate::protocol::Stage;

/// Everything that can go wrong between the CLI and the hardware.
///
/// `DriverUnavailable` and `ModuleLoad` end the run. The lock, port and
/// handshake variants are retried inside the protocol's attempt budget and
/// only surface as a failed register read.
#[derive(Debug, Error)]
pub enum EcError {
    #[error("failed to open PawnIO driver: {0}")]
    DriverUnavailable(#[source] io::Error),

    #[error("failed to load module {path:?}: {reason}")]
    ModuleLoad { path: PathBuf, reason: ModuleLoadReason },

    #[error("driver channel is closed")]
    ChannelClosed,

    #[error("no module loaded into the driver")]
    ModuleNotLoaded,

    #[error("could not acquire the EC mutex")]
    LockTimeout,

    #[error("port operation on 0x{port:02X} failed: {source}")]
    PortOpFailed {
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("EC handshake timed out in {stage:?} after {timeout:?}")]
    HandshakeTimeout { stage: Stage, timeout: Duration },

    #[error("interval {0:?} is below the 2 second minimum")]
    InvalidInterval(Duration),

    #[error("invalid register address '{0}'")]
    InvalidRegister(String),
}

/// Why a module blob was refused.
#[derive(Debug, Error)]
pub enum ModuleLoadReason {
    #[error("cannot read file: {0}")]
    Io(#[from] io::Error),

    #[error("module is empty")]
    Empty,

    #[error("module is {0} bytes, limit is 1 MiB")]
    Oversized(usize),

    #[error("driver rejected the module: {0}")]
    Rejected(#[source] io::Error),
}

impl EcError {
    /// Terminal errors abort the whole run instead of failing one register.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EcError::DriverUnavailable(_)
                | EcError::ModuleLoad { .. }
                | EcError::ChannelClosed
                | EcError::ModuleNotLoaded
        )
    }
}
