//! Driver channel: module loading and the generic "execute module function"
//! call that every hardware access goes through.
//!
//! Request layout for an execute call:
//!
//!   ┌──── 0                 32 ──────────── 32 + 8·N ┐
//!   │ function name (NUL-pad) │ i64 LE │ … │ i64 LE  │
//!   └─────────────────────────────────────────────────┘
//!
//! The reply is up to M little-endian 64-bit words; a short reply leaves the
//! remaining words zeroed.

use std::{fs, path::Path};

use crate::constants::{FN_NAME_LENGTH, MAX_MODULE_SIZE};
use crate::error::{EcError, ModuleLoadReason};

/// Raw operations offered by the kernel driver.
///
/// The Windows implementation lives in [`crate::comms::ioctl`]; tests plug in
/// a simulated device.
pub trait DriverTransport {
    /// Hand a module blob to the driver. No response payload.
    fn load_binary(&mut self, blob: &[u8]) -> std::io::Result<()>;

    /// Run a module function. Returns the number of bytes written to `reply`.
    fn execute(&mut self, request: &[u8], reply: &mut [u8]) -> std::io::Result<usize>;
}

/// Owns the driver connection for one run.
///
/// A closed channel is a valid, inert state: every call fails with
/// [`EcError::ChannelClosed`] and `close` is a no-op.
pub struct DriverChannel<T: DriverTransport> {
    transport: Option<T>,
    module_loaded: bool,
}

impl<T: DriverTransport> DriverChannel<T> {
    /// Wrap an already opened transport.
    pub fn new(transport: T) -> Self {
        Self { transport: Some(transport), module_loaded: false }
    }

    /// Open the transport with `connect`; any failure is `DriverUnavailable`.
    pub fn open<F>(connect: F) -> Result<Self, EcError>
    where
        F: FnOnce() -> std::io::Result<T>,
    {
        let transport = connect().map_err(EcError::DriverUnavailable)?;
        log::debug!("driver channel opened");
        Ok(Self::new(transport))
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    pub fn module_loaded(&self) -> bool {
        self.module_loaded
    }

    /// Read a module file from disk and load it.
    pub fn load_module_file(&mut self, path: &Path) -> Result<(), EcError> {
        log::debug!("Loading module: {}", path.display());
        let blob = fs::read(path).map_err(|e| EcError::ModuleLoad {
            path: path.to_path_buf(),
            reason: ModuleLoadReason::Io(e),
        })?;
        self.load_module(&blob).map_err(|reason| EcError::ModuleLoad {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Load `blob` as the active hardware-access module.
    pub fn load_module(&mut self, blob: &[u8]) -> Result<(), ModuleLoadReason> {
        if blob.is_empty() {
            return Err(ModuleLoadReason::Empty);
        }
        if blob.len() > MAX_MODULE_SIZE {
            return Err(ModuleLoadReason::Oversized(blob.len()));
        }
        let transport = self.transport.as_mut().ok_or_else(|| {
            ModuleLoadReason::Rejected(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "driver channel is closed",
            ))
        })?;
        log::debug!("Module size: {} bytes", blob.len());
        transport.load_binary(blob).map_err(ModuleLoadReason::Rejected)?;
        self.module_loaded = true;
        Ok(())
    }

    /// Invoke `function` in the loaded module.
    ///
    /// Names longer than 31 bytes are truncated so the field always keeps a
    /// terminating NUL.
    pub fn call(
        &mut self,
        function: &str,
        input: &[i64],
        output_words: usize,
    ) -> Result<Vec<i64>, CallError> {
        let transport = self.transport.as_mut().ok_or(CallError::Closed)?;
        if !self.module_loaded {
            return Err(CallError::NotLoaded);
        }

        let request = encode_request(function, input);
        let mut reply = vec![0u8; output_words * 8];
        let written = transport.execute(&request, &mut reply).map_err(CallError::Io)?;
        let written = written.min(reply.len());
        reply[written..].fill(0);

        Ok(reply
            .chunks_exact(8)
            .map(|w| i64::from_le_bytes([w[0], w[1], w[2], w[3], w[4], w[5], w[6], w[7]]))
            .collect())
    }

    /// Release the connection. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.transport.take().is_some() {
            log::debug!("driver channel closed");
        }
        self.module_loaded = false;
    }
}

/// Failure of a single execute call.
#[derive(Debug)]
pub enum CallError {
    Closed,
    NotLoaded,
    Io(std::io::Error),
}

fn encode_request(function: &str, input: &[i64]) -> Vec<u8> {
    let mut buf = vec![0u8; FN_NAME_LENGTH + input.len() * 8];
    let name = function.as_bytes();
    let n = name.len().min(FN_NAME_LENGTH - 1);
    buf[..n].copy_from_slice(&name[..n]);
    for (i, word) in input.iter().enumerate() {
        let off = FN_NAME_LENGTH + i * 8;
        buf[off..off + 8].copy_from_slice(&word.to_le_bytes());
    }
    buf
}
