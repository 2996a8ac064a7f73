//! EC register-read handshake.
//!
//! ```text
//! Idle → LockWait → CmdReady → CmdSent → AddrReady → AddrSent → DataReady → DataRead
//!        └──────────────── Access_EC held ───────────────────────────────┘
//! ```
//!
//! 1. wait IBF=0     2. cmd port ← 0x80     3. wait IBF=0
//! 4. data port ← address     5. wait OBF=1     6. data port → value
//!
//! Steps 4–6 run with tracing muted; log output there can stretch the
//! exchange past the controller's timing window.

use std::{fmt, thread, time::Instant};

use crate::comms::ec_mutex::{EcMutexGuard, NamedLock};
use crate::comms::pio::PortIo;
use crate::constants::{
    EC_BUSY_WAIT_ITERATIONS, EC_CMD_PORT, EC_CMD_READ, EC_DATA_PORT, EC_IBF, EC_MAX_ATTEMPTS,
    EC_OBF, EC_WAIT_TIMEOUT, FAILURE_SENTINEL,
};
use crate::error::EcError;
use crate::session::Session;

/// Handshake wait that can time out: before the command, before the
/// address, and for the data byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CmdReady,
    AddrReady,
    DataReady,
}

/// Outcome of one register read. `Failed` reports as 0xFF through
/// [`RegisterValue::byte`], which is also a legitimate register content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterValue {
    Read(u8),
    Failed,
}

impl RegisterValue {
    pub fn byte(self) -> u8 {
        match self {
            RegisterValue::Read(v) => v,
            RegisterValue::Failed => FAILURE_SENTINEL,
        }
    }

    pub fn is_ok(self) -> bool {
        matches!(self, RegisterValue::Read(_))
    }

    pub fn value(self) -> Option<u8> {
        match self {
            RegisterValue::Read(v) => Some(v),
            RegisterValue::Failed => None,
        }
    }
}

impl Default for RegisterValue {
    fn default() -> Self {
        RegisterValue::Read(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterRead {
    pub address: u8,
    pub value: RegisterValue,
    /// Extra attempts spent on this register.
    pub retries: u32,
}

impl RegisterRead {
    pub fn success(&self) -> bool {
        self.value.is_ok()
    }

    /// Value with the failure sentinel substituted.
    pub fn byte(&self) -> u8 {
        self.value.byte()
    }
}

impl fmt::Display for RegisterRead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            RegisterValue::Read(v) => write!(f, "0x{:02X}:{:02X}", self.address, v),
            RegisterValue::Failed => write!(f, "0x{:02X}:??", self.address),
        }
    }
}

/// Something that can read EC registers one at a time.
pub trait RegisterSource {
    fn read_register(&mut self, address: u8) -> RegisterRead;
}

/// The read state machine over port I/O and the optional EC mutex.
pub struct EcProtocol<'s, P: PortIo, L: NamedLock> {
    ports: P,
    mutex: EcMutexGuard<L>,
    session: &'s Session,
}

impl<'s, P: PortIo, L: NamedLock> EcProtocol<'s, P, L> {
    pub fn new(ports: P, mutex: EcMutexGuard<L>, session: &'s Session) -> Self {
        Self { ports, mutex, session }
    }

    pub fn has_mutex(&self) -> bool {
        self.mutex.has_lock()
    }

    pub fn ports_mut(&mut self) -> &mut P {
        &mut self.ports
    }

    /// Read one register with up to three attempts.
    ///
    /// Lock and handshake failures on a non-final attempt are retried after
    /// yielding once. Always returns; check [`RegisterRead::success`].
    pub fn read_register(&mut self, address: u8) -> RegisterRead {
        let session = self.session;
        let counters = session.counters();
        let mut retries = 0;

        for attempt in 0..EC_MAX_ATTEMPTS {
            retries = attempt;
            let last = attempt + 1 == EC_MAX_ATTEMPTS;

            let outcome = match self.mutex.hold(counters) {
                Some(_held) => handshake(&mut self.ports, session, address),
                None => Err(EcError::LockTimeout),
            };

            match outcome {
                Ok(value) => {
                    if attempt > 0 {
                        ec_trace!(session, "protocol", "Read succeeded on retry {}", attempt);
                    }
                    ec_trace!(session, "protocol", "EC[0x{:02X}] = 0x{:02X}", address, value);
                    counters.record_success();
                    return RegisterRead { address, value: RegisterValue::Read(value), retries: attempt };
                }
                Err(e) => {
                    ec_trace!(session, "protocol", "EC read of 0x{:02X} failed: {}", address, e);
                    if e.is_terminal() {
                        log::warn!("EC read of 0x{address:02X} aborted: {e}");
                        break;
                    }
                    if !last {
                        counters.record_retry();
                        ec_trace!(
                            session,
                            "protocol",
                            "retry {}/{}",
                            attempt + 1,
                            EC_MAX_ATTEMPTS - 1
                        );
                        thread::yield_now();
                    }
                }
            }
        }

        counters.record_failure();
        RegisterRead { address, value: RegisterValue::Failed, retries }
    }
}

impl<P: PortIo, L: NamedLock> RegisterSource for EcProtocol<'_, P, L> {
    fn read_register(&mut self, address: u8) -> RegisterRead {
        EcProtocol::read_register(self, address)
    }
}

/// Steps 1–6. Caller owns the lock.
fn handshake<P: PortIo>(ports: &mut P, session: &Session, address: u8) -> Result<u8, EcError> {
    ec_trace!(session, "protocol", "Reading EC register 0x{:02X}", address);

    wait_status(ports, session, Stage::CmdReady, |s| s & EC_IBF == 0)?;
    write_port(ports, session, EC_CMD_PORT, EC_CMD_READ)?;
    wait_status(ports, session, Stage::AddrReady, |s| s & EC_IBF == 0)?;

    let _quiet = session.quiet();
    write_port(ports, session, EC_DATA_PORT, address)?;
    wait_status(ports, session, Stage::DataReady, |s| s & EC_OBF != 0)?;
    read_port(ports, session, EC_DATA_PORT)
}

/// Poll the status byte until `ready` holds or the 20 ms window closes.
/// The first polls spin; after that each poll yields the processor.
fn wait_status<P, F>(ports: &mut P, session: &Session, stage: Stage, ready: F) -> Result<(), EcError>
where
    P: PortIo,
    F: Fn(u8) -> bool,
{
    let quiet = session.quiet();
    let start = Instant::now();
    let mut polls: u32 = 0;

    while start.elapsed() < EC_WAIT_TIMEOUT {
        let status = read_port(ports, session, EC_CMD_PORT)?;
        if ready(status) {
            return Ok(());
        }
        polls += 1;
        if polls > EC_BUSY_WAIT_ITERATIONS {
            thread::yield_now();
        }
    }

    drop(quiet);
    ec_trace!(session, "protocol", "{:?} wait timed out after {:?}", stage, EC_WAIT_TIMEOUT);
    Err(EcError::HandshakeTimeout { stage, timeout: EC_WAIT_TIMEOUT })
}

fn read_port<P: PortIo>(ports: &mut P, session: &Session, port: u16) -> Result<u8, EcError> {
    match ports.read_port(port) {
        Ok(v) => {
            ec_trace!(session, "pio", "PortRead(0x{:02X}) = 0x{:02X}", port, v);
            Ok(v)
        }
        Err(e) => {
            ec_trace!(session, "pio", "PortRead(0x{:02X}) FAILED", port);
            Err(e)
        }
    }
}

fn write_port<P: PortIo>(ports: &mut P, session: &Session, port: u16, value: u8) -> Result<(), EcError> {
    let res = ports.write_port(port, value);
    match &res {
        Ok(()) => ec_trace!(session, "pio", "PortWrite(0x{:02X}, 0x{:02X})", port, value),
        Err(_) => ec_trace!(session, "pio", "PortWrite(0x{:02X}, 0x{:02X}) FAILED", port, value),
    }
    res
}
