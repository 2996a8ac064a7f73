// tests/common/mod.rs
//
// Simulated PawnIO device with an ACPI EC behind ports 0x62/0x66.
// Decodes execute requests exactly as the driver sees them, so the whole
// stack (channel → port I/O → handshake) runs unmodified on any host.

#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    io,
    rc::Rc,
};

use ecreader::comms::{DriverChannel, DriverTransport, EcMutexGuard, SystemMutex};
use ecreader::{EcProtocol, Session};

const FN_NAME_LENGTH: usize = 32;

/// EC controller state visible to the test after a run.
#[derive(Default)]
pub struct EcState {
    pub registers: HashMap<u8, u8>,
    /// Registers whose data never arrives (OBF stays clear).
    pub dead: HashSet<u8>,
    /// Registers that time out this many times before answering.
    pub flaky: HashMap<u8, u32>,
    pub loaded: Option<Vec<u8>>,
    pub reject_module: bool,
    pub executes: usize,
    pending_address: bool,
    output: Option<u8>,
}

impl EcState {
    fn status(&self) -> u8 {
        // IBF is never set: the simulated EC consumes input instantly.
        u8::from(self.output.is_some())
    }

    fn write(&mut self, port: i64, value: u8) -> io::Result<()> {
        match port {
            0x66 if value == 0x80 => {
                self.pending_address = true;
                self.output = None;
                Ok(())
            }
            0x62 if self.pending_address => {
                self.pending_address = false;
                if self.dead.contains(&value) {
                    return Ok(());
                }
                if let Some(left) = self.flaky.get_mut(&value) {
                    if *left > 0 {
                        *left -= 1;
                        return Ok(());
                    }
                }
                self.output = Some(self.registers.get(&value).copied().unwrap_or(0));
                Ok(())
            }
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unexpected write 0x{value:02X} to port 0x{port:X}"),
            )),
        }
    }

    fn read(&mut self, port: i64) -> io::Result<u8> {
        match port {
            0x66 => Ok(self.status()),
            0x62 => Ok(self.output.take().unwrap_or(0)),
            _ => Err(io::Error::new(io::ErrorKind::InvalidInput, "unknown port")),
        }
    }
}

/// Transport half handed to `DriverChannel`; the test keeps the other `Rc`.
pub struct SimPawnIo {
    pub state: Rc<RefCell<EcState>>,
}

impl DriverTransport for SimPawnIo {
    fn load_binary(&mut self, blob: &[u8]) -> io::Result<()> {
        let mut st = self.state.borrow_mut();
        if st.reject_module {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "bad module signature"));
        }
        st.loaded = Some(blob.to_vec());
        Ok(())
    }

    fn execute(&mut self, request: &[u8], reply: &mut [u8]) -> io::Result<usize> {
        let mut st = self.state.borrow_mut();
        st.executes += 1;

        let name_end = request[..FN_NAME_LENGTH].iter().position(|&b| b == 0).unwrap_or(FN_NAME_LENGTH);
        let name = std::str::from_utf8(&request[..name_end]).expect("ascii function name");
        let words: Vec<i64> = request[FN_NAME_LENGTH..]
            .chunks_exact(8)
            .map(|w| i64::from_le_bytes(w.try_into().unwrap()))
            .collect();

        match name {
            "ioctl_pio_read" => {
                let value = st.read(words[0])?;
                reply[..8].copy_from_slice(&i64::from(value).to_le_bytes());
                Ok(8)
            }
            "ioctl_pio_write" => {
                st.write(words[0], words[1] as u8)?;
                Ok(0)
            }
            other => Err(io::Error::new(io::ErrorKind::Unsupported, other.to_string())),
        }
    }
}

/// Fresh device with the given register contents.
pub fn device(registers: &[(u8, u8)]) -> Rc<RefCell<EcState>> {
    let state = EcState { registers: registers.iter().copied().collect(), ..Default::default() };
    Rc::new(RefCell::new(state))
}

/// Channel with a module already loaded.
pub fn loaded_channel(state: &Rc<RefCell<EcState>>) -> DriverChannel<SimPawnIo> {
    let mut channel = DriverChannel::new(SimPawnIo { state: Rc::clone(state) });
    channel.load_module(b"LpcACPIEC").expect("module accepted");
    channel
}

/// Full reader stack without a system mutex.
pub fn reader<'s>(
    state: &Rc<RefCell<EcState>>,
    session: &'s Session,
) -> EcProtocol<'s, DriverChannel<SimPawnIo>, SystemMutex> {
    EcProtocol::new(loaded_channel(state), EcMutexGuard::new(None), session)
}
