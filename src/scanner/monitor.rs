//! Continuous monitor: scan, render, sleep out the rest of the interval.
//!
//! The loop stops only between cycles, never mid-handshake. Callers pass a
//! [`StopSignal`] (Ctrl+C in the binary) and optionally a cycle limit.

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use super::snapshot::{ScanSnapshot, scan_all};
use crate::constants::{DEFAULT_INTERVAL, MIN_INTERVAL};
use crate::error::EcError;
use crate::protocol::RegisterSource;
use crate::render::{Console, GridRenderer};

/// Refresh interval, validated against the 2 s floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorInterval(Duration);

impl MonitorInterval {
    pub fn new(interval: Duration) -> Result<Self, EcError> {
        if interval < MIN_INTERVAL {
            return Err(EcError::InvalidInterval(interval));
        }
        Ok(Self(interval))
    }

    pub fn from_secs(secs: u64) -> Result<Self, EcError> {
        Self::new(Duration::from_secs(secs))
    }

    pub fn get(self) -> Duration {
        self.0
    }

    /// Time left in this cycle after a scan that took `scan`.
    pub fn remaining_after(self, scan: Duration) -> Duration {
        self.0.saturating_sub(scan)
    }
}

impl Default for MonitorInterval {
    fn default() -> Self {
        Self(DEFAULT_INTERVAL)
    }
}

/// Cooperative stop flag shared with the console control handler.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Sleep for `total`, waking early once stopped.
    pub fn sleep(&self, total: Duration) {
        const SLICE: Duration = Duration::from_millis(50);
        let deadline = Instant::now() + total;
        while !self.is_stopped() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep(SLICE.min(deadline - now));
        }
    }
}

/// Run monitor cycles until stopped or `max_cycles` is reached.
/// Returns the number of completed cycles.
pub fn run_monitor<S, C>(
    source: &mut S,
    renderer: &GridRenderer,
    console: &mut C,
    interval: MonitorInterval,
    stop: &StopSignal,
    max_cycles: Option<usize>,
) -> io::Result<usize>
where
    S: RegisterSource,
    C: Console,
{
    log::info!("monitor started, interval {:?}", interval.get());
    let mut previous = ScanSnapshot::baseline();
    let mut cycles = 0usize;

    while !stop.is_stopped() && max_cycles.is_none_or(|m| cycles < m) {
        let current = scan_all(source);
        renderer.render_monitor_frame(console, &current, &previous, interval.get())?;
        cycles += 1;

        let wait = interval.remaining_after(current.elapsed());
        previous = current;

        if max_cycles.is_some_and(|m| cycles >= m) {
            break;
        }
        log::trace!("cycle {} done, sleeping {:?}", cycles, wait);
        stop.sleep(wait);
    }

    log::info!("monitor stopped after {} cycle(s)", cycles);
    Ok(cycles)
}

#[cfg(windows)]
mod ctrl {
    use super::StopSignal;
    use std::sync::OnceLock;
    use windows_sys::Win32::{Foundation::BOOL, System::Console::SetConsoleCtrlHandler};

    static STOP: OnceLock<StopSignal> = OnceLock::new();

    unsafe extern "system" fn on_ctrl(_ctrl_type: u32) -> BOOL {
        match STOP.get() {
            // second Ctrl+C falls through to the default handler
            Some(stop) if !stop.is_stopped() => {
                stop.stop();
                1
            }
            _ => 0,
        }
    }

    pub fn install(stop: &StopSignal) -> bool {
        if STOP.set(stop.clone()).is_err() {
            return false;
        }
        unsafe { SetConsoleCtrlHandler(Some(on_ctrl), 1) != 0 }
    }
}

/// Route Ctrl+C / Ctrl+Break to `stop` so the monitor ends after the
/// current cycle. Returns `false` when no handler could be installed and
/// the default (immediate termination) applies.
#[cfg(windows)]
pub fn install_ctrl_handler(stop: &StopSignal) -> bool {
    ctrl::install(stop)
}

#[cfg(not(windows))]
pub fn install_ctrl_handler(_stop: &StopSignal) -> bool {
    false
}
