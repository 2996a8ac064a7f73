//! Per-run context threaded through the protocol.
//!
//! Holds the operation counters and the trace-suppression flag. Everything is
//! `Cell`-based: the reader is single-threaded and the protocol only ever
//! needs a shared borrow.

use std::{cell::Cell, fmt};

/// Counters accumulated over one process run. Never reset.
#[derive(Debug, Default)]
pub struct OperationCounters {
    successful_reads: Cell<u64>,
    failed_reads: Cell<u64>,
    retries: Cell<u64>,
    mutex_retries: Cell<u64>,
    mutex_failures: Cell<u64>,
}

fn bump(c: &Cell<u64>) {
    c.set(c.get() + 1);
}

impl OperationCounters {
    pub fn record_success(&self) {
        bump(&self.successful_reads);
    }
    pub fn record_failure(&self) {
        bump(&self.failed_reads);
    }
    pub fn record_retry(&self) {
        bump(&self.retries);
    }
    pub fn record_mutex_retry(&self) {
        bump(&self.mutex_retries);
    }
    pub fn record_mutex_failure(&self) {
        bump(&self.mutex_failures);
    }

    pub fn successful_reads(&self) -> u64 {
        self.successful_reads.get()
    }
    pub fn failed_reads(&self) -> u64 {
        self.failed_reads.get()
    }
    pub fn retries(&self) -> u64 {
        self.retries.get()
    }
    pub fn mutex_retries(&self) -> u64 {
        self.mutex_retries.get()
    }
    pub fn mutex_failures(&self) -> u64 {
        self.mutex_failures.get()
    }

    /// Register reads issued, independent of how many hardware attempts each took.
    pub fn total_reads(&self) -> u64 {
        self.successful_reads() + self.failed_reads()
    }

    /// Statistics block; mutex lines are only shown when a named lock exists.
    pub fn report(&self, has_mutex: bool) -> Statistics<'_> {
        Statistics { counters: self, has_mutex }
    }
}

/// Printable end-of-run summary.
pub struct Statistics<'a> {
    counters: &'a OperationCounters,
    has_mutex: bool,
}

impl fmt::Display for Statistics<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.counters;
        writeln!(f, "=== Statistics ===")?;
        writeln!(f, "Successful reads: {}", c.successful_reads())?;
        writeln!(f, "Failed reads:     {}", c.failed_reads())?;
        writeln!(f, "Retry attempts:   {}", c.retries())?;
        if self.has_mutex {
            writeln!(f, "Mutex retries:    {}", c.mutex_retries())?;
            writeln!(f, "Mutex failures:   {}", c.mutex_failures())?;
        }
        let total = c.total_reads();
        if total > 0 {
            let rate = c.successful_reads() as f64 / total as f64 * 100.0;
            writeln!(f, "Success rate:     {rate:.1}%")?;
            if c.retries() > 0 {
                let avg = c.retries() as f64 / total as f64;
                writeln!(f, "Avg retries:      {avg:.2} per operation")?;
            }
        }
        write!(f, "==================")
    }
}

/// Explicit run context: counters plus trace suppression.
#[derive(Debug, Default)]
pub struct Session {
    counters: OperationCounters,
    suppressed: Cell<bool>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counters(&self) -> &OperationCounters {
        &self.counters
    }

    /// `false` while a timing-critical section is running.
    pub fn tracing(&self) -> bool {
        !self.suppressed.get()
    }

    /// Mute tracing for the whole run (monitor and dump modes).
    pub fn suppress_always(&self) {
        self.suppressed.set(true);
    }

    /// Mute tracing until the returned guard drops; the previous state is
    /// restored on every exit path.
    pub fn quiet(&self) -> QuietGuard<'_> {
        let prev = self.suppressed.replace(true);
        QuietGuard { session: self, prev }
    }
}

pub struct QuietGuard<'a> {
    session: &'a Session,
    prev: bool,
}

impl Drop for QuietGuard<'_> {
    fn drop(&mut self) {
        self.session.suppressed.set(self.prev);
    }
}
