//! `Access_EC` mutex: the cooperative lock that firmware tools and hardware
//! monitors take before touching the EC ports.
//!
//! The lock is optional. When no other software created it, the guard runs
//! unsynchronized and says so once at open time.

use std::{io, thread, time::Duration};

use crate::constants::{MUTEX_ATTEMPTS, MUTEX_RETRY_DELAY, MUTEX_TIMEOUT};
use crate::session::OperationCounters;

/// Result of a single bounded wait on the named lock.
#[derive(Debug)]
pub enum WaitOutcome {
    Acquired,
    /// The previous holder exited while owning the lock. Ownership passes to
    /// us and the EC is treated as consistent.
    Abandoned,
    Timeout,
    Failed(io::Error),
}

/// An external, cross-process mutual-exclusion resource.
pub trait NamedLock {
    fn try_acquire(&mut self, timeout: Duration) -> WaitOutcome;
    fn release(&mut self);
}

/// Retry policy around an optional [`NamedLock`].
pub struct EcMutexGuard<L: NamedLock> {
    lock: Option<L>,
    held: bool,
    wait_timeout: Duration,
    retry_delay: Duration,
}

impl<L: NamedLock> EcMutexGuard<L> {
    pub fn new(lock: Option<L>) -> Self {
        if lock.is_none() {
            log::warn!("Access_EC mutex not found, continuing without synchronization");
        }
        Self { lock, held: false, wait_timeout: MUTEX_TIMEOUT, retry_delay: MUTEX_RETRY_DELAY }
    }

    /// Override per-attempt wait and back-off (tests use short values).
    pub fn with_timing(mut self, wait_timeout: Duration, retry_delay: Duration) -> Self {
        self.wait_timeout = wait_timeout;
        self.retry_delay = retry_delay;
        self
    }

    pub fn has_lock(&self) -> bool {
        self.lock.is_some()
    }

    /// Take the lock: up to three bounded waits with a short back-off after
    /// each timeout. Returns `false` once attempts are exhausted or the wait
    /// itself fails.
    pub fn acquire(&mut self, counters: &OperationCounters) -> bool {
        let Some(lock) = self.lock.as_mut() else {
            log::trace!("no EC mutex, access is unsynchronized");
            return true;
        };

        for attempt in 0..MUTEX_ATTEMPTS {
            match lock.try_acquire(self.wait_timeout) {
                outcome @ (WaitOutcome::Acquired | WaitOutcome::Abandoned) => {
                    if matches!(outcome, WaitOutcome::Abandoned) {
                        log::warn!("EC mutex was abandoned by its previous owner");
                    }
                    if attempt > 0 {
                        log::debug!("Mutex acquired after {} retries", attempt);
                        counters.record_mutex_retry();
                    }
                    self.held = true;
                    return true;
                }
                WaitOutcome::Timeout => {
                    log::debug!("Mutex timeout (attempt {}/{})", attempt + 1, MUTEX_ATTEMPTS);
                    if attempt + 1 < MUTEX_ATTEMPTS {
                        thread::sleep(self.retry_delay);
                    }
                }
                WaitOutcome::Failed(e) => {
                    log::debug!("Mutex wait failed: {}", e);
                    break;
                }
            }
        }

        counters.record_mutex_failure();
        false
    }

    /// Release the lock if we hold it.
    pub fn release(&mut self) {
        if !self.held {
            return;
        }
        if let Some(lock) = self.lock.as_mut() {
            lock.release();
        }
        self.held = false;
    }

    /// Acquire and hand back a guard that releases on drop.
    pub fn hold(&mut self, counters: &OperationCounters) -> Option<Held<'_, L>> {
        self.acquire(counters).then_some(Held { guard: self })
    }
}

/// Scope during which the EC mutex is owned.
pub struct Held<'a, L: NamedLock> {
    guard: &'a mut EcMutexGuard<L>,
}

impl<L: NamedLock> Drop for Held<'_, L> {
    fn drop(&mut self) {
        self.guard.release();
    }
}

#[cfg(windows)]
pub use self::windows::SystemMutex;

#[cfg(windows)]
mod windows {
    use super::{NamedLock, WaitOutcome};
    use crate::comms::ioctl::wide;
    use crate::constants::{EC_MUTEX_GLOBAL_NAME, EC_MUTEX_NAME};
    use std::{io, time::Duration};
    use windows_sys::Win32::{
        Foundation::{CloseHandle, HANDLE},
        System::Threading::{OpenMutexW, ReleaseMutex, WaitForSingleObject},
    };

    /*────────── values missing from the feature set we pull in ─────────*/
    const SYNCHRONIZE: u32 = 0x0010_0000;
    const WAIT_OBJECT_0: u32 = 0x0000_0000;
    const WAIT_ABANDONED: u32 = 0x0000_0080;
    const WAIT_TIMEOUT: u32 = 0x0000_0102;

    /// Handle to an existing named mutex; never created by us.
    pub struct SystemMutex {
        handle: HANDLE,
    }

    impl SystemMutex {
        /// Look up `Access_EC`, then `Global\Access_EC`.
        pub fn open() -> Option<Self> {
            [EC_MUTEX_NAME, EC_MUTEX_GLOBAL_NAME].into_iter().find_map(|name| {
                let w = wide(name);
                let handle = unsafe { OpenMutexW(SYNCHRONIZE, 0, w.as_ptr()) };
                if handle.is_null() {
                    log::debug!("OpenMutexW({}) failed: {}", name, io::Error::last_os_error());
                    None
                } else {
                    log::debug!("EC mutex opened as {}", name);
                    Some(Self { handle })
                }
            })
        }
    }

    impl NamedLock for SystemMutex {
        fn try_acquire(&mut self, timeout: Duration) -> WaitOutcome {
            let ms = timeout.as_millis().min(u32::MAX as u128) as u32;
            match unsafe { WaitForSingleObject(self.handle, ms) } {
                WAIT_OBJECT_0 => WaitOutcome::Acquired,
                WAIT_ABANDONED => WaitOutcome::Abandoned,
                WAIT_TIMEOUT => WaitOutcome::Timeout,
                _ => WaitOutcome::Failed(io::Error::last_os_error()),
            }
        }

        fn release(&mut self) {
            unsafe { ReleaseMutex(self.handle) };
        }
    }

    impl Drop for SystemMutex {
        fn drop(&mut self) {
            unsafe { CloseHandle(self.handle) };
        }
    }
}

/// Stand-in on hosts without named mutexes: the lock is simply never found.
#[cfg(not(windows))]
pub enum SystemMutex {}

#[cfg(not(windows))]
impl SystemMutex {
    pub fn open() -> Option<Self> {
        None
    }
}

#[cfg(not(windows))]
impl NamedLock for SystemMutex {
    fn try_acquire(&mut self, _timeout: Duration) -> WaitOutcome {
        match *self {}
    }
    fn release(&mut self) {
        match *self {}
    }
}
