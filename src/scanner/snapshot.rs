//! Full-register scans and change detection between them.

use std::time::{Duration, Instant};

use bitmaps::Bitmap;

use crate::constants::REGISTER_COUNT;
use crate::protocol::{RegisterSource, RegisterValue};

/// All 256 registers sampled in one pass, plus how long the pass took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSnapshot {
    values: [RegisterValue; REGISTER_COUNT],
    elapsed: Duration,
}

impl ScanSnapshot {
    /// All-zero snapshot used before the first scan.
    pub fn baseline() -> Self {
        Self { values: [RegisterValue::Read(0); REGISTER_COUNT], elapsed: Duration::ZERO }
    }

    pub fn new(values: [RegisterValue; REGISTER_COUNT], elapsed: Duration) -> Self {
        Self { values, elapsed }
    }

    /// Snapshot of successfully read bytes.
    pub fn from_bytes(bytes: [u8; REGISTER_COUNT]) -> Self {
        Self { values: bytes.map(RegisterValue::Read), elapsed: Duration::ZERO }
    }

    pub fn get(&self, address: u8) -> RegisterValue {
        self.values[address as usize]
    }

    /// Register content with the failure sentinel substituted.
    pub fn byte(&self, address: u8) -> u8 {
        self.get(address).byte()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn failures(&self) -> usize {
        self.values.iter().filter(|v| !v.is_ok()).count()
    }
}

/// Read addresses 0..=255 in order. No parallelism: the device serves one
/// request at a time and the EC mutex serializes callers anyway.
pub fn scan_all<S: RegisterSource>(source: &mut S) -> ScanSnapshot {
    let start = Instant::now();
    let mut values = [RegisterValue::Failed; REGISTER_COUNT];
    for (address, slot) in (0..=u8::MAX).zip(values.iter_mut()) {
        *slot = source.read_register(address).value;
    }
    let snapshot = ScanSnapshot::new(values, start.elapsed());
    log::debug!(
        "scan finished in {:?} ({} failed registers)",
        snapshot.elapsed(),
        snapshot.failures()
    );
    snapshot
}

/// Addresses whose value differs between two snapshots.
#[derive(Debug, Clone)]
pub struct ChangeSet {
    bits: Bitmap<REGISTER_COUNT>,
}

impl ChangeSet {
    pub fn contains(&self, address: u8) -> bool {
        self.bits.get(address as usize)
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        std::iter::successors(self.bits.first_index(), move |&i| self.bits.next_index(i))
            .map(|i| i as u8)
    }
}

/// Compare sentinel-substituted bytes; a failed read that flips to a real
/// 0xFF is not a change.
pub fn diff(previous: &ScanSnapshot, current: &ScanSnapshot) -> ChangeSet {
    let mut bits = Bitmap::new();
    for address in 0..=u8::MAX {
        if previous.byte(address) != current.byte(address) {
            bits.set(address as usize, true);
        }
    }
    ChangeSet { bits }
}
