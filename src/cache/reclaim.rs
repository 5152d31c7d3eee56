//! Reclaim Pass Module
//!
//! One eviction pass over the resident entries, the trait the background
//! loop drives it through, and the signal that wakes that loop.

use std::sync::Arc;

use tokio::sync::Notify;

use crate::error::Result;

// == Reclaim Mode ==
/// Why a pass is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReclaimMode {
    /// Woken by the soft trigger; skipped when resident size is below it.
    Triggered,
    /// Forced inline by a put of `needed` bytes that hit the hard ceiling.
    /// Always scans, and keeps room for `needed` under the ceiling.
    Forced { needed: u64 },
}

impl ReclaimMode {
    /// Bytes the pass may keep resident.
    pub fn retention_budget(&self, min_cache_size: u64, max_cache_size: u64) -> u64 {
        match self {
            ReclaimMode::Triggered => min_cache_size,
            ReclaimMode::Forced { needed } => {
                min_cache_size.min(max_cache_size.saturating_sub(*needed))
            }
        }
    }
}

// == Reclaim Report ==
/// Result of one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReclaimReport {
    /// False when the pass returned early below the trigger size
    pub ran: bool,
    pub evicted_entries: usize,
    pub evicted_bytes: u64,
    /// Resident bytes once the pass finished
    pub resident_bytes: u64,
}

impl ReclaimReport {
    pub fn skipped(resident_bytes: u64) -> Self {
        Self {
            resident_bytes,
            ..Self::default()
        }
    }
}

// == Reclaim Trait ==
/// Something the evictor loop can ask to free memory.
pub trait Reclaim: Send + Sync {
    fn reclaim(&self, mode: ReclaimMode) -> Result<ReclaimReport>;
}

// == Reclaim Signal ==
/// Wake-up for the background reclaim loop.
///
/// Holds at most one pending wake: a signal sent while the loop is busy is
/// kept for its next wait, and repeated signals collapse into one.
#[derive(Debug, Clone, Default)]
pub struct ReclaimSignal {
    notify: Arc<Notify>,
}

impl ReclaimSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wakes the loop without blocking.
    pub fn notify(&self) {
        self.notify.notify_one();
    }

    /// Waits for the next wake, consuming it.
    pub async fn notified(&self) {
        self.notify.notified().await;
    }
}

// == Retention Walk ==
/// Walks `(key, size)` pairs oldest first and splits them into kept and
/// evicted keys.
///
/// An entry is kept while the running kept total plus its size stays within
/// `budget`; every other entry is evicted. Because the walk starts at
/// the oldest entry, the oldest entries are the ones retained.
pub fn select_evictions<'a, I>(oldest_first: I, budget: u64) -> Vec<&'a str>
where
    I: IntoIterator<Item = (&'a str, u64)>,
{
    let mut kept: u64 = 0;
    let mut evicted = Vec::new();

    for (key, size) in oldest_first {
        if kept.saturating_add(size) > budget {
            evicted.push(key);
        } else {
            kept += size;
        }
    }

    evicted
}
