//! Qid Cache Facade
//!
//! Orchestrates put and get over the memory store, the size accountant, the
//! background reclaimer and the durable store.
//!
//! Puts write through to the durable store before the object is made
//! resident. A failed durable write is logged and the object is still served
//! from memory under a locally minted key; once evicted, such an object is
//! gone for good.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::cache::{
    current_timestamp_ms, extract_key_from_query, select_evictions, Admission, CacheBounds,
    CacheEntry, CacheStats, MemoryStore, QueryPayload, Reclaim, ReclaimMode, ReclaimReport,
    ReclaimSignal, SizeAccountant, StatsRecorder,
};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::store::PersistenceGateway;
use crate::tasks::{spawn_evictor, EvictorHandle};

/// Forced reclaim passes a single put may trigger before giving up
pub const MAX_ADMISSION_ATTEMPTS: usize = 16;

// == Cache Core ==
/// Resident state shared between the facade and the reclaim loop.
#[derive(Debug)]
struct CacheCore {
    memory: MemoryStore,
    accountant: SizeAccountant,
    stats: StatsRecorder,
    /// Serializes reclaim passes
    pass_lock: Mutex<()>,
}

impl CacheCore {
    fn run_pass(&self, mode: ReclaimMode) -> Result<ReclaimReport> {
        let _pass = self.pass_lock.lock();

        let trigger_size = self.accountant.refresh_trigger();
        let resident = self.accountant.resident_bytes();
        if mode == ReclaimMode::Triggered && resident < trigger_size {
            debug!(resident, trigger_size, "resident size below trigger, skipping pass");
            return Ok(ReclaimReport::skipped(resident));
        }

        let bounds = self.accountant.bounds();
        let budget = mode.retention_budget(bounds.min_cache_size, bounds.max_cache_size);

        let mut snapshot = self.memory.snapshot();
        snapshot.sort_by_key(|s| s.last_access);

        let doomed = select_evictions(
            snapshot.iter().map(|s| (s.key.as_str(), s.size_bytes)),
            budget,
        );

        let mut evicted_entries = 0;
        let mut evicted_bytes = 0;
        for key in doomed {
            // A concurrent put may have replaced the entry since the snapshot;
            // release whatever was actually removed.
            if let Some(entry) = self.memory.remove(key) {
                evicted_entries += 1;
                evicted_bytes += entry.size_bytes();
            }
        }

        self.stats.record_evictions(evicted_entries as u64);
        self.accountant.release(evicted_bytes)?;

        Ok(ReclaimReport {
            ran: true,
            evicted_entries,
            evicted_bytes,
            resident_bytes: self.accountant.resident_bytes(),
        })
    }
}

impl Reclaim for CacheCore {
    fn reclaim(&self, mode: ReclaimMode) -> Result<ReclaimReport> {
        match self.run_pass(mode) {
            Ok(report) => {
                if report.ran {
                    self.stats.record_reclaim_pass();
                    info!(
                        evicted = report.evicted_entries,
                        freed_bytes = report.evicted_bytes,
                        resident_bytes = report.resident_bytes,
                        "reclaim pass complete"
                    );
                }
                Ok(report)
            }
            Err(err) => {
                self.stats.record_failed_reclaim();
                Err(err)
            }
        }
    }
}

// == Qid Cache ==
/// Size-bounded cache of search-parameter objects with durable overflow.
///
/// Cloning is cheap; clones share the same resident state.
#[derive(Clone)]
pub struct QidCache {
    core: Arc<CacheCore>,
    gateway: Arc<dyn PersistenceGateway>,
    signal: ReclaimSignal,
    local_keys: Arc<AtomicU64>,
}

impl QidCache {
    // == Constructors ==
    /// Creates an empty cache. The background reclaimer is not started; see
    /// [`QidCache::spawn_evictor`].
    pub fn new(bounds: CacheBounds, gateway: Arc<dyn PersistenceGateway>) -> Result<Self> {
        Ok(Self {
            core: Arc::new(CacheCore {
                memory: MemoryStore::new(),
                accountant: SizeAccountant::new(bounds)?,
                stats: StatsRecorder::new(),
                pass_lock: Mutex::new(()),
            }),
            gateway,
            signal: ReclaimSignal::new(),
            local_keys: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Creates a cache with the bounds carried by `config`.
    pub fn from_config(config: &Config, gateway: Arc<dyn PersistenceGateway>) -> Result<Self> {
        Self::new(config.bounds(), gateway)
    }

    /// Starts the background reclaim loop for this cache.
    pub fn spawn_evictor(&self) -> EvictorHandle {
        spawn_evictor(self.core.clone(), self.signal.clone())
    }

    // == Put ==
    /// Stores a payload and returns the qid that refers to it.
    ///
    /// `max_age_ms`, when given, is recorded on the payload before it is
    /// sized and persisted.
    ///
    /// # Errors
    /// - `TooLarge` when the payload exceeds the largest cacheable size;
    ///   nothing is persisted or cached.
    /// - `CacheFull` when the object could not be admitted after
    ///   [`MAX_ADMISSION_ATTEMPTS`] forced reclaim passes.
    pub async fn put(&self, mut payload: QueryPayload, max_age_ms: Option<u64>) -> Result<String> {
        if max_age_ms.is_some() {
            payload.max_age_ms = max_age_ms;
        }

        let size = payload.estimated_size();
        let largest = self.core.accountant.bounds().largest_cacheable_size;
        if size > largest {
            self.core.stats.record_rejected_put();
            debug!(size, largest, "qid rejected, too large to cache");
            return Err(CacheError::TooLarge(size));
        }

        let key = match self.gateway.put(&payload).await {
            Ok(key) => key,
            Err(err) => {
                self.core.stats.record_persist_failure();
                let key = self.mint_local_key();
                error!(
                    error = %err,
                    key = %key,
                    "failed to save qid to durable store, serving from memory only"
                );
                key
            }
        };

        self.admit(Arc::new(CacheEntry::new(key.clone(), payload))).await?;
        Ok(key)
    }

    /// Reserves room for `entry` and makes it resident, reclaiming on the
    /// blocking pool whenever the hard ceiling is in the way.
    async fn admit(&self, entry: Arc<CacheEntry>) -> Result<()> {
        let size = entry.size_bytes();

        for attempt in 1..=MAX_ADMISSION_ATTEMPTS {
            match self.core.accountant.try_reserve(size) {
                Admission::Admitted { wake_evictor } => {
                    entry.touch();
                    if let Some(replaced) = self.core.memory.insert(Arc::clone(&entry)) {
                        if let Err(err) = self.core.accountant.release(replaced.size_bytes()) {
                            error!(
                                error = %err,
                                key = %replaced.key(),
                                "accounting mismatch replacing qid"
                            );
                        }
                    }
                    if wake_evictor {
                        self.signal.notify();
                    }
                    return Ok(());
                }
                Admission::MustEvictFirst => {
                    debug!(attempt, size, "hard ceiling reached, reclaiming inline");
                    let core = Arc::clone(&self.core);
                    let pass = tokio::task::spawn_blocking(move || {
                        core.reclaim(ReclaimMode::Forced { needed: size })
                    });
                    match pass.await {
                        Ok(Ok(_)) => {}
                        Ok(Err(err)) => warn!(error = %err, "inline reclaim pass failed"),
                        Err(err) => warn!(error = %err, "inline reclaim pass panicked"),
                    }
                }
            }
        }

        Err(CacheError::CacheFull(format!(
            "could not admit {} bytes after {} reclaim passes",
            size, MAX_ADMISSION_ATTEMPTS
        )))
    }

    fn mint_local_key(&self) -> String {
        let seq = self.local_keys.fetch_add(1, Ordering::Relaxed);
        format!("mem-{}-{}", current_timestamp_ms(), seq)
    }

    // == Get ==
    /// Looks a qid up in memory, then in the durable store.
    ///
    /// Entries loaded from the durable store are not made resident again;
    /// the returned entry carries a fresh access stamp.
    ///
    /// # Errors
    /// `NotFound` when the qid is in neither tier, or when the durable lookup
    /// itself fails.
    pub async fn get(&self, key: &str) -> Result<Arc<CacheEntry>> {
        if let Some(entry) = self.core.memory.get(key) {
            entry.touch();
            self.core.stats.record_memory_hit();
            return Ok(entry);
        }

        match self.gateway.get(key).await {
            Ok(Some(payload)) => {
                self.core.stats.record_durable_hit();
                Ok(Arc::new(CacheEntry::new(key, payload)))
            }
            Ok(None) => {
                self.core.stats.record_miss();
                Err(CacheError::NotFound(key.to_string()))
            }
            Err(err) => {
                self.core.stats.record_miss();
                error!(error = %err, key = %key, "failed to find qid");
                Err(CacheError::NotFound(key.to_string()))
            }
        }
    }

    /// Resolves the first `qid:<value>` token in `query`.
    ///
    /// Returns `Ok(None)` when the text holds no token.
    pub async fn get_from_query(&self, query: &str) -> Result<Option<Arc<CacheEntry>>> {
        match extract_key_from_query(query) {
            Some(key) => self.get(&key).await.map(Some),
            None => Ok(None),
        }
    }

    // == Reclaim ==
    /// Runs one reclaim pass on the calling thread.
    pub fn reclaim(&self, mode: ReclaimMode) -> Result<ReclaimReport> {
        self.core.reclaim(mode)
    }

    // == Bounds ==
    pub fn bounds(&self) -> CacheBounds {
        self.core.accountant.bounds()
    }

    pub fn max_cache_size(&self) -> u64 {
        self.bounds().max_cache_size
    }

    pub fn min_cache_size(&self) -> u64 {
        self.bounds().min_cache_size
    }

    pub fn largest_cacheable_size(&self) -> u64 {
        self.bounds().largest_cacheable_size
    }

    pub fn trigger_size(&self) -> u64 {
        self.core.accountant.trigger_size()
    }

    pub fn set_max_cache_size(&self, size: u64) -> Result<()> {
        self.core.accountant.set_max_cache_size(size)?;
        self.wake_if_over_trigger();
        Ok(())
    }

    pub fn set_min_cache_size(&self, size: u64) -> Result<()> {
        self.core.accountant.set_min_cache_size(size)?;
        self.wake_if_over_trigger();
        Ok(())
    }

    pub fn set_largest_cacheable_size(&self, size: u64) -> Result<()> {
        self.core.accountant.set_largest_cacheable_size(size)
    }

    pub fn set_bounds(&self, min_cache_size: u64, max_cache_size: u64) -> Result<()> {
        self.core.accountant.set_bounds(min_cache_size, max_cache_size)?;
        self.wake_if_over_trigger();
        Ok(())
    }

    /// Replaces all three bounds at once.
    pub fn replace_bounds(&self, bounds: CacheBounds) -> Result<()> {
        self.core.accountant.replace_bounds(bounds)?;
        self.wake_if_over_trigger();
        Ok(())
    }

    /// Shrunk bounds can leave the cache above its new trigger with no put
    /// coming to notice; hand that to the reclaim loop.
    fn wake_if_over_trigger(&self) {
        let resident = self.resident_bytes();
        let trigger_size = self.trigger_size();
        if resident > trigger_size {
            debug!(resident, trigger_size, "resident size above new trigger, waking reclaimer");
            self.signal.notify();
        }
    }

    // == Introspection ==
    /// Bytes currently accounted as resident.
    pub fn resident_bytes(&self) -> u64 {
        self.core.accountant.resident_bytes()
    }

    pub fn resident_entries(&self) -> usize {
        self.core.memory.len()
    }

    /// Sum of entry sizes actually present in memory.
    pub fn resident_entry_bytes(&self) -> u64 {
        self.core.memory.total_size()
    }

    pub fn is_resident(&self, key: &str) -> bool {
        self.core.memory.contains(key)
    }

    pub fn stats(&self) -> CacheStats {
        self.core
            .stats
            .snapshot(self.resident_bytes(), self.resident_entries(), self.bounds())
    }
}

impl std::fmt::Debug for QidCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QidCache")
            .field("bounds", &self.bounds())
            .field("resident_bytes", &self.resident_bytes())
            .field("resident_entries", &self.resident_entries())
            .finish()
    }
}
