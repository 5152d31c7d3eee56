//! Cache Statistics Module
//!
//! Tracks lookups, evictions and reclaim passes with lock-free counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::cache::CacheBounds;

// == Cache Stats ==
/// Snapshot of cache counters and sizing, as reported to callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from memory
    pub memory_hits: u64,
    /// Lookups answered from the durable store
    pub durable_hits: u64,
    /// Lookups found nowhere
    pub misses: u64,
    /// Entries paged out of memory
    pub evictions: u64,
    /// Reclaim passes that ran to completion
    pub reclaim_passes: u64,
    /// Reclaim passes that failed
    pub failed_reclaims: u64,
    /// Durable writes that failed during put
    pub persist_failures: u64,
    /// Puts refused for exceeding the largest cacheable size
    pub rejected_puts: u64,
    /// Bytes currently resident
    pub resident_bytes: u64,
    /// Entries currently resident
    pub resident_entries: usize,
    /// Current bounds
    pub max_cache_size: u64,
    pub min_cache_size: u64,
    pub largest_cacheable_size: u64,
    pub trigger_size: u64,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the hit rate over both tiers.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.memory_hits + self.durable_hits;
        let total = hits + self.misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

// == Stats Recorder ==
/// Shared counters updated from put, get and the reclaim loop.
#[derive(Debug, Default)]
pub struct StatsRecorder {
    memory_hits: AtomicU64,
    durable_hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    reclaim_passes: AtomicU64,
    failed_reclaims: AtomicU64,
    persist_failures: AtomicU64,
    rejected_puts: AtomicU64,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_memory_hit(&self) {
        self.memory_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_durable_hit(&self) {
        self.durable_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_evictions(&self, count: u64) {
        self.evictions.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_reclaim_pass(&self) {
        self.reclaim_passes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed_reclaim(&self) {
        self.failed_reclaims.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persist_failure(&self) {
        self.persist_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_put(&self) {
        self.rejected_puts.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Combines the counters with current sizing into a report.
    pub fn snapshot(
        &self,
        resident_bytes: u64,
        resident_entries: usize,
        bounds: CacheBounds,
    ) -> CacheStats {
        CacheStats {
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            durable_hits: self.durable_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            reclaim_passes: self.reclaim_passes.load(Ordering::Relaxed),
            failed_reclaims: self.failed_reclaims.load(Ordering::Relaxed),
            persist_failures: self.persist_failures.load(Ordering::Relaxed),
            rejected_puts: self.rejected_puts.load(Ordering::Relaxed),
            resident_bytes,
            resident_entries,
            max_cache_size: bounds.max_cache_size,
            min_cache_size: bounds.min_cache_size,
            largest_cacheable_size: bounds.largest_cacheable_size,
            trigger_size: bounds.trigger_size(),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> CacheBounds {
        CacheBounds {
            max_cache_size: 200,
            min_cache_size: 100,
            largest_cacheable_size: 150,
        }
    }

    #[test]
    fn test_stats_new() {
        let stats = StatsRecorder::new().snapshot(0, 0, bounds());
        assert_eq!(stats.memory_hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.trigger_size, 150);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = StatsRecorder::new().snapshot(0, 0, bounds());
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_counts_both_tiers() {
        let recorder = StatsRecorder::new();
        recorder.record_memory_hit();
        recorder.record_durable_hit();
        recorder.record_miss();
        recorder.record_miss();

        let stats = recorder.snapshot(0, 0, bounds());
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_record_evictions_and_passes() {
        let recorder = StatsRecorder::new();
        recorder.record_evictions(3);
        recorder.record_evictions(2);
        recorder.record_reclaim_pass();
        recorder.record_failed_reclaim();

        let stats = recorder.snapshot(80, 2, bounds());
        assert_eq!(stats.evictions, 5);
        assert_eq!(stats.reclaim_passes, 1);
        assert_eq!(stats.failed_reclaims, 1);
        assert_eq!(stats.resident_bytes, 80);
        assert_eq!(stats.resident_entries, 2);
    }
}
