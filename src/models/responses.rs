//! Response DTOs for the qid API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{CacheBounds, CacheEntry, CacheStats, QueryPayload};

/// Response body for a saved qid (POST /qid)
#[derive(Debug, Clone, Serialize)]
pub struct SaveResponse {
    /// Key to reference the stored query by
    pub qid: String,
}

impl SaveResponse {
    pub fn new(qid: impl Into<String>) -> Self {
        Self { qid: qid.into() }
    }
}

/// Response body for a qid lookup (GET /qid/:key)
#[derive(Debug, Clone, Serialize)]
pub struct QidResponse {
    pub qid: String,
    #[serde(flatten)]
    pub payload: QueryPayload,
    /// Last access stamp (Unix microseconds)
    pub last_access: u64,
    /// Estimated size in bytes
    pub size: u64,
}

impl From<&CacheEntry> for QidResponse {
    fn from(entry: &CacheEntry) -> Self {
        Self {
            qid: entry.key().to_string(),
            payload: entry.payload().clone(),
            last_access: entry.last_access(),
            size: entry.size_bytes(),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate over memory and durable lookups
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        let hit_rate = stats.hit_rate();
        Self { stats, hit_rate }
    }
}

/// Response body for the bounds endpoint (PUT /bounds)
#[derive(Debug, Clone, Serialize)]
pub struct BoundsResponse {
    #[serde(flatten)]
    pub bounds: CacheBounds,
    pub trigger_size: u64,
}

impl From<CacheBounds> for BoundsResponse {
    fn from(bounds: CacheBounds) -> Self {
        Self {
            trigger_size: bounds.trigger_size(),
            bounds,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::StatsRecorder;

    #[test]
    fn test_qid_response_flattens_payload() {
        let entry = CacheEntry::new("17", QueryPayload::new("genus:Banksia"));
        let json = serde_json::to_value(QidResponse::from(&entry)).unwrap();

        assert_eq!(json["qid"], "17");
        assert_eq!(json["q"], "genus:Banksia");
        assert_eq!(json["size"], 21);
    }

    #[test]
    fn test_stats_response_includes_hit_rate() {
        let recorder = StatsRecorder::new();
        recorder.record_memory_hit();
        recorder.record_miss();
        let bounds = CacheBounds {
            max_cache_size: 200,
            min_cache_size: 100,
            largest_cacheable_size: 150,
        };

        let stats = recorder.snapshot(40, 1, bounds);
        let json = serde_json::to_value(StatsResponse::from(stats)).unwrap();
        assert_eq!(json["hit_rate"], 0.5);
        assert_eq!(json["resident_bytes"], 40);
        assert_eq!(json["trigger_size"], 150);
    }

    #[test]
    fn test_bounds_response_serialize() {
        let bounds = CacheBounds {
            max_cache_size: 400,
            min_cache_size: 200,
            largest_cacheable_size: 50,
        };
        let json = serde_json::to_value(BoundsResponse::from(bounds)).unwrap();
        assert_eq!(json["trigger_size"], 300);
        assert_eq!(json["largest_cacheable_size"], 50);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
