//! Cache Entry Module
//!
//! Defines the cached search-parameter object and its size estimate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Bytes charged for each bounding box coordinate and for the max-age field
const NUMERIC_FIELD_BYTES: u64 = 8;

// == Query Payload ==
/// The search-parameter object a qid stands for.
///
/// The cache never interprets these fields; they are carried through to the
/// durable store and back to callers unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryPayload {
    /// Raw query text
    pub q: String,
    /// Human readable form of the query
    #[serde(default)]
    pub display_q: String,
    /// Geometry in WKT
    #[serde(default)]
    pub wkt: Option<String>,
    /// `[min_lon, min_lat, max_lon, max_lat]`
    #[serde(default)]
    pub bbox: Option<[f64; 4]>,
    /// Filter queries
    #[serde(default)]
    pub fqs: Vec<String>,
    /// Requested lifetime in milliseconds, None = no expiry requested
    #[serde(default)]
    pub max_age_ms: Option<u64>,
    /// Name of the application that created the qid
    #[serde(default)]
    pub source: Option<String>,
}

impl QueryPayload {
    /// Creates a payload holding only a query string.
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            ..Self::default()
        }
    }

    // == Size Estimate ==
    /// Approximate in-memory footprint in bytes.
    ///
    /// String fields count their UTF-8 length, each bbox coordinate and the
    /// max-age field count 8 bytes.
    pub fn estimated_size(&self) -> u64 {
        let strings = self.q.len()
            + self.display_q.len()
            + self.wkt.as_ref().map_or(0, String::len)
            + self.source.as_ref().map_or(0, String::len)
            + self.fqs.iter().map(String::len).sum::<usize>();
        let bbox = if self.bbox.is_some() { 4 * NUMERIC_FIELD_BYTES } else { 0 };

        strings as u64 + bbox + NUMERIC_FIELD_BYTES
    }
}

// == Cache Entry ==
/// A cached payload with its key, fixed size and last access stamp.
#[derive(Debug)]
pub struct CacheEntry {
    key: String,
    payload: QueryPayload,
    size_bytes: u64,
    last_access: AtomicU64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry, sizing the payload once and stamping it as accessed now.
    pub fn new(key: impl Into<String>, payload: QueryPayload) -> Self {
        let size_bytes = payload.estimated_size();
        Self {
            key: key.into(),
            payload,
            size_bytes,
            last_access: AtomicU64::new(next_access_stamp()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn payload(&self) -> &QueryPayload {
        &self.payload
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn last_access(&self) -> u64 {
        self.last_access.load(Ordering::Relaxed)
    }

    // == Touch ==
    /// Records an access. Races between concurrent touches only reorder
    /// eviction candidates.
    pub fn touch(&self) {
        self.last_access.store(next_access_stamp(), Ordering::Relaxed);
    }
}

impl Clone for CacheEntry {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            payload: self.payload.clone(),
            size_bytes: self.size_bytes,
            last_access: AtomicU64::new(self.last_access()),
        }
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Returns a strictly increasing access stamp in Unix microseconds.
///
/// Two calls never return the same value, so access order is total even
/// when several entries are touched within one clock tick.
pub fn next_access_stamp() -> u64 {
    static LAST_STAMP: AtomicU64 = AtomicU64::new(0);

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or_default();

    let mut prev = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let next = now.max(prev + 1);
        match LAST_STAMP.compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => prev = actual,
        }
    }
}
