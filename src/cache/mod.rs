//! Cache Module
//!
//! Size-bounded in-memory cache of search-parameter objects, paged out to a
//! durable store by a background reclaimer.

mod accountant;
mod entry;
mod facade;
mod memory;
mod qid;
mod reclaim;
mod stats;


// Re-export public types
pub use accountant::{Admission, CacheBounds, SizeAccountant};
pub use entry::{current_timestamp_ms, next_access_stamp, CacheEntry, QueryPayload};
pub use facade::{QidCache, MAX_ADMISSION_ATTEMPTS};
pub use memory::{EntrySnapshot, MemoryStore};
pub use qid::{extract_key_from_query, QID_PREFIX};
pub use reclaim::{select_evictions, Reclaim, ReclaimMode, ReclaimReport, ReclaimSignal};
pub use stats::{CacheStats, StatsRecorder};
