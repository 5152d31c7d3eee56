//! Durable Store Module
//!
//! The persistence gateway the cache writes through to and falls back on.
//!
//! # Implementations
//! - `InMemoryGateway` - map-backed, for tests and single-process runs
//! - `JsonFileGateway` - one JSON document per qid under a directory

mod file;
mod memory;

use async_trait::async_trait;

use crate::cache::QueryPayload;
use crate::error::Result;

pub use file::JsonFileGateway;
pub use memory::InMemoryGateway;

// == Persistence Gateway ==
/// Durable key-value store for search-parameter objects.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Stores a payload and returns the key assigned to it.
    async fn put(&self, payload: &QueryPayload) -> Result<String>;

    /// Loads a payload, `Ok(None)` when the key is unknown.
    async fn get(&self, key: &str) -> Result<Option<QueryPayload>>;
}
