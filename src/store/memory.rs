//! Map-backed persistence gateway.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::PersistenceGateway;
use crate::cache::{current_timestamp_ms, QueryPayload};
use crate::error::Result;

/// Keeps payloads in a process-local map.
///
/// Keys are decimal numbers seeded from the clock at construction and
/// incremented on every write.
#[derive(Debug)]
pub struct InMemoryGateway {
    rows: RwLock<HashMap<String, QueryPayload>>,
    next_key: AtomicU64,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            next_key: AtomicU64::new(current_timestamp_ms()),
        }
    }

    /// Number of stored payloads.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn put(&self, payload: &QueryPayload) -> Result<String> {
        let key = self.next_key.fetch_add(1, Ordering::Relaxed).to_string();
        self.rows.write().insert(key.clone(), payload.clone());
        Ok(key)
    }

    async fn get(&self, key: &str) -> Result<Option<QueryPayload>> {
        Ok(self.rows.read().get(key).cloned())
    }
}
