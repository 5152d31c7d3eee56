//! Memory Store Module
//!
//! Concurrent key to entry map backing the resident half of the cache.

use std::sync::Arc;

use dashmap::DashMap;

use crate::cache::CacheEntry;

// == Entry Snapshot ==
/// Point-in-time copy of the fields an eviction scan needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySnapshot {
    pub key: String,
    pub size_bytes: u64,
    pub last_access: u64,
}

// == Memory Store ==
/// Sharded map of resident entries.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Arc<CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry under its own key, returning any entry it replaced.
    pub fn insert(&self, entry: Arc<CacheEntry>) -> Option<Arc<CacheEntry>> {
        self.entries.insert(entry.key().to_string(), entry)
    }

    pub fn get(&self, key: &str) -> Option<Arc<CacheEntry>> {
        self.entries.get(key).map(|e| Arc::clone(e.value()))
    }

    pub fn remove(&self, key: &str) -> Option<Arc<CacheEntry>> {
        self.entries.remove(key).map(|(_, entry)| entry)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    // == Snapshot ==
    /// Copies every resident entry's key, size and last access.
    ///
    /// The returned vector is detached from the map, so concurrent puts and
    /// gets do not disturb a scan over it.
    pub fn snapshot(&self) -> Vec<EntrySnapshot> {
        self.entries
            .iter()
            .map(|e| EntrySnapshot {
                key: e.key().clone(),
                size_bytes: e.value().size_bytes(),
                last_access: e.value().last_access(),
            })
            .collect()
    }

    /// Sum of `size_bytes` over resident entries.
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.value().size_bytes()).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::QueryPayload;

    fn entry(key: &str, q: &str) -> Arc<CacheEntry> {
        Arc::new(CacheEntry::new(key, QueryPayload::new(q)))
    }

    #[test]
    fn test_insert_get_remove() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        assert!(store.insert(entry("1", "a")).is_none());
        assert_eq!(store.get("1").unwrap().payload().q, "a");
        assert!(store.contains("1"));

        let removed = store.remove("1").unwrap();
        assert_eq!(removed.key(), "1");
        assert!(store.get("1").is_none());
        assert!(store.remove("1").is_none());
    }

    #[test]
    fn test_insert_replaces_same_key() {
        let store = MemoryStore::new();
        store.insert(entry("1", "a"));

        let replaced = store.insert(entry("1", "bb")).unwrap();
        assert_eq!(replaced.payload().q, "a");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let store = MemoryStore::new();
        store.insert(entry("1", "a"));
        store.insert(entry("2", "bb"));

        let snapshot = store.snapshot();
        store.remove("1");
        store.get("2").unwrap().touch();

        assert_eq!(snapshot.len(), 2);
        let two = snapshot.iter().find(|s| s.key == "2").unwrap();
        assert!(two.last_access < store.get("2").unwrap().last_access());
    }

    #[test]
    fn test_total_size() {
        let store = MemoryStore::new();
        store.insert(entry("1", "a"));
        store.insert(entry("2", "bb"));

        assert_eq!(store.total_size(), 9 + 10);
    }

    #[test]
    fn test_concurrent_inserts() {
        let store = Arc::new(MemoryStore::new());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        store.insert(entry(&format!("{}-{}", t, i), "q"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 800);
    }
}
