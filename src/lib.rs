//! Qid Cache - size-bounded cache of search-parameter objects
//!
//! Stores large query descriptors behind short qids. Hot entries stay in
//! memory; a background reclaimer pages them out once the cache crosses its
//! trigger size, and misses fall back to a durable store.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use cache::QidCache;
pub use config::Config;
pub use tasks::spawn_evictor;
