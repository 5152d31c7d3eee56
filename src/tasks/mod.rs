//! Background Tasks Module
//!
//! Contains background tasks that run alongside the cache.
//!
//! # Tasks
//! - Reclaim loop: pages resident entries out once the cache crosses its trigger size

mod evictor;

pub use evictor::{spawn_evictor, EvictorHandle};
