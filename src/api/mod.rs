//! API Module
//!
//! Thin HTTP adapter exposing the qid cache.
//!
//! # Endpoints
//! - `POST /qid` - Store a search-parameter object
//! - `GET /qid/:key` - Retrieve a stored object by qid
//! - `GET /qid?query=...` - Resolve a `qid:` token inside query text
//! - `GET /stats` - Get cache statistics
//! - `PUT /bounds` - Update cache bounds
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
