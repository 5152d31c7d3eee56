//! API Handlers
//!
//! HTTP request handlers for each qid endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::cache::{CacheBounds, QidCache};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    BoundsRequest, BoundsResponse, HealthResponse, LookupQuery, QidResponse, SaveRequest,
    SaveResponse, StatsResponse,
};
use crate::store::PersistenceGateway;

/// Application state shared across all handlers.
///
/// `QidCache` is internally synchronized, so no outer lock is needed.
#[derive(Clone, Debug)]
pub struct AppState {
    pub cache: QidCache,
}

impl AppState {
    /// Creates a new AppState with the given cache.
    pub fn new(cache: QidCache) -> Self {
        Self { cache }
    }

    /// Creates a new AppState from configuration and a durable store.
    pub fn from_config(config: &Config, gateway: Arc<dyn PersistenceGateway>) -> Result<Self> {
        Ok(Self::new(QidCache::from_config(config, gateway)?))
    }
}

/// Handler for POST /qid
///
/// Stores a search-parameter object and returns its qid.
pub async fn save_handler(
    State(state): State<AppState>,
    Json(req): Json<SaveRequest>,
) -> Result<Json<SaveResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let qid = state.cache.put(req.payload, req.max_age).await?;
    Ok(Json(SaveResponse::new(qid)))
}

/// Handler for GET /qid/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<QidResponse>> {
    let entry = state.cache.get(&key).await?;
    Ok(Json(QidResponse::from(entry.as_ref())))
}

/// Handler for GET /qid?query=...
///
/// Resolves the first `qid:<value>` token found in the query text.
pub async fn lookup_handler(
    State(state): State<AppState>,
    Query(lookup): Query<LookupQuery>,
) -> Result<Json<QidResponse>> {
    match state.cache.get_from_query(&lookup.query).await? {
        Some(entry) => Ok(Json(QidResponse::from(entry.as_ref()))),
        None => Err(CacheError::InvalidRequest(
            "query does not contain a qid: token".to_string(),
        )),
    }
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats()))
}

/// Handler for PUT /bounds
///
/// Updates any of the three cache bounds; the trigger size follows.
pub async fn bounds_handler(
    State(state): State<AppState>,
    Json(req): Json<BoundsRequest>,
) -> Result<Json<BoundsResponse>> {
    let current = state.cache.bounds();
    let bounds = CacheBounds {
        max_cache_size: req.max_cache_size.unwrap_or(current.max_cache_size),
        min_cache_size: req.min_cache_size.unwrap_or(current.min_cache_size),
        largest_cacheable_size: req
            .largest_cacheable_size
            .unwrap_or(current.largest_cacheable_size),
    };

    state.cache.replace_bounds(bounds)?;
    Ok(Json(BoundsResponse::from(state.cache.bounds())))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
