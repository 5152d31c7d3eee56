//! API Routes
//!
//! Configures the Axum router with all qid endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    bounds_handler, get_handler, health_handler, lookup_handler, save_handler, stats_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /qid` - Store a search-parameter object, returns its qid
/// - `GET /qid/:key` - Retrieve a stored object
/// - `GET /qid?query=...` - Retrieve the object referenced by a `qid:` token
/// - `GET /stats` - Cache statistics
/// - `PUT /bounds` - Update cache bounds
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/qid", post(save_handler).get(lookup_handler))
        .route("/qid/:key", get(get_handler))
        .route("/stats", get(stats_handler))
        .route("/bounds", put(bounds_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
