//! Error types for the qid cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the qid cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key is neither resident nor in the durable store
    #[error("Qid not found: {0}")]
    NotFound(String),

    /// Object exceeds the largest cacheable size (carries the offending size)
    #[error("Qid too large: {0} bytes")]
    TooLarge(u64),

    /// Invalid request data or bounds
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Admission kept failing after repeated reclaim passes
    #[error("Cache full: {0}")]
    CacheFull(String),

    /// Durable store failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::CacheFull(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Persistence(_) | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Persistence(err.to_string())
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Persistence(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the qid cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CacheError::NotFound("1".into()), StatusCode::NOT_FOUND),
            (CacheError::TooLarge(151), StatusCode::PAYLOAD_TOO_LARGE),
            (CacheError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (CacheError::CacheFull("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (CacheError::Persistence("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_too_large_message_carries_size() {
        assert_eq!(CacheError::TooLarge(151).to_string(), "Qid too large: 151 bytes");
    }
}
