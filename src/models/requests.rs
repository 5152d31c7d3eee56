//! Request DTOs for the qid API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

use crate::cache::QueryPayload;

/// Request body for saving a qid (POST /qid)
///
/// The payload fields are flattened into the body; `max_age` is the
/// requested lifetime in milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveRequest {
    #[serde(flatten)]
    pub payload: QueryPayload,
    /// Optional lifetime in milliseconds
    #[serde(default)]
    pub max_age: Option<u64>,
}

impl SaveRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.payload.q.trim().is_empty() {
            return Some("q cannot be empty".to_string());
        }
        if let Some([min_lon, min_lat, max_lon, max_lat]) = self.payload.bbox {
            if min_lon > max_lon || min_lat > max_lat {
                return Some("bbox must be [min_lon, min_lat, max_lon, max_lat]".to_string());
            }
        }
        None
    }
}

/// Query string for resolving a qid token (GET /qid?query=...)
#[derive(Debug, Clone, Deserialize)]
pub struct LookupQuery {
    pub query: String,
}

/// Request body for changing bounds (PUT /bounds). Omitted fields keep
/// their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoundsRequest {
    #[serde(default)]
    pub max_cache_size: Option<u64>,
    #[serde(default)]
    pub min_cache_size: Option<u64>,
    #[serde(default)]
    pub largest_cacheable_size: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_request_deserialize() {
        let json = r#"{"q": "taxon_name:Acacia", "fqs": ["state:NSW"]}"#;
        let req: SaveRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.payload.q, "taxon_name:Acacia");
        assert_eq!(req.payload.fqs, vec!["state:NSW".to_string()]);
        assert!(req.max_age.is_none());
    }

    #[test]
    fn test_save_request_with_max_age_and_bbox() {
        let json = r#"{"q": "*:*", "bbox": [110.0, -45.0, 155.0, -10.0], "max_age": 60000}"#;
        let req: SaveRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.max_age, Some(60_000));
        assert_eq!(req.payload.bbox, Some([110.0, -45.0, 155.0, -10.0]));
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_validate_empty_q() {
        let req = SaveRequest {
            payload: QueryPayload::new("  "),
            max_age: None,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_inverted_bbox() {
        let req = SaveRequest {
            payload: QueryPayload {
                bbox: Some([155.0, -45.0, 110.0, -10.0]),
                ..QueryPayload::new("*:*")
            },
            max_age: None,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_bounds_request_partial() {
        let req: BoundsRequest = serde_json::from_str(r#"{"min_cache_size": 10}"#).unwrap();
        assert_eq!(req.min_cache_size, Some(10));
        assert!(req.max_cache_size.is_none());
        assert!(req.largest_cacheable_size.is_none());
    }
}
