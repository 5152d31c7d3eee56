//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::path::PathBuf;

use crate::cache::CacheBounds;
use crate::error::Result;

/// Default hard ceiling on resident bytes (100 MiB)
pub const DEFAULT_MAX_CACHE_SIZE: u64 = 104_857_600;
/// Default low-water mark after a reclaim pass (50 MiB)
pub const DEFAULT_MIN_CACHE_SIZE: u64 = 52_428_800;
/// Default per-object admission limit (5 MiB)
pub const DEFAULT_LARGEST_CACHEABLE_SIZE: u64 = 5_242_880;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Hard ceiling on resident bytes
    pub max_cache_size: u64,
    /// Resident bytes a reclaim pass shrinks the cache down to
    pub min_cache_size: u64,
    /// Largest single object that will be accepted
    pub largest_cacheable_size: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Directory for the JSON file store, in-memory store when unset
    pub store_dir: Option<PathBuf>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `QID_CACHE_SIZE_MAX` - Hard ceiling in bytes (default: 104857600)
    /// - `QID_CACHE_SIZE_MIN` - Low-water mark in bytes (default: 52428800)
    /// - `QID_CACHE_LARGEST_CACHEABLE_SIZE` - Per-object limit in bytes (default: 5242880)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `QID_STORE_DIR` - Durable store directory (default: unset)
    pub fn from_env() -> Self {
        Self {
            max_cache_size: parse_var("QID_CACHE_SIZE_MAX").unwrap_or(DEFAULT_MAX_CACHE_SIZE),
            min_cache_size: parse_var("QID_CACHE_SIZE_MIN").unwrap_or(DEFAULT_MIN_CACHE_SIZE),
            largest_cacheable_size: parse_var("QID_CACHE_LARGEST_CACHEABLE_SIZE")
                .unwrap_or(DEFAULT_LARGEST_CACHEABLE_SIZE),
            server_port: parse_var("SERVER_PORT").unwrap_or(3000),
            store_dir: env::var("QID_STORE_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    /// The three cache bounds carried by this configuration.
    pub fn bounds(&self) -> CacheBounds {
        CacheBounds {
            max_cache_size: self.max_cache_size,
            min_cache_size: self.min_cache_size,
            largest_cacheable_size: self.largest_cacheable_size,
        }
    }

    /// Rejects bound combinations the cache cannot honor.
    pub fn validate(&self) -> Result<()> {
        self.bounds().validate()
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            min_cache_size: DEFAULT_MIN_CACHE_SIZE,
            largest_cacheable_size: DEFAULT_LARGEST_CACHEABLE_SIZE,
            server_port: 3000,
            store_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_cache_size, 104_857_600);
        assert_eq!(config.min_cache_size, 52_428_800);
        assert_eq!(config.largest_cacheable_size, 5_242_880);
        assert_eq!(config.server_port, 3000);
        assert!(config.store_dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("QID_CACHE_SIZE_MAX");
        env::remove_var("QID_CACHE_SIZE_MIN");
        env::remove_var("QID_CACHE_LARGEST_CACHEABLE_SIZE");
        env::remove_var("SERVER_PORT");
        env::remove_var("QID_STORE_DIR");

        let config = Config::from_env();
        assert_eq!(config.max_cache_size, DEFAULT_MAX_CACHE_SIZE);
        assert_eq!(config.min_cache_size, DEFAULT_MIN_CACHE_SIZE);
        assert_eq!(config.largest_cacheable_size, DEFAULT_LARGEST_CACHEABLE_SIZE);
        assert_eq!(config.server_port, 3000);
        assert!(config.store_dir.is_none());
    }

    #[test]
    fn test_validate_rejects_largest_above_max() {
        let config = Config {
            max_cache_size: 200,
            min_cache_size: 100,
            largest_cacheable_size: 201,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
