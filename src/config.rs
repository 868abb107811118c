//! # Cache Configuration
//!
//! Startup configuration for the cache subsystem: the global enable switch,
//! per-concept TTLs, backend selection, and the operation deadline.
//!
//! The configuration is read once at process start into an immutable
//! snapshot and passed explicitly into the service and coordinator. Changing
//! TTLs requires a restart; there is no hot reload.

use crate::error::{CacheError, CacheResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Global kill switch. When false every cache operation is a no-op
    /// pass-through and callers compute fresh values on every request.
    pub enabled: bool,

    /// Per-concept TTLs
    pub ttl: TtlConfig,

    /// Backing store selection
    pub backend: BackendConfig,

    /// Deadline for a single backend operation. A timed-out get is a miss;
    /// a timed-out set or remove is a silent no-op.
    pub operation_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: TtlConfig::default(),
            backend: BackendConfig::default(),
            operation_timeout: Duration::from_secs(1),
        }
    }
}

/// TTL per cache concept, in minutes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtlConfig {
    /// All active theatres. Rarely changes.
    pub theatres_ttl_minutes: u64,

    /// All active shows.
    pub all_shows_ttl_minutes: u64,

    /// Upcoming shows within a day window.
    pub upcoming_shows_ttl_minutes: u64,

    /// Most viewed shows.
    pub trending_shows_ttl_minutes: u64,

    /// Single show detail with reviews.
    pub show_detail_ttl_minutes: u64,

    /// Show search results.
    pub search_results_ttl_minutes: u64,

    /// Filtered show listings.
    pub filtered_shows_ttl_minutes: u64,

    /// Approved reviews for a show.
    pub reviews_ttl_minutes: u64,

    /// User favorites.
    pub user_favorites_ttl_minutes: u64,
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            theatres_ttl_minutes: 1440,
            all_shows_ttl_minutes: 15,
            upcoming_shows_ttl_minutes: 30,
            trending_shows_ttl_minutes: 60,
            show_detail_ttl_minutes: 10,
            search_results_ttl_minutes: 5,
            filtered_shows_ttl_minutes: 10,
            reviews_ttl_minutes: 30,
            user_favorites_ttl_minutes: 5,
        }
    }
}

/// Backing store selection, chosen once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// In-process map with manual TTL sweep
    Memory(MemoryBackendConfig),

    /// Networked Redis store
    Redis(RedisBackendConfig),
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Memory(MemoryBackendConfig::default())
    }
}

/// In-memory backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryBackendConfig {
    /// Maximum number of entries before writes are refused by the store
    pub max_entries: usize,

    /// How often the background sweep removes expired entries
    pub sweep_interval: Duration,
}

impl Default for MemoryBackendConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            sweep_interval: Duration::from_secs(60),
        }
    }
}

/// Redis backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisBackendConfig {
    /// Redis connection URL
    pub url: String,

    /// Prefix applied to every key written to Redis
    pub key_prefix: String,

    /// Connection establishment timeout
    pub connection_timeout: Duration,
}

impl Default for RedisBackendConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            key_prefix: "theatre:cache:".to_string(),
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl CacheConfig {
    /// Load configuration from a JSON file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> CacheResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CacheError::configuration(format!("Failed to read config file: {}", e)))?;

        let mut config: CacheConfig = serde_json::from_str(&content)
            .map_err(|e| CacheError::configuration(format!("Failed to parse config: {}", e)))?;

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    ///
    /// Variables follow the pattern `THEATRE_CACHE_<FIELD>`, for example
    /// `THEATRE_CACHE_ENABLED=false`.
    pub fn apply_env_overrides(&mut self) -> CacheResult<()> {
        use std::env;

        if let Ok(enabled) = env::var("THEATRE_CACHE_ENABLED") {
            self.enabled = enabled.parse().map_err(|e| {
                CacheError::configuration(format!("Invalid THEATRE_CACHE_ENABLED: {}", e))
            })?;
        }

        if let Ok(backend) = env::var("THEATRE_CACHE_BACKEND") {
            self.backend = match backend.as_str() {
                "memory" => BackendConfig::Memory(MemoryBackendConfig::default()),
                "redis" => BackendConfig::Redis(RedisBackendConfig::default()),
                other => {
                    return Err(CacheError::configuration(format!(
                        "Invalid THEATRE_CACHE_BACKEND: {} (expected 'memory' or 'redis')",
                        other
                    )))
                }
            };
        }

        if let Ok(url) = env::var("THEATRE_CACHE_REDIS_URL") {
            if let BackendConfig::Redis(redis) = &mut self.backend {
                redis.url = url;
            }
        }

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> CacheResult<()> {
        if self.operation_timeout.is_zero() {
            return Err(CacheError::configuration(
                "operation_timeout must be greater than zero",
            ));
        }

        let ttls = [
            ("theatres_ttl_minutes", self.ttl.theatres_ttl_minutes),
            ("all_shows_ttl_minutes", self.ttl.all_shows_ttl_minutes),
            ("upcoming_shows_ttl_minutes", self.ttl.upcoming_shows_ttl_minutes),
            ("trending_shows_ttl_minutes", self.ttl.trending_shows_ttl_minutes),
            ("show_detail_ttl_minutes", self.ttl.show_detail_ttl_minutes),
            ("search_results_ttl_minutes", self.ttl.search_results_ttl_minutes),
            ("filtered_shows_ttl_minutes", self.ttl.filtered_shows_ttl_minutes),
            ("reviews_ttl_minutes", self.ttl.reviews_ttl_minutes),
            ("user_favorites_ttl_minutes", self.ttl.user_favorites_ttl_minutes),
        ];

        for (name, minutes) in ttls {
            if minutes == 0 {
                return Err(CacheError::configuration(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }

        if let BackendConfig::Memory(memory) = &self.backend {
            if memory.max_entries == 0 {
                return Err(CacheError::configuration(
                    "max_entries must be greater than zero",
                ));
            }
            // A zero-period interval panics, which would kill the sweep task.
            if memory.sweep_interval.is_zero() {
                return Err(CacheError::configuration(
                    "sweep_interval must be greater than zero",
                ));
            }
        }

        Ok(())
    }
}
