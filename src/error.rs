//! # Cache Error Types
//!
//! Error taxonomy for the cache subsystem. Store and serialization failures
//! are contained at the [`CacheService`](crate::service::CacheService)
//! boundary and degrade to misses or no-ops; catalog errors are programmer
//! errors and surface as hard failures.

use thiserror::Error;

/// Cache operation result
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-specific error types
#[derive(Debug, Error)]
pub enum CacheError {
    /// Backing store failure (connection refused, store-side error, ...)
    #[error("Cache backend error: {message}")]
    Backend { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Operation exceeded the configured deadline
    #[error("Cache operation timeout")]
    Timeout,

    /// A concept name that is not registered in the key catalog
    #[error("Unknown cache concept: {name}")]
    UnknownConcept { name: String },

    /// Template expansion called with the wrong number of parameters
    #[error("Key expansion for pattern '{pattern}' expected {expected} parameter(s), got {got}")]
    KeyExpansion {
        pattern: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Cache configuration error: {message}")]
    Configuration { message: String },
}

impl CacheError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
