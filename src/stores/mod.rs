//! # Cache Store Backends
//!
//! Pluggable backing stores behind the [`CacheBackend`] trait: an
//! in-process map with a manual TTL sweep, and a networked Redis client.
//! Both are selected at startup via [`BackendConfig`] and both are held to
//! the same failure-containment behavior at the service layer above.

pub mod memory;
pub mod redis_store;

pub use memory::InMemoryBackend;
pub use redis_store::RedisBackend;

use crate::config::BackendConfig;
use crate::error::CacheResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Raw cache entry as held by a backend.
///
/// Owned exclusively by the store layer; nothing above the service boundary
/// inspects raw entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Serialized payload
    pub value: Vec<u8>,

    /// Creation time, Unix milliseconds
    pub created_at: u64,

    /// Absolute expiry, Unix milliseconds. `None` means no expiry.
    pub expires_at: Option<u64>,
}

pub(crate) fn unix_millis_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

impl CacheEntry {
    /// Create a new entry with expiry relative to now
    pub fn new(value: Vec<u8>, ttl: Option<Duration>) -> Self {
        let now = unix_millis_now();
        Self {
            value,
            created_at: now,
            expires_at: ttl.map(|ttl| now + ttl.as_millis() as u64),
        }
    }

    /// Whether the entry has passed its expiry
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => unix_millis_now() > expires_at,
            None => false,
        }
    }
}

/// Trait for cache store implementations
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a raw value. Expired entries are treated as absent.
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Write a raw value with an optional relative TTL
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> CacheResult<()>;

    /// Delete a key. Returns whether a live entry was actually removed.
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Drop every entry
    async fn clear(&self) -> CacheResult<()>;

    /// Point-in-time backend statistics
    async fn stats(&self) -> CacheResult<BackendStats>;

    /// Verify the backend can serve a round trip
    async fn health_check(&self) -> CacheResult<bool>;
}

/// Backend-level statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendStats {
    /// Number of live entries
    pub entries: usize,

    /// Entries removed by the expiry sweep
    pub expired_sweeps: u64,
}

/// Build the backend selected by configuration
pub async fn build_backend(config: &BackendConfig) -> CacheResult<Arc<dyn CacheBackend>> {
    match config {
        BackendConfig::Memory(memory) => Ok(Arc::new(InMemoryBackend::new(memory.clone()))),
        BackendConfig::Redis(redis) => Ok(Arc::new(RedisBackend::new(redis.clone()).await?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_without_ttl_never_expires() {
        let entry = CacheEntry::new(b"payload".to_vec(), None);
        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired());
    }

    #[test]
    fn entry_expiry_is_relative_to_creation() {
        let entry = CacheEntry::new(b"payload".to_vec(), Some(Duration::from_secs(60)));
        let expires_at = entry.expires_at.unwrap();
        assert!(expires_at >= entry.created_at + 60_000);
        assert!(!entry.is_expired());
    }
}
