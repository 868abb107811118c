//! # In-Memory Cache Backend
//!
//! In-process store backed by a concurrent map. Expired entries are dropped
//! lazily on read and reaped by a periodic background sweep, so memory is
//! reclaimed even for keys that are never read again.

use super::{BackendStats, CacheBackend, CacheEntry};
use crate::config::MemoryBackendConfig;
use crate::error::{CacheError, CacheResult};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::debug;

/// In-memory cache backend
pub struct InMemoryBackend {
    config: MemoryBackendConfig,
    entries: Arc<DashMap<String, CacheEntry>>,
    expired_sweeps: Arc<AtomicU64>,
    _sweep_task: tokio::task::JoinHandle<()>,
}

impl InMemoryBackend {
    /// Create a new in-memory backend and start its expiry sweep
    pub fn new(config: MemoryBackendConfig) -> Self {
        let entries: Arc<DashMap<String, CacheEntry>> = Arc::new(DashMap::new());
        let expired_sweeps = Arc::new(AtomicU64::new(0));

        let sweep_task = {
            let entries = entries.clone();
            let expired_sweeps = expired_sweeps.clone();
            let sweep_interval = config.sweep_interval;

            tokio::spawn(async move {
                let mut interval = interval(sweep_interval);
                loop {
                    interval.tick().await;
                    Self::sweep_expired(&entries, &expired_sweeps);
                }
            })
        };

        Self {
            config,
            entries,
            expired_sweeps,
            _sweep_task: sweep_task,
        }
    }

    fn sweep_expired(entries: &DashMap<String, CacheEntry>, expired_sweeps: &AtomicU64) {
        let expired_keys: Vec<String> = entries
            .iter()
            .filter(|entry| entry.value().is_expired())
            .map(|entry| entry.key().clone())
            .collect();

        let mut swept = 0;
        for key in expired_keys {
            if entries.remove(&key).is_some() {
                swept += 1;
            }
        }

        if swept > 0 {
            expired_sweeps.fetch_add(swept, Ordering::Relaxed);
            debug!("Swept {} expired cache entries", swept);
        }
    }

    /// Number of live entries, counting expired-but-unswept ones
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_expired() {
                drop(entry);
                self.entries.remove(key);
                return Ok(None);
            }
            return Ok(Some(entry.value.clone()));
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> CacheResult<()> {
        if self.entries.len() >= self.config.max_entries && !self.entries.contains_key(key) {
            // Make room by sweeping before refusing the write.
            Self::sweep_expired(&self.entries, &self.expired_sweeps);
            if self.entries.len() >= self.config.max_entries {
                return Err(CacheError::backend(format!(
                    "In-memory cache is full ({} entries)",
                    self.config.max_entries
                )));
            }
        }

        self.entries
            .insert(key.to_string(), CacheEntry::new(value.to_vec(), ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        match self.entries.remove(key) {
            Some((_, entry)) => Ok(!entry.is_expired()),
            None => Ok(false),
        }
    }

    async fn clear(&self) -> CacheResult<()> {
        let count = self.entries.len();
        self.entries.clear();
        debug!("Cleared {} entries from in-memory cache", count);
        Ok(())
    }

    async fn stats(&self) -> CacheResult<BackendStats> {
        Ok(BackendStats {
            entries: self.entries.len(),
            expired_sweeps: self.expired_sweeps.load(Ordering::Relaxed),
        })
    }

    async fn health_check(&self) -> CacheResult<bool> {
        let test_key = "__health_check__";
        let test_value = b"health_check_value";

        self.set(test_key, test_value, Some(Duration::from_secs(1))).await?;
        let retrieved = self.get(test_key).await?;
        self.delete(test_key).await?;

        Ok(retrieved.as_deref() == Some(test_value.as_slice()))
    }
}
