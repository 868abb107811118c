//! # Cache Service
//!
//! The read/write/evict boundary between query handlers and the backing
//! store: JSON serialization, TTL application from the key catalog, the
//! global bypass switch, per-operation deadlines, and metrics observation.
//!
//! Failure containment is the central contract here. The cache is an
//! optimization, never a source of truth: a backend error, a corrupt
//! payload, or a timeout degrades a `get` to a miss and a `set`/`remove`
//! to a silent no-op. No failure inside this module reaches a caller.

use crate::catalog::{CacheConcept, CacheKey, KeyCatalog};
use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::metrics::CacheMetrics;
use crate::stores::{build_backend, BackendStats, CacheBackend};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Read-through cache service over a pluggable backend
pub struct CacheService {
    config: CacheConfig,
    catalog: KeyCatalog,
    backend: Arc<dyn CacheBackend>,
    metrics: Arc<CacheMetrics>,
}

impl CacheService {
    /// Build the service with the backend selected by configuration
    pub async fn new(config: CacheConfig) -> CacheResult<Self> {
        config.validate()?;
        let backend = build_backend(&config.backend).await?;
        Ok(Self::with_backend(config, backend))
    }

    /// Build the service over an existing backend.
    ///
    /// Used by tests to inject simulated backends and by callers that share
    /// one backend across services.
    pub fn with_backend(config: CacheConfig, backend: Arc<dyn CacheBackend>) -> Self {
        let catalog = KeyCatalog::new(config.ttl.clone());
        Self {
            config,
            catalog,
            backend,
            metrics: Arc::new(CacheMetrics::new()),
        }
    }

    /// Whether caching is enabled (the global kill switch)
    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// The key catalog governing this service's keys and TTLs
    pub fn catalog(&self) -> &KeyCatalog {
        &self.catalog
    }

    /// Metrics collector observing every operation
    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    /// Get a cached value.
    ///
    /// Returns `None` on a miss, on an expired entry, and on any backend,
    /// timeout, or deserialization failure. A broken cache degrades to
    /// "always miss", not to an application fault.
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        if !self.config.enabled {
            return None;
        }

        let bytes = match self.with_deadline(self.backend.get(key.as_str())).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                self.metrics.record_miss(key.as_str());
                debug!("Cache miss for key: {}", key);
                return None;
            }
            Err(e) => {
                self.metrics.record_miss(key.as_str());
                error!("Error retrieving cache for key {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                self.metrics.record_hit(key.as_str());
                debug!("Cache hit for key: {}", key);
                Some(value)
            }
            Err(e) => {
                // Corrupt or shape-incompatible payload. Treating it as a
                // miss also covers payload changes across deployments
                // without a migration step.
                self.metrics.record_miss(key.as_str());
                error!("Error deserializing cache for key {}: {}", key, e);
                None
            }
        }
    }

    /// Cache a value with an explicit TTL.
    ///
    /// `None` or a zero TTL writes without expiry. Write failures are
    /// logged and swallowed: a failed cache write must never fail the
    /// data-store write that triggered it.
    pub async fn set<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: Option<Duration>) {
        if !self.config.enabled {
            return;
        }

        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Error serializing cache value for key {}: {}", key, e);
                return;
            }
        };

        let ttl = ttl.filter(|ttl| !ttl.is_zero());
        match self
            .with_deadline(self.backend.set(key.as_str(), &bytes, ttl))
            .await
        {
            Ok(()) => debug!("Cache set for key: {}, ttl: {:?}", key, ttl),
            Err(e) => error!("Error setting cache for key {}: {}", key, e),
        }
    }

    /// Cache a value under a concept's default TTL from the catalog
    pub async fn set_for_concept<T: Serialize>(
        &self,
        concept: CacheConcept,
        key: &CacheKey,
        value: &T,
    ) {
        self.set(key, value, Some(self.catalog.ttl(concept))).await;
    }

    /// Remove a single key, recording an eviction if a live entry existed
    pub async fn remove(&self, key: &CacheKey) {
        if !self.config.enabled {
            return;
        }

        match self.with_deadline(self.backend.delete(key.as_str())).await {
            Ok(true) => {
                self.metrics.record_eviction(key.as_str());
                debug!("Cache invalidated for key: {}", key);
            }
            Ok(false) => {}
            Err(e) => error!("Error removing cache for key {}: {}", key, e),
        }
    }

    /// Remove an explicit, pre-resolved list of concrete keys.
    ///
    /// Each removal is independent; one key's failure does not block the
    /// rest. Returns the number of keys whose removal succeeded with a live
    /// entry present.
    pub async fn remove_matching(&self, keys: &[CacheKey]) -> usize {
        if !self.config.enabled {
            return 0;
        }

        let mut removed = 0;
        for key in keys {
            match self.with_deadline(self.backend.delete(key.as_str())).await {
                Ok(true) => {
                    self.metrics.record_eviction(key.as_str());
                    removed += 1;
                }
                Ok(false) => {}
                Err(e) => error!("Error removing cache for key {}: {}", key, e),
            }
        }
        removed
    }

    /// Read-through helper: get, compute on miss, cache under the
    /// concept's TTL. The compute step is the caller's authoritative
    /// query; its errors propagate untouched, cache failures never do.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        concept: CacheConcept,
        key: &CacheKey,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get::<T>(key).await {
            return Ok(cached);
        }

        let value = compute().await?;
        self.set_for_concept(concept, key, &value).await;
        Ok(value)
    }

    /// Drop every cached entry. The cache is non-authoritative and may be
    /// rebuilt from the data store at any time.
    pub async fn clear(&self) {
        if !self.config.enabled {
            return;
        }
        if let Err(e) = self.with_deadline(self.backend.clear()).await {
            error!("Error clearing cache: {}", e);
        }
    }

    /// Backend statistics, if the backend is reachable
    pub async fn backend_stats(&self) -> Option<BackendStats> {
        match self.with_deadline(self.backend.stats()).await {
            Ok(stats) => Some(stats),
            Err(e) => {
                error!("Error reading cache backend stats: {}", e);
                None
            }
        }
    }

    async fn with_deadline<T>(
        &self,
        operation: impl Future<Output = CacheResult<T>>,
    ) -> CacheResult<T> {
        match tokio::time::timeout(self.config.operation_timeout, operation).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout),
        }
    }
}
