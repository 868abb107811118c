//! # Theatre Cache
//!
//! Read-through cache subsystem for the theatre ticketing backend. Sits in
//! front of the relational data store and provides per-key TTL policy,
//! hit/miss/eviction metrics, and coordinated invalidation of related keys
//! when the underlying data mutates.
//!
//! ## Architecture
//! The subsystem is layered bottom-up:
//! 1. **Key Catalog**: the static registry of key templates and TTL policy
//! 2. **Metrics Collector**: thread-safe hit/miss/eviction counters
//! 3. **Cache Service**: the get/set/remove boundary over pluggable
//!    backends (in-memory or Redis), with serialization, TTL enforcement,
//!    and failure containment
//! 4. **Invalidation Coordinator**: maps domain mutations to the concrete
//!    set of stale keys and removes them
//!
//! The cache is an optimization, never a source of truth: every failure
//! inside the subsystem degrades to a miss or a no-op, and aggregate
//! listing caches bound their staleness by TTL rather than by wildcard
//! deletion against the backend.
//!
//! ## Usage Example
//! ```no_run
//! use std::sync::Arc;
//! use theatre_cache::{
//!     CacheConcept, CacheConfig, CacheService, InvalidationCoordinator, MutationEvent,
//! };
//! # async fn example() -> Result<(), theatre_cache::CacheError> {
//! # let show_id = uuid::Uuid::new_v4();
//!
//! let config = CacheConfig::default();
//! let cache = Arc::new(CacheService::new(config).await?);
//!
//! // Query handler: read through the cache.
//! let key = cache.catalog().show_detail(show_id);
//! let detail: Result<String, std::convert::Infallible> = cache
//!     .get_or_compute(CacheConcept::ShowDetail, &key, || async {
//!         Ok("computed from the data store".to_string())
//!     })
//!     .await;
//!
//! // Mutation handler: invalidate after a successful data-store write.
//! let coordinator = InvalidationCoordinator::new(cache.clone());
//! coordinator.invalidate(MutationEvent::ReviewApproved { show_id }).await;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod invalidation;
pub mod metrics;
pub mod service;
pub mod stores;

pub use catalog::{CacheConcept, CacheKey, KeyCatalog, KeyTemplate, WildcardPattern};
pub use config::{
    BackendConfig, CacheConfig, MemoryBackendConfig, RedisBackendConfig, TtlConfig,
};
pub use error::{CacheError, CacheResult};
pub use invalidation::{InvalidationCoordinator, InvalidationOutcome, MutationEvent};
pub use metrics::{CacheMetrics, KeyMetrics};
pub use service::CacheService;
pub use stores::{BackendStats, CacheBackend, CacheEntry, InMemoryBackend, RedisBackend};
