//! # Cache Metrics
//!
//! Thread-safe hit/miss/eviction counters, both global and per key.
//! Recording is lock-free on the hot path: global counters are plain
//! atomics and the per-key map is a concurrent map whose values hold
//! atomics, so concurrent recorders never contend on a coarse lock.
//!
//! Metrics are best-effort observability. No operation here can fail or
//! panic in a way that aborts the calling cache operation.

use dashmap::DashMap;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for a single cache key
#[derive(Debug, Default)]
struct KeyCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

/// Point-in-time copy of a single key's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KeyMetrics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl KeyMetrics {
    /// Hit rate for this key as a percentage (0-100).
    /// Returns 0 if the key has seen no lookups.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 * 100.0) / total as f64
        }
    }
}

/// Cache performance metrics collector
#[derive(Debug, Default)]
pub struct CacheMetrics {
    total_hits: AtomicU64,
    total_misses: AtomicU64,
    total_evictions: AtomicU64,
    per_key: DashMap<String, KeyCounters>,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cache hit for the specified key
    pub fn record_hit(&self, key: &str) {
        self.total_hits.fetch_add(1, Ordering::Relaxed);
        self.per_key
            .entry(key.to_string())
            .or_default()
            .hits
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cache miss for the specified key
    pub fn record_miss(&self, key: &str) {
        self.total_misses.fetch_add(1, Ordering::Relaxed);
        self.per_key
            .entry(key.to_string())
            .or_default()
            .misses
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cache eviction for the specified key
    pub fn record_eviction(&self, key: &str) {
        self.total_evictions.fetch_add(1, Ordering::Relaxed);
        self.per_key
            .entry(key.to_string())
            .or_default()
            .evictions
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_hits(&self) -> u64 {
        self.total_hits.load(Ordering::Relaxed)
    }

    pub fn total_misses(&self) -> u64 {
        self.total_misses.load(Ordering::Relaxed)
    }

    pub fn total_evictions(&self) -> u64 {
        self.total_evictions.load(Ordering::Relaxed)
    }

    /// Overall hit rate as a percentage (0-100).
    /// Returns 0 if no cache activity has occurred.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.total_hits();
        let total = hits + self.total_misses();
        if total == 0 {
            0.0
        } else {
            (hits as f64 * 100.0) / total as f64
        }
    }

    /// Counters for a single key, if it has been observed
    pub fn key_metrics(&self, key: &str) -> Option<KeyMetrics> {
        self.per_key.get(key).map(|counters| KeyMetrics {
            hits: counters.hits.load(Ordering::Relaxed),
            misses: counters.misses.load(Ordering::Relaxed),
            evictions: counters.evictions.load(Ordering::Relaxed),
        })
    }

    /// Copy of all tracked per-key counters.
    ///
    /// Not a linearizable snapshot across keys, but each individual record
    /// is a real state the key's counters held at some point.
    pub fn snapshot(&self) -> HashMap<String, KeyMetrics> {
        self.per_key
            .iter()
            .map(|entry| {
                let counters = entry.value();
                (
                    entry.key().clone(),
                    KeyMetrics {
                        hits: counters.hits.load(Ordering::Relaxed),
                        misses: counters.misses.load(Ordering::Relaxed),
                        evictions: counters.evictions.load(Ordering::Relaxed),
                    },
                )
            })
            .collect()
    }

    /// Top keys by hit count, descending, ties broken by key ascending
    pub fn top_keys_by_hits(&self, count: usize) -> Vec<(String, u64)> {
        let mut keys: Vec<(String, u64)> = self
            .snapshot()
            .into_iter()
            .map(|(key, metrics)| (key, metrics.hits))
            .collect();

        keys.sort_by(|a, b| (Reverse(a.1), &a.0).cmp(&(Reverse(b.1), &b.0)));
        keys.truncate(count);
        keys
    }

    /// Reset all counters to zero and clear the per-key map
    pub fn reset(&self) {
        self.per_key.clear();
        self.total_hits.store(0, Ordering::Relaxed);
        self.total_misses.store(0, Ordering::Relaxed);
        self.total_evictions.store(0, Ordering::Relaxed);
    }
}
