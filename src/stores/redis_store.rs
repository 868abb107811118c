//! # Redis Cache Backend
//!
//! Networked store client over a managed Redis connection. TTLs map onto
//! Redis's own expiry (`PSETEX` semantics), so the server handles both
//! expiry and eviction; the sweep counter stays at zero here.

use super::{BackendStats, CacheBackend};
use crate::config::RedisBackendConfig;
use crate::error::{CacheError, CacheResult};
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use std::time::Duration;
use tracing::{debug, info};

/// Redis cache backend
pub struct RedisBackend {
    config: RedisBackendConfig,
    connection: ConnectionManager,
}

impl RedisBackend {
    /// Connect to Redis and build the backend
    pub async fn new(config: RedisBackendConfig) -> CacheResult<Self> {
        let client = Client::open(config.url.as_str())?;

        let connection = tokio::time::timeout(
            config.connection_timeout,
            ConnectionManager::new(client),
        )
        .await
        .map_err(|_| CacheError::Timeout)??;

        info!("Redis cache backend connected to {}", config.url);

        Ok(Self { config, connection })
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.config.key_prefix, key)
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut conn = self.connection.clone();
        let value: Option<Vec<u8>> = conn.get(self.full_key(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> CacheResult<()> {
        let mut conn = self.connection.clone();
        let full_key = self.full_key(key);

        match ttl {
            Some(ttl) if !ttl.is_zero() => {
                conn.pset_ex::<_, _, ()>(&full_key, value, ttl.as_millis() as u64)
                    .await?;
            }
            _ => {
                conn.set::<_, _, ()>(&full_key, value).await?;
            }
        }

        debug!("Set Redis cache key: {} with TTL: {:?}", key, ttl);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.connection.clone();
        let deleted: i64 = conn.del(self.full_key(key)).await?;
        Ok(deleted > 0)
    }

    async fn clear(&self) -> CacheResult<()> {
        let pattern = format!("{}*", self.config.key_prefix);
        let mut conn = self.connection.clone();

        let mut cursor = 0u64;
        let mut cleared = 0usize;
        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(1000)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                cleared += keys.len();
                conn.del::<_, ()>(keys).await?;
            }

            if next_cursor == 0 {
                break;
            }
            cursor = next_cursor;
        }

        info!("Cleared {} keys from Redis cache", cleared);
        Ok(())
    }

    async fn stats(&self) -> CacheResult<BackendStats> {
        let pattern = format!("{}*", self.config.key_prefix);
        let mut conn = self.connection.clone();

        let mut cursor = 0u64;
        let mut entries = 0usize;
        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(1000)
                .query_async(&mut conn)
                .await?;

            entries += keys.len();

            if next_cursor == 0 {
                break;
            }
            cursor = next_cursor;
        }

        Ok(BackendStats {
            entries,
            // Redis handles TTL cleanup server-side.
            expired_sweeps: 0,
        })
    }

    async fn health_check(&self) -> CacheResult<bool> {
        let mut conn = self.connection.clone();
        let response: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(response == "PONG")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn test_config() -> RedisBackendConfig {
        RedisBackendConfig {
            url: std::env::var("THEATRE_CACHE_REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            key_prefix: "theatre:cache:test:".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    #[ignore] // Requires a running Redis server
    async fn basic_operations() {
        let cache = RedisBackend::new(test_config()).await.unwrap();

        cache.set("shows:active", b"payload", Some(Duration::from_secs(60))).await.unwrap();
        assert_eq!(cache.get("shows:active").await.unwrap(), Some(b"payload".to_vec()));

        assert!(cache.delete("shows:active").await.unwrap());
        assert_eq!(cache.get("shows:active").await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore] // Requires a running Redis server
    async fn ttl_expiration() {
        let cache = RedisBackend::new(test_config()).await.unwrap();

        cache.set("shows:detail:1", b"payload", Some(Duration::from_millis(200))).await.unwrap();
        assert!(cache.get("shows:detail:1").await.unwrap().is_some());

        sleep(Duration::from_millis(300)).await;
        assert_eq!(cache.get("shows:detail:1").await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore] // Requires a running Redis server
    async fn health_check() {
        let cache = RedisBackend::new(test_config()).await.unwrap();
        assert!(cache.health_check().await.unwrap());
    }
}
