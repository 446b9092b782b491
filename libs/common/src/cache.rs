//! Key/value storage for persisted carts
//!
//! Carts live under one key per owner. Production runs use Redis; tests and
//! single-process runs can use the in-memory store instead.

use anyhow::Result;
use redis::{AsyncCommands, Client};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::error::{CacheError, CacheResult};

/// Configuration for Redis connection
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
    /// Expiry of persisted carts; `None` keeps them forever
    pub cart_ttl_seconds: Option<u64>,
}

impl RedisConfig {
    /// Create a new RedisConfig from environment variables
    ///
    /// # Environment Variables
    /// - `REDIS_URL`: Redis connection URL (default: "redis://localhost:6379")
    /// - `REDIS_CART_TTL_SECONDS`: cart expiry, `0` to disable (default: 2592000, 30 days)
    pub fn from_env() -> Result<Self> {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let ttl: u64 = std::env::var("REDIS_CART_TTL_SECONDS")
            .unwrap_or_else(|_| "2592000".to_string())
            .parse()
            .unwrap_or(2_592_000);

        Ok(RedisConfig {
            url,
            cart_ttl_seconds: (ttl > 0).then_some(ttl),
        })
    }
}

/// Redis client handing out multiplexed connections
#[derive(Clone)]
pub struct RedisPool {
    client: Client,
}

impl RedisPool {
    pub fn new(config: &RedisConfig) -> CacheResult<Self> {
        let client = Client::open(config.url.clone()).map_err(CacheError::Connection)?;
        info!("Redis client initialized with URL: {}", config.url);
        Ok(RedisPool { client })
    }

    async fn get_connection(&self) -> CacheResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(CacheError::Connection)
    }

    /// Set a key-value pair in Redis with optional TTL
    pub async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> CacheResult<()> {
        let mut conn = self.get_connection().await?;

        if let Some(ttl) = ttl_seconds {
            let _: () = conn.set_ex(key, value, ttl).await.map_err(CacheError::Command)?;
        } else {
            let _: () = conn.set(key, value).await.map_err(CacheError::Command)?;
        }

        Ok(())
    }

    pub async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.get_connection().await?;
        conn.get(key).await.map_err(CacheError::Command)
    }

    pub async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.get_connection().await?;
        let _: u64 = conn.del(key).await.map_err(CacheError::Command)?;
        Ok(())
    }

    /// Check if Redis is reachable
    pub async fn health_check(&self) -> CacheResult<bool> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(CacheError::Command)?;
        Ok(pong == "PONG")
    }
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    expires_at: Option<Instant>,
}

/// Process-local store with the same semantics as [`RedisPool`]
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, MemoryEntry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, MemoryEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store a value, dropping any entries that have already expired
    pub fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) {
        let now = Instant::now();
        let entry = MemoryEntry {
            value: value.to_string(),
            expires_at: ttl_seconds.map(|ttl| now + Duration::from_secs(ttl)),
        };

        let mut entries = self.entries();
        entries.retain(|_, e| e.expires_at.is_none_or(|at| at > now));
        entries.insert(key.to_string(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries();
        let expired = entries
            .get(key)
            .and_then(|e| e.expires_at)
            .is_some_and(|at| at <= Instant::now());
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|e| e.value.clone())
    }

    pub fn delete(&self, key: &str) {
        self.entries().remove(key);
    }
}

/// Backend selected at startup
#[derive(Clone)]
pub enum KeyValueStore {
    Redis(RedisPool),
    Memory(MemoryStore),
}

impl KeyValueStore {
    pub fn memory() -> Self {
        KeyValueStore::Memory(MemoryStore::new())
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            KeyValueStore::Redis(_) => "redis",
            KeyValueStore::Memory(_) => "memory",
        }
    }

    pub async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        match self {
            KeyValueStore::Redis(pool) => pool.get(key).await,
            KeyValueStore::Memory(store) => Ok(store.get(key)),
        }
    }

    pub async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> CacheResult<()> {
        match self {
            KeyValueStore::Redis(pool) => pool.set(key, value, ttl_seconds).await,
            KeyValueStore::Memory(store) => {
                store.set(key, value, ttl_seconds);
                Ok(())
            }
        }
    }

    pub async fn delete(&self, key: &str) -> CacheResult<()> {
        match self {
            KeyValueStore::Redis(pool) => pool.delete(key).await,
            KeyValueStore::Memory(store) => {
                store.delete(key);
                Ok(())
            }
        }
    }

    pub async fn health_check(&self) -> CacheResult<bool> {
        match self {
            KeyValueStore::Redis(pool) => pool.health_check().await,
            KeyValueStore::Memory(_) => Ok(true),
        }
    }

    /// Read and decode a JSON value
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        match self.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Encode and write a JSON value
    pub async fn set_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()> {
        let raw = serde_json::to_string(value)?;
        debug!(key, bytes = raw.len(), "Writing JSON value");
        self.set(key, &raw, ttl_seconds).await
    }
}
