use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Script};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis command failed")]
    Redis(#[from] redis::RedisError),

    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("cache rejected the write")]
    Rejected,

    #[error("session payload could not be encoded")]
    Encode(#[from] serde_json::Error),
}

/// TTL-bearing key/value store shared by every API instance.
///
/// Single-key operations are atomic. `retire_pair` is the only cross-key
/// operation and must delete both keys in one step.
#[async_trait]
pub trait SessionCache: Send + Sync {
    /// Returns whether the write was accepted.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, CacheError>;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Idempotent: `Ok(true)` whether or not the key existed.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Deletes both keys atomically and reports whether `refresh_key` was
    /// still present, i.e. whether this caller retired the pair.
    async fn retire_pair(&self, refresh_key: &str, access_key: &str) -> Result<bool, CacheError>;

    async fn ping(&self) -> Result<(), CacheError>;
}

const RETIRE_PAIR_SCRIPT: &str = r#"
local removed = redis.call('DEL', KEYS[1])
redis.call('DEL', KEYS[2])
return removed
"#;

/// Redis-backed session cache. Every key is namespaced with `prefix`.
#[derive(Clone)]
pub struct RedisSessionCache {
    conn: MultiplexedConnection,
    prefix: String,
    retire: Script,
}

impl RedisSessionCache {
    pub fn new(conn: MultiplexedConnection, prefix: impl Into<String>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
            retire: Script::new(RETIRE_PAIR_SCRIPT),
        }
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

#[async_trait]
impl SessionCache for RedisSessionCache {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        // SET .. EX rejects a zero expiry
        let secs = ttl.as_secs().max(1);
        let reply: Option<String> = redis::cmd("SET")
            .arg(self.key(key))
            .arg(value)
            .arg("EX")
            .arg(secs)
            .query_async(&mut conn)
            .await?;
        Ok(reply.as_deref() == Some("OK"))
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(self.key(key)).await?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        let _: u64 = conn.del(self.key(key)).await?;
        Ok(true)
    }

    async fn retire_pair(&self, refresh_key: &str, access_key: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        let removed: u64 = self
            .retire
            .key(self.key(refresh_key))
            .key(self.key(access_key))
            .invoke_async(&mut conn)
            .await?;
        Ok(removed == 1)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

struct Slot {
    value: String,
    expires_at: Instant,
}

/// In-process session cache for local development and tests.
///
/// Expired entries are dropped lazily when they are read.
#[derive(Default)]
pub struct MemorySessionCache {
    entries: Mutex<HashMap<String, Slot>>,
}

impl MemorySessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .values()
            .filter(|s| s.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionCache for MemorySessionCache {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, CacheError> {
        let slot = Slot {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.lock().await.insert(key.to_string(), slot);
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(slot) if slot.expires_at > Instant::now() => Ok(Some(slot.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        self.entries.lock().await.remove(key);
        Ok(true)
    }

    async fn retire_pair(&self, refresh_key: &str, access_key: &str) -> Result<bool, CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let removed = entries
            .remove(refresh_key)
            .is_some_and(|slot| slot.expires_at > now);
        entries.remove(access_key);
        Ok(removed)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
