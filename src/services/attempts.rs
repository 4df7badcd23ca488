use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, Script};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::services::cache::CacheError;

/// Fixed-window counters for throttling, kept apart from session entries.
#[async_trait]
pub trait AttemptCounter: Send + Sync {
    /// Increments `key` and returns the new count. The window starts on the
    /// first hit and the count resets once it elapses.
    async fn hit(&self, key: &str, window: Duration) -> Result<u64, CacheError>;
}

// A counter left without a TTL (-1) gets one too, so it can never stick.
const HIT_SCRIPT: &str = r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 or redis.call('TTL', KEYS[1]) == -1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return count
"#;

#[derive(Clone)]
pub struct RedisAttemptCounter {
    conn: MultiplexedConnection,
    prefix: String,
    hit: Script,
}

impl RedisAttemptCounter {
    pub fn new(conn: MultiplexedConnection, prefix: impl Into<String>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
            hit: Script::new(HIT_SCRIPT),
        }
    }
}

#[async_trait]
impl AttemptCounter for RedisAttemptCounter {
    async fn hit(&self, key: &str, window: Duration) -> Result<u64, CacheError> {
        let mut conn = self.conn.clone();
        let count: u64 = self
            .hit
            .key(format!("{}{}", self.prefix, key))
            .arg(window.as_secs().max(1))
            .invoke_async(&mut conn)
            .await?;
        Ok(count)
    }
}

#[derive(Default)]
pub struct MemoryAttemptCounter {
    windows: Mutex<HashMap<String, (u64, Instant)>>,
}

impl MemoryAttemptCounter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttemptCounter for MemoryAttemptCounter {
    async fn hit(&self, key: &str, window: Duration) -> Result<u64, CacheError> {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let (count, resets_at) = windows.entry(key.to_string()).or_insert((0, now + window));
        if *resets_at <= now {
            *count = 0;
            *resets_at = now + window;
        }
        *count += 1;
        Ok(*count)
    }
}
