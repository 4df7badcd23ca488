use std::sync::Arc;
use std::time::Duration;

use crate::{error::AuthError, services::attempts::AttemptCounter};

/// Email-keyed sign-in throttle.
///
/// A counter is incremented per attempt and its window starts on the first
/// one. `max_attempts == 0` disables the check. A counter that errors or
/// does not answer within `op_timeout` lets the attempt through.
pub struct SignInLimiter {
    counter: Arc<dyn AttemptCounter>,
    max_attempts: u64,
    window: Duration,
    op_timeout: Duration,
}

impl SignInLimiter {
    pub fn new(
        counter: Arc<dyn AttemptCounter>,
        max_attempts: u64,
        window: Duration,
        op_timeout: Duration,
    ) -> Self {
        Self {
            counter,
            max_attempts,
            window,
            op_timeout,
        }
    }

    pub async fn check(&self, email: &str) -> Result<(), AuthError> {
        if self.max_attempts == 0 {
            return Ok(());
        }

        let key = format!("signin:{}", email.to_lowercase());
        let hit = self.counter.hit(&key, self.window);
        let count = match tokio::time::timeout(self.op_timeout, hit).await {
            Ok(Ok(count)) => count,
            Ok(Err(e)) => {
                tracing::warn!("sign-in rate limit unavailable: {e}");
                return Ok(());
            }
            Err(_) => {
                tracing::warn!("sign-in rate limit timed out after {:?}", self.op_timeout);
                return Ok(());
            }
        };

        if count > self.max_attempts {
            return Err(AuthError::RateLimited);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::services::{attempts::MemoryAttemptCounter, cache::CacheError};

    const WINDOW: Duration = Duration::from_secs(900);
    const OP_TIMEOUT: Duration = Duration::from_millis(200);

    struct StalledCounter;

    #[async_trait]
    impl AttemptCounter for StalledCounter {
        async fn hit(&self, _: &str, _: Duration) -> Result<u64, CacheError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_blocks_after_max_attempts() {
        let limiter = SignInLimiter::new(Arc::new(MemoryAttemptCounter::new()), 3, WINDOW, OP_TIMEOUT);
        for _ in 0..3 {
            limiter.check("a@x.com").await.unwrap();
        }
        assert!(matches!(limiter.check("A@X.com").await, Err(AuthError::RateLimited)));
        // Other accounts are unaffected
        limiter.check("b@x.com").await.unwrap();
    }

    #[tokio::test]
    async fn test_zero_disables_limit() {
        let limiter = SignInLimiter::new(Arc::new(StalledCounter), 0, WINDOW, OP_TIMEOUT);
        for _ in 0..10 {
            limiter.check("a@x.com").await.unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_counter_fails_open_within_timeout() {
        let limiter = SignInLimiter::new(Arc::new(StalledCounter), 3, WINDOW, OP_TIMEOUT);
        let started = tokio::time::Instant::now();
        let outcome = tokio::time::timeout(Duration::from_secs(3600), limiter.check("a@x.com"))
            .await
            .expect("limiter must not hang");
        assert!(outcome.is_ok());
        assert!(started.elapsed() <= OP_TIMEOUT + Duration::from_millis(1));
    }
}
