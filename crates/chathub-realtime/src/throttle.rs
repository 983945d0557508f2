//! Per-user token bucket applied to message sends and uploads.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::Mutex;

use chathub_core::config::rate_limit::RateLimitConfig;
use chathub_core::result::AppResult;
use chathub_core::traits::UserResourceRelease;
use chathub_core::types::UserId;

/// Simple in-memory token bucket rate limiter keyed by user.
#[derive(Debug)]
pub struct UserThrottle {
    /// User → bucket state.
    buckets: Mutex<HashMap<UserId, TokenBucket>>,
    /// Maximum tokens per bucket.
    max_tokens: u32,
    /// Token refill rate per second.
    refill_rate: f64,
    /// When `false`, every check passes.
    enabled: bool,
}

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl UserThrottle {
    /// Creates a new throttle.
    pub fn new(max_tokens: u32, refill_rate: f64) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            max_tokens,
            refill_rate,
            enabled: true,
        }
    }

    /// Creates a throttle from configuration.
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self {
            enabled: config.enabled,
            ..Self::new(config.burst, config.per_second)
        }
    }

    /// Attempts to consume a token for the given user.
    pub async fn check(&self, user_id: UserId) -> bool {
        if !self.enabled {
            return true;
        }

        let mut buckets = self.buckets.lock().await;
        let now = Instant::now();

        let bucket = buckets.entry(user_id).or_insert(TokenBucket {
            tokens: f64::from(self.max_tokens),
            last_refill: now,
        });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_rate).min(f64::from(self.max_tokens));
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Number of users with a bucket.
    pub async fn tracked_users(&self) -> usize {
        self.buckets.lock().await.len()
    }
}

#[async_trait]
impl UserResourceRelease for UserThrottle {
    async fn release(&self, user_id: UserId) -> AppResult<()> {
        self.buckets.lock().await.remove(&user_id);
        Ok(())
    }
}
