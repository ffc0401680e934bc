//! Per-provider token bucket rate limiting.
//!
//! Every provider gets its own bucket sized from its [`RateLimit`]. Buckets
//! start full so a refresh can burst, then refill continuously.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::models::ProviderId;
use crate::provider::RateLimit;

/// Bucket settings for one provider.
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    pub requests_per_minute: u32,
    pub burst_capacity: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        RateLimit::default().into()
    }
}

impl From<RateLimit> for RateLimitConfig {
    fn from(limit: RateLimit) -> Self {
        Self {
            requests_per_minute: limit.requests_per_minute.max(1),
            burst_capacity: f64::from(limit.burst.max(1)),
        }
    }
}

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    capacity: f64,
    /// Tokens per second.
    rate: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(config: &RateLimitConfig) -> Self {
        Self {
            tokens: config.burst_capacity,
            capacity: config.burst_capacity,
            rate: f64::from(config.requests_per_minute) / 60.0,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_refill = now;
    }

    /// Take a token, or report how long until one is available.
    fn take(&mut self) -> Result<(), Duration> {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            Err(Duration::from_secs_f64((1.0 - self.tokens) / self.rate))
        }
    }
}

/// Thread-safe rate limiter holding one token bucket per provider.
pub struct RateLimiter {
    configs: Mutex<HashMap<String, RateLimitConfig>>,
    buckets: Mutex<HashMap<String, TokenBucket>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            configs: Mutex::new(HashMap::new()),
            buckets: Mutex::new(HashMap::new()),
        }
    }

    // A poisoned lock only means a panic elsewhere mid-update; throttling
    // state is still usable.
    fn lock_buckets(&self) -> MutexGuard<'_, HashMap<String, TokenBucket>> {
        self.buckets.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter buckets mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn lock_configs(&self) -> MutexGuard<'_, HashMap<String, RateLimitConfig>> {
        self.configs.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter configs mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Set the limits for a provider, replacing any existing bucket.
    pub fn configure(&self, provider: &ProviderId, config: RateLimitConfig) {
        self.lock_configs().insert(provider.to_string(), config);
        self.lock_buckets().remove(provider.as_ref());
    }

    fn config_for(&self, provider: &ProviderId) -> RateLimitConfig {
        self.lock_configs()
            .get(provider.as_ref())
            .cloned()
            .unwrap_or_default()
    }

    fn take(&self, provider: &ProviderId) -> Result<(), Duration> {
        let config = self.config_for(provider);
        let mut buckets = self.lock_buckets();
        buckets
            .entry(provider.to_string())
            .or_insert_with(|| TokenBucket::new(&config))
            .take()
    }

    /// Wait until a request to `provider` is allowed.
    pub async fn acquire(&self, provider: &ProviderId) {
        while let Err(wait) = self.take(provider) {
            debug!("Rate limiter: waiting {:?} for '{}'", wait, provider);
            tokio::time::sleep(wait).await;
        }
    }

    /// Take a token if one is available right now.
    pub fn try_acquire(&self, provider: &ProviderId) -> bool {
        self.take(provider).is_ok()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
