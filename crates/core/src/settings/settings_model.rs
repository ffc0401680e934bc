use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_AUTO_REFRESH_SECS, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL_SECS,
    DEFAULT_MARKET_SUFFIX, DEFAULT_MAX_CONCURRENCY, DEFAULT_REQUEST_TIMEOUT_MS,
};
use crate::errors::{Error, Result};

/// Tuning knobs for the price refresh pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RefreshSettings {
    pub max_concurrency: usize,
    pub request_timeout_ms: u64,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
    /// 0 disables auto-refresh.
    pub auto_refresh_secs: u64,
    /// Suffix for bare tickers, e.g. ".NS". Empty leaves them unqualified.
    pub default_market_suffix: String,
    /// Provider ids in fallback order.
    pub provider_order: Vec<String>,
    /// Serve prices from the offline demo table instead of live sources.
    pub demo_mode: bool,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            auto_refresh_secs: DEFAULT_AUTO_REFRESH_SECS,
            default_market_suffix: DEFAULT_MARKET_SUFFIX.to_string(),
            provider_order: vec!["NSE".to_string(), "YAHOO".to_string()],
            demo_mode: false,
        }
    }
}

impl RefreshSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn auto_refresh_interval(&self) -> Option<Duration> {
        (self.auto_refresh_secs > 0).then(|| Duration::from_secs(self.auto_refresh_secs))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(Error::InvalidConfigValue(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(Error::InvalidConfigValue(
                "request_timeout_ms must be positive".to_string(),
            ));
        }
        if self.cache_ttl_secs == 0 {
            return Err(Error::InvalidConfigValue(
                "cache_ttl_secs must be positive".to_string(),
            ));
        }
        if self.cache_capacity == 0 {
            return Err(Error::InvalidConfigValue(
                "cache_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
