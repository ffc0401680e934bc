//! Provider capabilities and rate limiting configuration.

/// Describes which symbols a provider can serve.
#[derive(Clone, Debug)]
pub struct ProviderCapabilities {
    /// Market suffixes this provider covers (e.g. `["NS"]`).
    /// Empty means every market.
    pub markets: &'static [&'static str],

    /// Whether quotes carry a previous close for day-change figures.
    pub supports_previous_close: bool,
}

impl ProviderCapabilities {
    /// Whether a symbol trading on `market` can be served.
    ///
    /// Symbols with no known market are only served by global providers.
    pub fn covers(&self, market: Option<&str>) -> bool {
        if self.markets.is_empty() {
            return true;
        }
        market.is_some_and(|m| self.markets.iter().any(|covered| covered.eq_ignore_ascii_case(m)))
    }
}

/// Rate limiting configuration for a provider.
///
/// Controls how aggressively we can call a provider to avoid
/// hitting their rate limits and getting blocked.
#[derive(Clone, Debug)]
pub struct RateLimit {
    /// Maximum requests allowed per minute.
    pub requests_per_minute: u32,

    /// Requests that may be sent back to back before throttling kicks in.
    pub burst: u32,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            burst: 10,
        }
    }
}
