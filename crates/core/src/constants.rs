/// Requests in flight at once during a refresh
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Per-symbol fetch timeout, fallback providers included
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 8_000;

/// How long a fetched quote is served from the cache
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;

/// Cache entries kept before the one nearest expiry is evicted
pub const DEFAULT_CACHE_CAPACITY: usize = 1_000;

/// Auto-refresh period; 0 disables
pub const DEFAULT_AUTO_REFRESH_SECS: u64 = 900;

/// Suffix appended to bare tickers (NSE listings)
pub const DEFAULT_MARKET_SUFFIX: &str = ".NS";

/// Decimal precision for display
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;
