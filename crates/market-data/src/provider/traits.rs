//! Quote provider trait definition.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{Quote, QuoteRequest};

use super::capabilities::{ProviderCapabilities, RateLimit};

/// A source of live quotes.
///
/// Implement this trait to add a new quote source. The provider chain uses
/// the capabilities to decide whether to ask this provider at all, the
/// priority to order it against the others, and the rate limit to throttle
/// calls to it.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use shareprofit_market_data::{ProviderCapabilities, QuoteProvider, RateLimit};
///
/// struct MyProvider;
///
/// #[async_trait]
/// impl QuoteProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     fn capabilities(&self) -> ProviderCapabilities {
///         ProviderCapabilities { markets: &[], supports_previous_close: false }
///     }
///
///     fn rate_limit(&self) -> RateLimit {
///         RateLimit::default()
///     }
///
///     // ... implement get_latest_quote
/// }
/// ```
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Unique identifier such as "NSE" or "YAHOO".
    ///
    /// Used for logging, rate limiting, circuit breaker tracking and
    /// symbol resolution.
    fn id(&self) -> &'static str;

    /// Provider priority for ordering.
    ///
    /// Lower values = higher priority. Default is 10.
    fn priority(&self) -> u8 {
        10
    }

    fn capabilities(&self) -> ProviderCapabilities;

    fn rate_limit(&self) -> RateLimit;

    /// Fetch the latest quote for an already resolved symbol.
    ///
    /// Implementations must not outlive `request.deadline` by much; the
    /// caller enforces it regardless.
    async fn get_latest_quote(&self, request: &QuoteRequest) -> Result<Quote, MarketDataError>;
}
