//! Resolution traits for the market data crate.

use crate::errors::MarketDataError;
use crate::models::{ProviderId, ProviderSymbol, Symbol};

/// A canonical symbol expressed for one provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedSymbol {
    /// Market suffix the symbol trades under, if known (e.g. "NS").
    pub market: Option<String>,
    /// Ticker in the provider's format.
    pub provider_symbol: ProviderSymbol,
}

/// Turns canonical symbols into provider-specific tickers.
pub trait SymbolResolver: Send + Sync {
    /// Resolve `symbol` for `provider`.
    ///
    /// Returns `ResolutionFailed` when the provider cannot express the symbol
    /// at all; the chain then moves on to the next provider.
    fn resolve(
        &self,
        provider: &ProviderId,
        symbol: &Symbol,
    ) -> Result<ResolvedSymbol, MarketDataError>;
}
