use std::sync::Arc;

use log::debug;

use super::traits::{ResolvedSymbol, SymbolResolver};
use crate::errors::MarketDataError;
use crate::models::{ProviderId, Symbol};

/// Suffix used on portfolio tickers to force a US listing.
const US_MARKET: &str = "US";
const NSE_MARKET: &str = "NS";

/// Resolver driven by exchange suffixes on the ticker.
///
/// Bare tickers are assumed to trade on the default market (NSE unless
/// configured otherwise).
#[derive(Clone, Debug)]
pub struct SuffixResolver {
    default_market: Option<String>,
}

impl SuffixResolver {
    /// Resolver that treats bare tickers as NSE listings.
    pub fn new() -> Self {
        Self::with_default_suffix(".NS")
    }

    /// Resolver with a custom default suffix such as `".BO"`.
    ///
    /// An empty suffix leaves bare tickers unqualified.
    pub fn with_default_suffix(suffix: &str) -> Self {
        let market = suffix.trim().trim_start_matches('.').to_ascii_uppercase();
        Self {
            default_market: (!market.is_empty()).then_some(market),
        }
    }

    pub fn default_market(&self) -> Option<&str> {
        self.default_market.as_deref()
    }

    /// Yahoo-style ticker: qualified symbols pass through, bare ones get the
    /// default suffix, and the synthetic `.US` suffix is dropped.
    fn yahoo_symbol(&self, base: &str, suffix: Option<&str>, full: &str) -> String {
        match suffix {
            Some(US_MARKET) => base.to_string(),
            Some(_) => full.to_string(),
            None => match &self.default_market {
                Some(market) if market != US_MARKET => format!("{}.{}", base, market),
                _ => base.to_string(),
            },
        }
    }
}

impl Default for SuffixResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolResolver for SuffixResolver {
    fn resolve(
        &self,
        provider: &ProviderId,
        symbol: &Symbol,
    ) -> Result<ResolvedSymbol, MarketDataError> {
        let (base, suffix) = symbol.split_market();
        let market = suffix
            .map(str::to_string)
            .or_else(|| self.default_market.clone());

        let provider_symbol = match provider.as_ref() {
            "NSE" => {
                if market.as_deref() != Some(NSE_MARKET) {
                    return Err(MarketDataError::ResolutionFailed {
                        provider: provider.to_string(),
                        symbol: symbol.to_string(),
                    });
                }
                base.to_string()
            }
            // Yahoo and the demo table share the same ticker format.
            _ => self.yahoo_symbol(base, suffix, symbol.as_str()),
        };

        debug!(
            "Resolved {} for {} as {} (market {:?})",
            symbol, provider, provider_symbol, market
        );

        Ok(ResolvedSymbol {
            market,
            provider_symbol: Arc::from(provider_symbol),
        })
    }
}
