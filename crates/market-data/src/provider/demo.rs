//! Offline demo provider.
//!
//! Serves prices from a built-in table with a small random drift so the
//! tracker can be explored without network access. All prices are in INR;
//! US listings are pre-converted.

use std::collections::HashMap;

use async_trait::async_trait;
use lazy_static::lazy_static;
use rand::Rng;
use rust_decimal::Decimal;

use crate::errors::MarketDataError;
use crate::models::{Quote, QuoteRequest};
use crate::provider::{ProviderCapabilities, QuoteProvider, RateLimit};

use super::price_from_f64;

const PROVIDER_ID: &str = "DEMO";

/// Price used for tickers missing from the table.
const DEFAULT_PRICE: f64 = 1000.00;

/// Maximum relative drift applied to each quote (5%).
const MAX_DRIFT: f64 = 0.05;

lazy_static! {
    static ref DEMO_PRICES: HashMap<&'static str, f64> = HashMap::from([
        ("RELIANCE.NS", 2450.75),
        ("TCS.NS", 3580.40),
        ("HDFCBANK.NS", 1620.30),
        ("INFY.NS", 1450.60),
        ("HINDUNILVR.NS", 2380.90),
        ("ICICIBANK.NS", 950.25),
        ("SBIN.NS", 575.80),
        ("BHARTIARTL.NS", 865.40),
        ("ITC.NS", 410.75),
        ("ASIANPAINT.NS", 2980.60),
        ("MARUTI.NS", 9850.30),
        ("WIPRO.NS", 420.45),
        ("AAPL", 12470.75),
        ("GOOGL", 228416.40),
        ("MSFT", 27447.35),
        ("TSLA", 70599.80),
        ("AMZN", 265674.70),
        ("NVDA", 18322.25),
        ("META", 40279.90),
        ("NFLX", 31560.75),
    ]);
}

/// Demo quote source. Always succeeds.
pub struct DemoProvider {
    drift: bool,
}

impl DemoProvider {
    /// Demo provider with random drift on every quote.
    pub fn new() -> Self {
        Self { drift: true }
    }

    /// Demo provider that always returns the table price.
    pub fn fixed() -> Self {
        Self { drift: false }
    }

    fn base_price(provider_symbol: &str) -> f64 {
        DEMO_PRICES
            .get(provider_symbol)
            .copied()
            .unwrap_or(DEFAULT_PRICE)
    }

    fn quote_price(&self, provider_symbol: &str) -> Result<Decimal, MarketDataError> {
        let base = Self::base_price(provider_symbol);
        let factor = if self.drift {
            1.0 + rand::thread_rng().gen_range(-MAX_DRIFT..MAX_DRIFT)
        } else {
            1.0
        };

        price_from_f64(base * factor)
            .map(|p| p.round_dp(2))
            .ok_or_else(|| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Unrepresentable demo price for {}", provider_symbol),
            })
    }
}

impl Default for DemoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteProvider for DemoProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        50
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            markets: &[],
            supports_previous_close: true,
        }
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 60_000,
            burst: 1_000,
        }
    }

    async fn get_latest_quote(&self, request: &QuoteRequest) -> Result<Quote, MarketDataError> {
        let price = self.quote_price(&request.provider_symbol)?;
        let previous_close = (price * Decimal::new(99, 2)).round_dp(2);

        Ok(Quote::new(request.symbol.clone(), price, "INR", PROVIDER_ID)
            .with_previous_close(previous_close))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Symbol;
    use rust_decimal_macros::dec;
    use std::time::{Duration, Instant};

    fn request(symbol: &str) -> QuoteRequest {
        QuoteRequest::new(
            Symbol::parse(symbol).unwrap(),
            symbol.into(),
            Instant::now() + Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn test_fixed_prices_come_from_table() {
        let provider = DemoProvider::fixed();

        let quote = provider.get_latest_quote(&request("TCS.NS")).await.unwrap();
        assert_eq!(quote.price, dec!(3580.40));
        assert_eq!(quote.previous_close, Some(dec!(3544.60)));
        assert_eq!(quote.source, "DEMO");
    }

    #[tokio::test]
    async fn test_unknown_symbol_uses_default_price() {
        let provider = DemoProvider::fixed();

        let quote = provider.get_latest_quote(&request("ZZZZ.NS")).await.unwrap();
        assert_eq!(quote.price, dec!(1000));
    }

    #[tokio::test]
    async fn test_drift_stays_within_five_percent() {
        let provider = DemoProvider::new();

        for _ in 0..50 {
            let quote = provider.get_latest_quote(&request("INFY.NS")).await.unwrap();
            assert!(quote.price >= dec!(1378.07));
            assert!(quote.price <= dec!(1523.13));
        }
    }
}
