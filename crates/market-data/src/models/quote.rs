use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ProviderSymbol, Symbol};

/// A live price snapshot for one symbol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: Symbol,
    /// Last traded price. Always positive once validated.
    pub price: Decimal,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<Decimal>,
    /// When this process received the quote. Cache freshness is measured
    /// from here, not from the exchange timestamp.
    pub fetched_at: DateTime<Utc>,
    /// Exchange timestamp of the last trade, when the provider reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_time: Option<DateTime<Utc>>,
    /// Provider that produced the quote (e.g. "NSE", "YAHOO").
    pub source: String,
}

impl Quote {
    pub fn new(
        symbol: Symbol,
        price: Decimal,
        currency: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            symbol,
            price,
            currency: currency.into(),
            previous_close: None,
            fetched_at: Utc::now(),
            market_time: None,
            source: source.into(),
        }
    }

    pub fn with_previous_close(mut self, previous_close: Decimal) -> Self {
        self.previous_close = Some(previous_close);
        self
    }

    pub fn with_fetched_at(mut self, fetched_at: DateTime<Utc>) -> Self {
        self.fetched_at = fetched_at;
        self
    }

    pub fn with_market_time(mut self, market_time: DateTime<Utc>) -> Self {
        self.market_time = Some(market_time);
        self
    }

    /// Absolute change against the previous close.
    pub fn change(&self) -> Option<Decimal> {
        self.previous_close.map(|prev| self.price - prev)
    }

    /// Percentage change against the previous close, rounded to 2 places.
    pub fn change_percent(&self) -> Option<Decimal> {
        let prev = self.previous_close?;
        if prev.is_zero() {
            return None;
        }
        Some(((self.price - prev) / prev * Decimal::ONE_HUNDRED).round_dp(2))
    }
}

/// What a provider is asked to fetch.
#[derive(Clone, Debug)]
pub struct QuoteRequest {
    /// Canonical symbol, echoed back on the returned quote.
    pub symbol: Symbol,
    /// Ticker in the provider's own format.
    pub provider_symbol: ProviderSymbol,
    /// Point in time after which the caller no longer wants an answer.
    pub deadline: Instant,
}

impl QuoteRequest {
    pub fn new(symbol: Symbol, provider_symbol: ProviderSymbol, deadline: Instant) -> Self {
        Self {
            symbol,
            provider_symbol,
            deadline,
        }
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}
