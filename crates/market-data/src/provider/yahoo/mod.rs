//! Yahoo Finance quote provider.
//!
//! Global coverage through the public chart endpoint. Indian listings are
//! addressed with exchange suffixes (`RELIANCE.NS`, `RELIANCE.BO`), which the
//! resolver adds before the request reaches this provider.

mod models;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::{header, Client, StatusCode};
use tracing::{debug, warn};

use self::models::{YahooChartMeta, YahooChartResponse};
use super::{price_from_f64, USER_AGENT};
use crate::errors::MarketDataError;
use crate::models::{Quote, QuoteRequest};
use crate::provider::{ProviderCapabilities, QuoteProvider, RateLimit};

const BASE_URL: &str = "https://query1.finance.yahoo.com";
const PROVIDER_ID: &str = "YAHOO";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Yahoo Finance provider backed by `/v8/finance/chart`.
pub struct YahooProvider {
    client: Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Point the provider at a different host, e.g. `query2.finance.yahoo.com`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn fetch(&self, request: &QuoteRequest) -> Result<String, MarketDataError> {
        let remaining = request.remaining();
        if remaining.is_zero() {
            return Err(MarketDataError::Timeout {
                provider: PROVIDER_ID.to_string(),
            });
        }

        let url = format!(
            "{}/v8/finance/chart/{}",
            self.base_url,
            urlencoding::encode(&request.provider_symbol)
        );
        debug!("Yahoo request: {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("interval", "1d"), ("range", "1d")])
            .header(header::ACCEPT, "application/json")
            .timeout(remaining)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(MarketDataError::SymbolNotFound {
                symbol: request.provider_symbol.to_string(),
                provider: PROVIDER_ID.to_string(),
            });
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        if !status.is_success() {
            warn!("Yahoo returned HTTP {} for {}", status, request.provider_symbol);
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        response.text().await.map_err(map_transport_error)
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn map_transport_error(e: reqwest::Error) -> MarketDataError {
    if e.is_timeout() {
        MarketDataError::Timeout {
            provider: PROVIDER_ID.to_string(),
        }
    } else {
        MarketDataError::Network(e)
    }
}

/// Parse a chart response body into a quote for `request`.
fn parse_chart(body: &str, request: &QuoteRequest) -> Result<Quote, MarketDataError> {
    let response: YahooChartResponse =
        serde_json::from_str(body).map_err(|e| MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to parse chart response: {}", e),
        })?;

    if let Some(error) = response.chart.error {
        debug!(
            "Yahoo chart error for {}: {} {:?}",
            request.provider_symbol, error.code, error.description
        );
        if error.code.eq_ignore_ascii_case("Not Found") {
            return Err(MarketDataError::SymbolNotFound {
                symbol: request.provider_symbol.to_string(),
                provider: PROVIDER_ID.to_string(),
            });
        }
        return Err(MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: format!(
                "{}: {}",
                error.code,
                error.description.as_deref().unwrap_or("no description")
            ),
        });
    }

    let meta = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .map(|result| result.meta)
        .ok_or_else(|| MarketDataError::SymbolNotFound {
            symbol: request.provider_symbol.to_string(),
            provider: PROVIDER_ID.to_string(),
        })?;

    meta_to_quote(meta, request)
}

fn meta_to_quote(meta: YahooChartMeta, request: &QuoteRequest) -> Result<Quote, MarketDataError> {
    let price = meta
        .regular_market_price
        .and_then(price_from_f64)
        .ok_or_else(|| MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: format!("No market price for {}", request.provider_symbol),
        })?;

    let currency = meta.currency.unwrap_or_else(|| "USD".to_string());
    let mut quote = Quote::new(request.symbol.clone(), price, currency, PROVIDER_ID);

    if let Some(prev) = meta
        .chart_previous_close
        .or(meta.previous_close)
        .and_then(price_from_f64)
    {
        quote = quote.with_previous_close(prev);
    }

    if let Some(market_time) = meta
        .regular_market_time
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
    {
        quote = quote.with_market_time(market_time);
    }

    Ok(quote)
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        2
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            markets: &[],
            supports_previous_close: true,
        }
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 120,
            burst: 20,
        }
    }

    async fn get_latest_quote(&self, request: &QuoteRequest) -> Result<Quote, MarketDataError> {
        let body = self.fetch(request).await?;
        parse_chart(&body, request)
    }
}
