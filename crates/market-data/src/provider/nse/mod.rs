//! NSE India quote provider.
//!
//! Uses the JSON API behind nseindia.com. The API only answers requests that
//! carry the cookies set by the public homepage, so the provider primes a
//! cookie session before its first quote and again whenever the API starts
//! refusing requests.

mod models;

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeZone, Utc};
use chrono_tz::Asia::Kolkata;
use reqwest::{header, Client, StatusCode};
use tracing::{debug, warn};

use self::models::NseQuoteResponse;
use super::{price_from_f64, USER_AGENT};
use crate::errors::MarketDataError;
use crate::models::{Quote, QuoteRequest};
use crate::provider::{ProviderCapabilities, QuoteProvider, RateLimit};

const BASE_URL: &str = "https://www.nseindia.com";
const PROVIDER_ID: &str = "NSE";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// NSE cookies expire after a few minutes of inactivity.
const SESSION_TTL: Duration = Duration::from_secs(300);
const LAST_UPDATE_FORMAT: &str = "%d-%b-%Y %H:%M:%S";

/// NSE India provider backed by `/api/quote-equity`.
pub struct NseProvider {
    client: Client,
    base_url: String,
    session_primed_at: Mutex<Option<Instant>>,
}

impl NseProvider {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_primed_at: Mutex::new(None),
        }
    }

    fn session_is_fresh(&self) -> bool {
        let guard = self.session_primed_at.lock().unwrap_or_else(|poisoned| {
            warn!("NSE session mutex was poisoned, recovering");
            poisoned.into_inner()
        });
        guard.is_some_and(|at| at.elapsed() < SESSION_TTL)
    }

    fn set_session(&self, primed_at: Option<Instant>) {
        let mut guard = self
            .session_primed_at
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = primed_at;
    }

    /// Visit the homepage so the client's cookie store picks up a session.
    async fn ensure_session(&self, request: &QuoteRequest) -> Result<(), MarketDataError> {
        if self.session_is_fresh() {
            return Ok(());
        }

        debug!("Priming NSE cookie session");
        let response = self
            .client
            .get(&self.base_url)
            .header(header::ACCEPT, "text/html")
            .timeout(request.remaining())
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Session setup returned HTTP {}", response.status()),
            });
        }

        self.set_session(Some(Instant::now()));
        Ok(())
    }

    async fn fetch(&self, request: &QuoteRequest) -> Result<String, MarketDataError> {
        if request.remaining().is_zero() {
            return Err(MarketDataError::Timeout {
                provider: PROVIDER_ID.to_string(),
            });
        }

        self.ensure_session(request).await?;

        let url = format!("{}/api/quote-equity", self.base_url);
        debug!("NSE request: {} symbol={}", url, request.provider_symbol);

        let response = self
            .client
            .get(&url)
            .query(&[("symbol", request.provider_symbol.as_ref())])
            .header(header::ACCEPT, "application/json")
            .header(header::REFERER, format!("{}/get-quotes/equity", self.base_url))
            .timeout(request.remaining())
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            // Stale cookies; the next request primes a fresh session.
            self.set_session(None);
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Session rejected (HTTP {})", status),
            });
        }

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
            warn!("NSE returned HTTP {} for {}", status, request.provider_symbol);
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        response.text().await.map_err(map_transport_error)
    }
}

impl Default for NseProvider {
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

/// Parse a quote-equity body. NSE answers unknown symbols with `{}`.
fn parse_quote(body: &str, request: &QuoteRequest) -> Result<Quote, MarketDataError> {
    let response: NseQuoteResponse =
        serde_json::from_str(body).map_err(|e| MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to parse quote response: {}", e),
        })?;

    let not_found = || MarketDataError::SymbolNotFound {
        symbol: request.provider_symbol.to_string(),
        provider: PROVIDER_ID.to_string(),
    };

    let price_info = response.price_info.ok_or_else(not_found)?;
    let price = price_info
        .last_price
        .and_then(price_from_f64)
        .ok_or_else(not_found)?;

    let mut quote = Quote::new(request.symbol.clone(), price, "INR", PROVIDER_ID);

    if let Some(prev) = price_info.previous_close.and_then(price_from_f64) {
        quote = quote.with_previous_close(prev);
    }

    if let Some(market_time) = response
        .metadata
        .and_then(|m| m.last_update_time)
        .and_then(|raw| NaiveDateTime::parse_from_str(&raw, LAST_UPDATE_FORMAT).ok())
        .and_then(|naive| Kolkata.from_local_datetime(&naive).single())
    {
        quote = quote.with_market_time(market_time.with_timezone(&Utc));
    }

    Ok(quote)
}

#[async_trait]
impl QuoteProvider for NseProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        1
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            markets: &["NS"],
            supports_previous_close: true,
        }
    }

    fn rate_limit(&self) -> RateLimit {
        // NSE starts returning 403s well before any documented limit.
        RateLimit {
            requests_per_minute: 90,
            burst: 10,
        }
    }

    async fn get_latest_quote(&self, request: &QuoteRequest) -> Result<Quote, MarketDataError> {
        let body = self.fetch(request).await?;
        parse_quote(&body, request)
    }
}
