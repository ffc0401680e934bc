//! Ordered provider fallback for a single symbol.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};

use super::{
    CircuitBreaker, FetchDiagnostics, QuoteValidator, RateLimitConfig, RateLimiter, SkipReason,
};
use crate::errors::{ErrorKind, MarketDataError, RetryClass};
use crate::models::{ProviderId, Quote, QuoteRequest, Symbol};
use crate::provider::QuoteProvider;
use crate::resolver::SymbolResolver;

/// Walks providers in fallback order until one returns a valid quote.
///
/// The chain is safe to share between concurrent fetches; throttling and
/// circuit state are tracked per provider across all of them.
pub struct ProviderChain {
    providers: Vec<Arc<dyn QuoteProvider>>,
    resolver: Arc<dyn SymbolResolver>,
    rate_limiter: RateLimiter,
    circuit_breaker: CircuitBreaker,
    validator: QuoteValidator,
}

impl ProviderChain {
    /// Chain ordered by provider priority.
    pub fn new(providers: Vec<Arc<dyn QuoteProvider>>, resolver: Arc<dyn SymbolResolver>) -> Self {
        Self::with_config(
            providers,
            resolver,
            CircuitBreaker::new(),
            QuoteValidator::new(),
        )
    }

    pub fn with_config(
        mut providers: Vec<Arc<dyn QuoteProvider>>,
        resolver: Arc<dyn SymbolResolver>,
        circuit_breaker: CircuitBreaker,
        validator: QuoteValidator,
    ) -> Self {
        providers.sort_by_key(|p| p.priority());

        let rate_limiter = RateLimiter::new();
        for provider in &providers {
            rate_limiter.configure(
                &Cow::Borrowed(provider.id()),
                RateLimitConfig::from(provider.rate_limit()),
            );
        }

        Self {
            providers,
            resolver,
            rate_limiter,
            circuit_breaker,
            validator,
        }
    }

    /// Put the named providers first, in the given order.
    ///
    /// Providers not named keep their priority order after the named ones.
    /// Unknown names are ignored.
    pub fn with_order(mut self, order: &[String]) -> Self {
        for id in order {
            if !self.providers.iter().any(|p| p.id().eq_ignore_ascii_case(id)) {
                warn!("Ignoring unknown provider '{}' in fallback order", id);
            }
        }

        let rank = |provider: &Arc<dyn QuoteProvider>| {
            order
                .iter()
                .position(|id| provider.id().eq_ignore_ascii_case(id))
                .unwrap_or(order.len())
        };
        self.providers.sort_by_key(|p| (rank(p), p.priority()));

        info!(
            "Quote provider order: {}",
            self.provider_ids().join(" -> ")
        );
        self
    }

    pub fn provider_ids(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    /// Fetch a quote, returning only the outcome.
    pub async fn fetch_latest_quote(
        &self,
        symbol: &Symbol,
        deadline: Instant,
    ) -> Result<Quote, MarketDataError> {
        self.fetch_with_diagnostics(symbol, deadline).await.0
    }

    /// Fetch a quote, trying each provider in order.
    ///
    /// Failover happens on transient errors and on unknown-symbol errors. The
    /// returned error is the most actionable one seen: a transient failure
    /// anywhere in the chain wins over "not found" from another provider.
    pub async fn fetch_with_diagnostics(
        &self,
        symbol: &Symbol,
        deadline: Instant,
    ) -> (Result<Quote, MarketDataError>, FetchDiagnostics) {
        let mut diagnostics = FetchDiagnostics::new();
        let mut last_error: Option<MarketDataError> = None;

        for provider in &self.providers {
            let provider_id: ProviderId = Cow::Borrowed(provider.id());

            if Instant::now() >= deadline {
                return (Err(MarketDataError::DeadlineExceeded), diagnostics);
            }

            let resolved = match self.resolver.resolve(&provider_id, symbol) {
                Ok(resolved) => resolved,
                Err(e) => {
                    debug!("{} cannot resolve {}: {}", provider_id, symbol, e);
                    diagnostics.record_skip(
                        provider_id,
                        SkipReason::ResolutionFailed {
                            message: e.to_string(),
                        },
                    );
                    remember(&mut last_error, e);
                    continue;
                }
            };

            if !provider.capabilities().covers(resolved.market.as_deref()) {
                diagnostics.record_skip(
                    provider_id,
                    SkipReason::MarketNotCovered {
                        market: resolved.market,
                    },
                );
                continue;
            }

            if !self.circuit_breaker.is_allowed(&provider_id) {
                debug!("Skipping {} for {}: circuit open", provider_id, symbol);
                diagnostics.record_skip(provider_id.clone(), SkipReason::CircuitBreakerOpen);
                remember(
                    &mut last_error,
                    MarketDataError::CircuitOpen {
                        provider: provider_id.to_string(),
                    },
                );
                continue;
            }

            self.rate_limiter.acquire(&provider_id).await;

            let request = QuoteRequest::new(symbol.clone(), resolved.provider_symbol, deadline);
            match provider.get_latest_quote(&request).await {
                Ok(quote) => {
                    self.circuit_breaker.record_success(&provider_id);

                    if let Err(e) = self.validator.validate(&quote) {
                        warn!("Discarding quote for {} from {}: {}", symbol, provider_id, e);
                        diagnostics.record_error(provider_id, e.to_string());
                        remember(&mut last_error, e);
                        continue;
                    }

                    diagnostics.record_success(provider_id);
                    return (Ok(quote), diagnostics);
                }
                Err(e) => {
                    diagnostics.record_error(provider_id.clone(), e.to_string());

                    match e.retry_class() {
                        RetryClass::Never => return (Err(e), diagnostics),
                        RetryClass::FailoverWithPenalty => {
                            warn!("{} failed for {}: {}", provider_id, symbol, e);
                            self.circuit_breaker.record_failure(&provider_id);
                        }
                        RetryClass::NextProvider | RetryClass::CircuitOpen => {
                            debug!("{} could not serve {}: {}", provider_id, symbol, e);
                        }
                    }
                    remember(&mut last_error, e);
                }
            }
        }

        debug!("No quote for {}: {}", symbol, diagnostics.summary());
        let error = last_error.unwrap_or(MarketDataError::NoProvidersAvailable);
        (Err(error), diagnostics)
    }
}

/// Keep the most useful error: anything transient beats "not found".
fn remember(slot: &mut Option<MarketDataError>, error: MarketDataError) {
    let replace = match slot {
        None => true,
        Some(existing) => {
            existing.kind() == ErrorKind::NotFound || error.kind() != ErrorKind::NotFound
        }
    };
    if replace {
        *slot = Some(error);
    }
}
