//! Concurrent quote fetching for a set of symbols.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use log::{debug, error, info};

use shareprofit_market_data::{ErrorKind, ProviderChain, Symbol};

use super::cache::QuoteCache;
use super::errors::RefreshError;
use super::model::{FetchResult, RefreshOutcome, RefreshSummary};

/// Called with `(completed, total)` each time a symbol settles.
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Seam between the orchestrator and the fetch machinery.
#[async_trait]
pub trait RefreshCoordinator: Send + Sync {
    async fn refresh_symbols(
        &self,
        symbols: &[Symbol],
        max_concurrency: usize,
        per_request_timeout: Duration,
        progress: Option<ProgressCallback>,
    ) -> Result<RefreshOutcome, RefreshError>;
}

/// Fetches quotes for many symbols at once.
///
/// Fresh cache entries are served directly. The rest go through the provider
/// chain with at most `max_concurrency` fetches in flight. Each fetch runs as
/// its own task under its own timeout, so one slow, failing or panicking
/// source never affects another symbol.
pub struct FetchCoordinator {
    chain: Arc<ProviderChain>,
    cache: Arc<QuoteCache>,
    ttl: Duration,
}

impl FetchCoordinator {
    pub fn new(chain: Arc<ProviderChain>, cache: Arc<QuoteCache>, ttl: Duration) -> Self {
        Self { chain, cache, ttl }
    }

    pub fn cache(&self) -> &Arc<QuoteCache> {
        &self.cache
    }

    pub async fn refresh(
        &self,
        symbols: &[Symbol],
        max_concurrency: usize,
        per_request_timeout: Duration,
    ) -> Result<RefreshOutcome, RefreshError> {
        self.refresh_with_progress(symbols, max_concurrency, per_request_timeout, |_, _| {})
            .await
    }

    /// Refresh `symbols`, reporting `(completed, total)` as results settle.
    ///
    /// Cache hits count as completed before any fetch starts. Duplicate
    /// symbols are fetched once.
    pub async fn refresh_with_progress<F>(
        &self,
        symbols: &[Symbol],
        max_concurrency: usize,
        per_request_timeout: Duration,
        on_progress: F,
    ) -> Result<RefreshOutcome, RefreshError>
    where
        F: Fn(usize, usize) + Send + Sync,
    {
        if symbols.is_empty() {
            return Err(RefreshError::InvalidRequest(
                "no symbols to refresh".to_string(),
            ));
        }
        if max_concurrency == 0 {
            return Err(RefreshError::InvalidRequest(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if per_request_timeout.is_zero() {
            return Err(RefreshError::InvalidRequest(
                "per-request timeout must be positive".to_string(),
            ));
        }

        let started = Instant::now();
        let requested: BTreeSet<Symbol> = symbols.iter().cloned().collect();
        let total = requested.len();

        let mut seen = HashSet::with_capacity(total);
        let mut results: HashMap<Symbol, FetchResult> = HashMap::with_capacity(total);
        let mut pending = Vec::new();

        for symbol in symbols {
            if !seen.insert(symbol) {
                continue;
            }
            match self.cache.get(symbol) {
                Some(quote) => {
                    results.insert(symbol.clone(), FetchResult::cached(symbol.clone(), quote));
                }
                None => pending.push(symbol.clone()),
            }
        }

        let cache_hits = results.len();
        debug!(
            "Refreshing {} symbols: {} cached, {} to fetch (concurrency {}, timeout {:?})",
            total,
            cache_hits,
            pending.len(),
            max_concurrency,
            per_request_timeout
        );
        on_progress(cache_hits, total);

        let mut succeeded = 0;
        let mut failed = 0;
        let mut fetches = stream::iter(
            pending
                .into_iter()
                .map(|symbol| self.fetch_one(symbol, per_request_timeout)),
        )
        .buffer_unordered(max_concurrency);

        while let Some(result) = fetches.next().await {
            if result.is_success() {
                succeeded += 1;
            } else {
                failed += 1;
            }
            results.insert(result.symbol.clone(), result);
            on_progress(results.len(), total);
        }

        let summary = RefreshSummary {
            requested,
            succeeded,
            failed,
            cache_hits,
            elapsed: started.elapsed(),
        };
        info!("{}", summary.status_line());

        Ok(RefreshOutcome { results, summary })
    }

    /// One symbol's fetch, spawned so a panicking provider stays contained.
    ///
    /// The timeout starts when the fetch is dispatched, not when it was queued,
    /// and covers fallback providers and rate limiter waits.
    async fn fetch_one(&self, symbol: Symbol, timeout: Duration) -> FetchResult {
        let chain = Arc::clone(&self.chain);
        let cache = Arc::clone(&self.cache);
        let ttl = self.ttl;
        let task_symbol = symbol.clone();

        let task = tokio::spawn(async move {
            let deadline = Instant::now() + timeout;
            let fetch = chain.fetch_with_diagnostics(&task_symbol, deadline);

            match tokio::time::timeout(timeout, fetch).await {
                Ok((Ok(quote), _)) => {
                    cache.put(task_symbol.clone(), quote.clone(), ttl);
                    FetchResult::fetched(task_symbol, quote)
                }
                Ok((Err(e), diagnostics)) => {
                    debug!("Fetch failed for {}: {}", task_symbol, diagnostics.summary());
                    let kind = e.kind();
                    FetchResult::failed(task_symbol, kind, e.to_string())
                }
                Err(_) => FetchResult::failed(
                    task_symbol,
                    ErrorKind::Timeout,
                    format!("No quote within {:?}", timeout),
                ),
            }
        });

        match task.await {
            Ok(result) => result,
            Err(join_error) => {
                error!("Quote fetch task for {} died: {}", symbol, join_error);
                FetchResult::failed(
                    symbol,
                    ErrorKind::Fatal,
                    format!("Fetch task failed: {}", join_error),
                )
            }
        }
    }
}

#[async_trait]
impl RefreshCoordinator for FetchCoordinator {
    async fn refresh_symbols(
        &self,
        symbols: &[Symbol],
        max_concurrency: usize,
        per_request_timeout: Duration,
        progress: Option<ProgressCallback>,
    ) -> Result<RefreshOutcome, RefreshError> {
        match progress {
            Some(callback) => {
                self.refresh_with_progress(symbols, max_concurrency, per_request_timeout, |done, total| {
                    callback(done, total)
                })
                .await
            }
            None => self.refresh(symbols, max_concurrency, per_request_timeout).await,
        }
    }
}
