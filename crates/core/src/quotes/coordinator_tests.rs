//! Tests for the fetch coordinator against scripted quote providers.

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use shareprofit_market_data::{
    CircuitBreaker, CircuitBreakerConfig, ErrorKind, MarketDataError, ProviderCapabilities,
    ProviderChain, Quote, QuoteProvider, QuoteRequest, QuoteValidator, RateLimit, SuffixResolver,
    Symbol,
};

use super::*;

// =============================================================================
// Scripted provider
// =============================================================================

#[derive(Default)]
struct ScriptedProvider {
    id: &'static str,
    delay: Duration,
    failing: HashSet<String>,
    not_found: HashSet<String>,
    hanging: HashSet<String>,
    panicking: HashSet<String>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedProvider {
    fn new(id: &'static str) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn failing(mut self, symbols: &[&str]) -> Self {
        self.failing = symbols.iter().map(|s| s.to_string()).collect();
        self
    }

    fn not_found(mut self, symbols: &[&str]) -> Self {
        self.not_found = symbols.iter().map(|s| s.to_string()).collect();
        self
    }

    fn hanging(mut self, symbols: &[&str]) -> Self {
        self.hanging = symbols.iter().map(|s| s.to_string()).collect();
        self
    }

    fn panicking(mut self, symbols: &[&str]) -> Self {
        self.panicking = symbols.iter().map(|s| s.to_string()).collect();
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Keeps the in-flight gauge right even when a fetch is cancelled by timeout.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl QuoteProvider for ScriptedProvider {
    fn id(&self) -> &'static str {
        self.id
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            markets: &[],
            supports_previous_close: false,
        }
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 600_000,
            burst: 10_000,
        }
    }

    async fn get_latest_quote(&self, request: &QuoteRequest) -> Result<Quote, MarketDataError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let symbol = request.provider_symbol.to_string();

        if self.hanging.contains(&symbol) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.panicking.contains(&symbol) {
            panic!("scripted provider blew up on {}", symbol);
        }
        if self.failing.contains(&symbol) {
            return Err(MarketDataError::ProviderError {
                provider: self.id.to_string(),
                message: "HTTP 503".to_string(),
            });
        }
        if self.not_found.contains(&symbol) {
            return Err(MarketDataError::SymbolNotFound {
                symbol,
                provider: self.id.to_string(),
            });
        }

        // Every call yields a new price so re-fetches are observable.
        let price = Decimal::from(100 + call as i64);
        Ok(Quote::new(request.symbol.clone(), price, "INR", self.id))
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn chain_of(providers: Vec<Arc<ScriptedProvider>>) -> Arc<ProviderChain> {
    let providers: Vec<Arc<dyn QuoteProvider>> = providers
        .into_iter()
        .map(|p| p as Arc<dyn QuoteProvider>)
        .collect();
    Arc::new(ProviderChain::with_config(
        providers,
        Arc::new(SuffixResolver::with_default_suffix("")),
        CircuitBreaker::with_config(CircuitBreakerConfig {
            failure_threshold: 10_000,
            ..Default::default()
        }),
        QuoteValidator::new(),
    ))
}

fn coordinator_with(
    providers: Vec<Arc<ScriptedProvider>>,
    cache: Arc<QuoteCache>,
) -> FetchCoordinator {
    FetchCoordinator::new(chain_of(providers), cache, Duration::from_secs(60))
}

fn coordinator(provider: Arc<ScriptedProvider>) -> FetchCoordinator {
    coordinator_with(vec![provider], Arc::new(QuoteCache::new()))
}

fn symbols(names: &[&str]) -> Vec<Symbol> {
    names.iter().map(|s| Symbol::parse(s).unwrap()).collect()
}

fn numbered(count: usize) -> Vec<Symbol> {
    (0..count)
        .map(|i| Symbol::parse(&format!("SYM{}", i)).unwrap())
        .collect()
}

const TIMEOUT: Duration = Duration::from_secs(2);

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_every_symbol_gets_exactly_one_result() {
    let provider = Arc::new(ScriptedProvider::new("MOCK").failing(&["B"]).not_found(&["C"]));
    let coordinator = coordinator(provider);
    let request = symbols(&["A", "B", "C", "D"]);

    let outcome = coordinator.refresh(&request, 4, TIMEOUT).await.unwrap();

    let keys: BTreeSet<Symbol> = outcome.results.keys().cloned().collect();
    assert_eq!(keys, request.iter().cloned().collect::<BTreeSet<_>>());
    assert_eq!(outcome.summary.succeeded, 2);
    assert_eq!(outcome.summary.failed, 2);
}

#[tokio::test]
async fn test_fresh_cache_entry_skips_provider() {
    let provider = Arc::new(ScriptedProvider::new("MOCK"));
    let cache = Arc::new(QuoteCache::new());
    let tcs = Symbol::parse("TCS").unwrap();
    cache.put(
        tcs.clone(),
        Quote::new(tcs.clone(), dec!(3580.40), "INR", "EARLIER"),
        Duration::from_secs(60),
    );
    let coordinator = coordinator_with(vec![provider.clone()], cache);

    let outcome = coordinator.refresh(&[tcs.clone()], 2, TIMEOUT).await.unwrap();

    assert_eq!(provider.calls(), 0);
    let result = &outcome.results[&tcs];
    assert!(result.from_cache);
    assert_eq!(result.quote().unwrap().price, dec!(3580.40));
    assert_eq!(outcome.summary.cache_hits, 1);
    assert_eq!(outcome.summary.succeeded, 0);
}

#[tokio::test]
async fn test_expired_entry_is_refetched() {
    let provider = Arc::new(ScriptedProvider::new("MOCK"));
    let clock = Arc::new(ManualClock::default());
    let cache = Arc::new(QuoteCache::with_clock(clock.clone(), 100));
    let coordinator = FetchCoordinator::new(
        chain_of(vec![provider.clone()]),
        cache.clone(),
        Duration::from_secs(1),
    );
    let request = symbols(&["INFY"]);

    coordinator.refresh(&request, 1, TIMEOUT).await.unwrap();
    assert_eq!(provider.calls(), 1);

    clock.advance(Duration::from_millis(1001));
    assert!(cache.get(&request[0]).is_none());

    let outcome = coordinator.refresh(&request, 1, TIMEOUT).await.unwrap();
    assert_eq!(provider.calls(), 2);
    assert!(!outcome.results[&request[0]].from_cache);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_in_flight_fetches_bounded_by_max_concurrency() {
    let provider = Arc::new(ScriptedProvider::new("MOCK").with_delay(Duration::from_millis(20)));
    let coordinator = coordinator(provider.clone());

    let outcome = coordinator
        .refresh(&numbered(50), 5, TIMEOUT)
        .await
        .unwrap();

    assert_eq!(outcome.summary.succeeded, 50);
    assert_eq!(provider.calls(), 50);
    let max = provider.max_in_flight.load(Ordering::SeqCst);
    assert!(max <= 5, "observed {} concurrent fetches", max);
    assert!(max > 1, "fetches never overlapped");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_partial_failure_is_isolated() {
    let provider = Arc::new(
        ScriptedProvider::new("MOCK")
            .with_delay(Duration::from_millis(5))
            .failing(&["SYM2", "SYM5", "SYM7"]),
    );
    let coordinator = coordinator(provider);

    let outcome = coordinator.refresh(&numbered(10), 10, TIMEOUT).await.unwrap();

    assert_eq!(outcome.summary.failed, 3);
    assert_eq!(outcome.summary.succeeded, 7);
    for name in ["SYM2", "SYM5", "SYM7"] {
        let failure = outcome.results[&Symbol::parse(name).unwrap()]
            .failure()
            .unwrap();
        assert_eq!(failure.kind, ErrorKind::Unavailable);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_hanging_source_times_out_alone() {
    let provider = Arc::new(ScriptedProvider::new("MOCK").hanging(&["SLOW"]));
    let coordinator = coordinator(provider);
    let timeout = Duration::from_millis(200);
    let request = symbols(&["SLOW", "FAST1", "FAST2"]);

    let started = Instant::now();
    let outcome = coordinator.refresh(&request, 3, timeout).await.unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed >= timeout);
    assert!(elapsed < timeout + Duration::from_millis(500), "took {:?}", elapsed);

    let slow = outcome.results[&request[0]].failure().unwrap();
    assert_eq!(slow.kind, ErrorKind::Timeout);
    assert!(outcome.results[&request[1]].is_success());
    assert!(outcome.results[&request[2]].is_success());
}

#[tokio::test]
async fn test_immediate_second_refresh_is_served_from_cache() {
    let provider = Arc::new(ScriptedProvider::new("MOCK").failing(&["BAD"]));
    let coordinator = coordinator(provider.clone());
    let request = symbols(&["A", "B", "C", "BAD"]);

    let first = coordinator.refresh(&request, 4, TIMEOUT).await.unwrap();
    let calls_after_first = provider.calls();
    let second = coordinator.refresh(&request, 4, TIMEOUT).await.unwrap();

    assert_eq!(second.summary.cache_hits, first.summary.succeeded);
    // Only the failed symbol is fetched again.
    assert_eq!(provider.calls(), calls_after_first + 1);

    for symbol in symbols(&["A", "B", "C"]) {
        assert_eq!(
            first.results[&symbol].quote().unwrap().price,
            second.results[&symbol].quote().unwrap().price
        );
        assert!(second.results[&symbol].from_cache);
    }
}

#[tokio::test]
async fn test_panicking_source_is_contained() {
    let provider = Arc::new(ScriptedProvider::new("MOCK").panicking(&["BOOM"]));
    let coordinator = coordinator(provider);
    let request = symbols(&["BOOM", "OK"]);

    let outcome = coordinator.refresh(&request, 2, TIMEOUT).await.unwrap();

    assert_eq!(
        outcome.results[&request[0]].failure().unwrap().kind,
        ErrorKind::Fatal
    );
    assert!(outcome.results[&request[1]].is_success());
}

#[tokio::test]
async fn test_fallback_to_second_provider() {
    let primary = Arc::new(ScriptedProvider::new("PRIMARY").failing(&["TCS"]));
    let backup = Arc::new(ScriptedProvider::new("BACKUP"));
    let coordinator = coordinator_with(
        vec![primary.clone(), backup.clone()],
        Arc::new(QuoteCache::new()),
    );
    let request = symbols(&["TCS", "INFY"]);

    let outcome = coordinator.refresh(&request, 2, TIMEOUT).await.unwrap();

    assert_eq!(outcome.results[&request[0]].quote().unwrap().source, "BACKUP");
    assert_eq!(outcome.results[&request[1]].quote().unwrap().source, "PRIMARY");
    assert_eq!(backup.calls(), 1);
}

#[tokio::test]
async fn test_not_found_reported_when_no_source_knows_symbol() {
    let primary = Arc::new(ScriptedProvider::new("PRIMARY").not_found(&["NOPE"]));
    let backup = Arc::new(ScriptedProvider::new("BACKUP").not_found(&["NOPE"]));
    let coordinator = coordinator_with(vec![primary, backup], Arc::new(QuoteCache::new()));
    let request = symbols(&["NOPE"]);

    let outcome = coordinator.refresh(&request, 1, TIMEOUT).await.unwrap();
    assert_eq!(
        outcome.results[&request[0]].failure().unwrap().kind,
        ErrorKind::NotFound
    );
}

#[tokio::test]
async fn test_successful_fetch_is_cached_immediately() {
    let provider = Arc::new(ScriptedProvider::new("MOCK"));
    let cache = Arc::new(QuoteCache::new());
    let coordinator = coordinator_with(vec![provider], cache.clone());
    let request = symbols(&["HDFCBANK", "ICICIBANK"]);

    coordinator.refresh(&request, 2, TIMEOUT).await.unwrap();

    assert_eq!(cache.stats().size, 2);
    assert!(cache.get(&request[0]).is_some());
}

#[tokio::test]
async fn test_huge_ttl_keeps_successes() {
    let provider = Arc::new(ScriptedProvider::new("MOCK"));
    let cache = Arc::new(QuoteCache::new());
    let coordinator = FetchCoordinator::new(
        chain_of(vec![provider]),
        cache.clone(),
        Duration::from_secs(9_000_000_000_000),
    );
    let request = symbols(&["RELIANCE", "SBIN"]);

    let outcome = coordinator.refresh(&request, 2, TIMEOUT).await.unwrap();

    assert_eq!(outcome.summary.succeeded, 2);
    assert_eq!(outcome.summary.failed, 0);
    assert!(outcome.results.values().all(|r| r.quote().is_some()));
    assert_eq!(cache.stats().size, 2);
}

#[tokio::test]
async fn test_duplicate_symbols_fetched_once() {
    let provider = Arc::new(ScriptedProvider::new("MOCK"));
    let coordinator = coordinator(provider.clone());
    let request = symbols(&["ITC", "itc", "ITC "]);

    let outcome = coordinator.refresh(&request, 3, TIMEOUT).await.unwrap();

    assert_eq!(provider.calls(), 1);
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.summary.requested.len(), 1);
}

#[tokio::test]
async fn test_invalid_requests_rejected() {
    let coordinator = coordinator(Arc::new(ScriptedProvider::new("MOCK")));

    let empty = coordinator.refresh(&[], 5, TIMEOUT).await.unwrap_err();
    assert!(matches!(empty, RefreshError::InvalidRequest(_)));
    assert_eq!(empty.kind(), ErrorKind::Fatal);

    let request = symbols(&["A"]);
    assert!(coordinator.refresh(&request, 0, TIMEOUT).await.is_err());
    assert!(coordinator
        .refresh(&request, 1, Duration::ZERO)
        .await
        .is_err());
}

#[tokio::test]
async fn test_progress_reaches_total() {
    let provider = Arc::new(ScriptedProvider::new("MOCK"));
    let cache = Arc::new(QuoteCache::new());
    let cached = Symbol::parse("CACHED").unwrap();
    cache.put(
        cached.clone(),
        Quote::new(cached.clone(), dec!(1), "INR", "EARLIER"),
        Duration::from_secs(60),
    );
    let coordinator = coordinator_with(vec![provider], cache);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let progress: ProgressCallback = Arc::new(move |done, total| {
        sink.lock().unwrap().push((done, total));
    });

    let mut request = numbered(4);
    request.push(cached);
    coordinator
        .refresh_symbols(&request, 2, TIMEOUT, Some(progress))
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.first(), Some(&(1, 5)));
    assert_eq!(seen.last(), Some(&(5, 5)));
    assert_eq!(seen.len(), 5);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_result_keys_match_request(
        names in proptest::collection::vec("[A-Z]{1,6}", 1..25),
        fail_every in 2usize..6,
    ) {
        let failing: Vec<&str> = names
            .iter()
            .enumerate()
            .filter(|(i, _)| i % fail_every == 0)
            .map(|(_, n)| n.as_str())
            .collect();
        let provider = Arc::new(ScriptedProvider::new("MOCK").failing(&failing));
        let coordinator = coordinator(provider);
        let request: Vec<Symbol> = names.iter().map(|n| Symbol::parse(n).unwrap()).collect();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let outcome = runtime
            .block_on(coordinator.refresh(&request, 4, TIMEOUT))
            .unwrap();

        let keys: BTreeSet<Symbol> = outcome.results.keys().cloned().collect();
        let expected: BTreeSet<Symbol> = request.into_iter().collect();
        prop_assert_eq!(&keys, &expected);

        let summary = outcome.summary;
        prop_assert_eq!(
            summary.cache_hits + summary.succeeded + summary.failed,
            expected.len()
        );
    }
}
