use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use tokio::runtime::Runtime;
use tokio::sync::Notify;

use shareprofit_market_data::{
    DemoProvider, ErrorKind, ProviderChain, Quote, QuoteProvider, SuffixResolver, Symbol,
};

use super::*;
use crate::errors::{Error, Result};
use crate::portfolio::{InMemoryPortfolioStore, NewPosition, PortfolioStore, Position};
use crate::quotes::{
    FetchCoordinator, FetchResult, ProgressCallback, QuoteCache, RefreshCoordinator,
    RefreshError, RefreshOutcome, RefreshSummary,
};
use crate::settings::RefreshSettings;

const WAIT: Duration = Duration::from_secs(5);

fn symbol(s: &str) -> Symbol {
    Symbol::parse(s).unwrap()
}

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

/// Prices every symbol at 100 except the failing ones. Optionally waits for
/// a release signal before answering.
struct FakeCoordinator {
    calls: AtomicUsize,
    failing: HashSet<String>,
    gate: Option<Arc<Notify>>,
    panics: bool,
}

impl FakeCoordinator {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failing: HashSet::new(),
            gate: None,
            panics: false,
        }
    }

    fn failing(mut self, symbols: &[&str]) -> Self {
        self.failing = symbols.iter().map(|s| s.to_string()).collect();
        self
    }

    fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RefreshCoordinator for FakeCoordinator {
    async fn refresh_symbols(
        &self,
        symbols: &[Symbol],
        _max_concurrency: usize,
        _per_request_timeout: Duration,
        progress: Option<ProgressCallback>,
    ) -> std::result::Result<RefreshOutcome, RefreshError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.panics {
            panic!("coordinator blew up");
        }

        let mut results = HashMap::new();
        let mut failed = 0;
        for (done, s) in symbols.iter().enumerate() {
            let result = if self.failing.contains(s.as_str()) {
                failed += 1;
                FetchResult::failed(s.clone(), ErrorKind::Unavailable, "source down")
            } else {
                FetchResult::fetched(s.clone(), Quote::new(s.clone(), dec!(100), "INR", "FAKE"))
            };
            results.insert(s.clone(), result);
            if let Some(progress) = &progress {
                progress(done + 1, symbols.len());
            }
        }

        Ok(RefreshOutcome {
            summary: RefreshSummary {
                requested: symbols.iter().cloned().collect::<BTreeSet<_>>(),
                succeeded: symbols.len() - failed,
                failed,
                cache_hits: 0,
                elapsed: Duration::from_millis(1),
            },
            results,
        })
    }
}

#[derive(Default)]
struct RecordingListener {
    events: Mutex<Vec<String>>,
    reports: Mutex<Vec<RefreshReport>>,
    errors: Mutex<Vec<RefreshError>>,
}

impl RecordingListener {
    fn finished(&self) -> usize {
        self.reports.lock().unwrap().len() + self.errors.lock().unwrap().len()
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl RefreshListener for RecordingListener {
    fn on_refresh_started(&self) {
        self.events.lock().unwrap().push("started".to_string());
    }

    fn on_refresh_progress(&self, completed: usize, total: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("progress {}/{}", completed, total));
    }

    fn on_refresh_completed(&self, report: &RefreshReport) {
        self.events.lock().unwrap().push("completed".to_string());
        self.reports.lock().unwrap().push(report.clone());
    }

    fn on_refresh_failed(&self, error: &RefreshError) {
        self.events.lock().unwrap().push("failed".to_string());
        self.errors.lock().unwrap().push(error.clone());
    }
}

struct BrokenStore;

impl PortfolioStore for BrokenStore {
    fn get_all_symbols(&self) -> Result<Vec<Symbol>> {
        Err(Error::Repository("disk unplugged".to_string()))
    }

    fn get_positions(&self) -> Result<Vec<Position>> {
        Err(Error::Repository("disk unplugged".to_string()))
    }

    fn get_cached_price(&self, _symbol: &Symbol) -> Result<Option<Quote>> {
        Ok(None)
    }

    fn put_cached_price(&self, _symbol: &Symbol, _quote: &Quote) -> Result<()> {
        Ok(())
    }
}

fn store_with(symbols: &[&str]) -> Arc<InMemoryPortfolioStore> {
    let store = InMemoryPortfolioStore::new();
    for s in symbols {
        store
            .add_position(NewPosition {
                symbol: symbol(s),
                company_name: s.to_string(),
                quantity: dec!(10),
                purchase_price: dec!(90),
                purchase_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                broker: None,
                cash_invested: None,
            })
            .unwrap();
    }
    Arc::new(store)
}

struct Harness {
    orchestrator: RefreshOrchestrator,
    ui: UiEventLoop,
    listener: Arc<RecordingListener>,
    _runtime: Runtime,
}

fn harness(coordinator: Arc<FakeCoordinator>, store: Arc<dyn PortfolioStore>) -> Harness {
    let runtime = runtime();
    let (executor, ui) = ui_channel();
    let listener = Arc::new(RecordingListener::default());
    let orchestrator = RefreshOrchestrator::new(
        coordinator,
        store,
        Arc::new(executor),
        listener.clone(),
        RefreshSettings::default(),
        runtime.handle().clone(),
    );
    Harness {
        orchestrator,
        ui,
        listener,
        _runtime: runtime,
    }
}

#[test]
fn test_triggers_while_running_make_one_coordinator_call() {
    let gate = Arc::new(Notify::new());
    let coordinator = Arc::new(FakeCoordinator::new().gated(gate.clone()));
    let h = harness(coordinator.clone(), store_with(&["TCS", "INFY"]));

    assert_eq!(h.orchestrator.trigger_refresh(), TriggerOutcome::Started);
    assert_eq!(h.orchestrator.state(), RefreshState::Running);
    assert_eq!(h.orchestrator.trigger_refresh(), TriggerOutcome::AlreadyRunning);
    assert_eq!(h.orchestrator.trigger_refresh(), TriggerOutcome::AlreadyRunning);

    gate.notify_one();
    assert!(h.ui.run_until(WAIT, || h.listener.finished() == 1));

    assert_eq!(coordinator.calls(), 1);
    assert_eq!(h.orchestrator.state(), RefreshState::Idle);
    assert!(!h.orchestrator.is_running());

    // A new cycle can start once the previous one is delivered.
    assert_eq!(h.orchestrator.trigger_refresh(), TriggerOutcome::Started);
    gate.notify_one();
    assert!(h.ui.run_until(WAIT, || h.listener.finished() == 2));
    assert_eq!(coordinator.calls(), 2);
}

#[test]
fn test_completion_commits_quotes_to_store() {
    let store = store_with(&["TCS", "INFY"]);
    let h = harness(Arc::new(FakeCoordinator::new()), store.clone());

    assert_eq!(h.orchestrator.trigger_refresh(), TriggerOutcome::Started);
    assert!(h.ui.run_until(WAIT, || h.listener.finished() == 1));

    let stored = store.get_cached_price(&symbol("TCS")).unwrap().unwrap();
    assert_eq!(stored.price, dec!(100));

    let portfolio = h.orchestrator.portfolio();
    assert_eq!(portfolio.quotes.len(), 2);
    assert_eq!(portfolio.positions.len(), 2);
    assert_eq!(portfolio.last_status, Some(RefreshState::Succeeded));

    let report = h.listener.reports.lock().unwrap()[0].clone();
    assert_eq!(report.status, RefreshState::Succeeded);
    assert_eq!(report.results.len(), 2);

    let events = h.listener.events();
    assert_eq!(events.first().map(String::as_str), Some("started"));
    assert_eq!(events.last().map(String::as_str), Some("completed"));
    assert!(events.iter().any(|e| e == "progress 2/2"));
}

#[test]
fn test_partial_failure_keeps_good_prices() {
    let store = store_with(&["TCS", "INFY", "SBIN"]);
    let coordinator = Arc::new(FakeCoordinator::new().failing(&["SBIN"]));
    let h = harness(coordinator, store.clone());

    h.orchestrator.trigger_refresh();
    assert!(h.ui.run_until(WAIT, || h.listener.finished() == 1));

    let report = h.listener.reports.lock().unwrap()[0].clone();
    assert_eq!(report.status, RefreshState::PartiallyFailed);
    assert_eq!(report.failed_symbols(), vec![&symbol("SBIN")]);

    assert!(store.get_cached_price(&symbol("SBIN")).unwrap().is_none());
    assert!(store.get_cached_price(&symbol("INFY")).unwrap().is_some());

    let portfolio = h.orchestrator.portfolio();
    assert_eq!(portfolio.failure_kind(&symbol("SBIN")), Some(ErrorKind::Unavailable));
    let summary = portfolio.summary(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    assert_eq!(summary.priced_count, 2);
    assert_eq!(summary.current_value, dec!(2000));
    assert_eq!(summary.total_investment, dec!(2700));
}

#[test]
fn test_empty_portfolio_is_not_refreshed() {
    let coordinator = Arc::new(FakeCoordinator::new());
    let h = harness(coordinator.clone(), Arc::new(InMemoryPortfolioStore::new()));

    assert_eq!(h.orchestrator.trigger_refresh(), TriggerOutcome::NothingToRefresh);
    assert_eq!(h.orchestrator.state(), RefreshState::Idle);
    assert!(!h.orchestrator.is_running());
    assert_eq!(coordinator.calls(), 0);
    assert!(h.listener.events().is_empty());
}

#[test]
fn test_store_failure_is_reported_as_fatal() {
    let coordinator = Arc::new(FakeCoordinator::new());
    let h = harness(coordinator.clone(), Arc::new(BrokenStore));

    assert_eq!(h.orchestrator.trigger_refresh(), TriggerOutcome::Failed);
    assert_eq!(coordinator.calls(), 0);
    assert!(!h.orchestrator.is_running());

    let errors = h.listener.errors.lock().unwrap().clone();
    assert!(matches!(errors.as_slice(), [RefreshError::Store(_)]));
    assert_eq!(errors[0].kind(), ErrorKind::Fatal);
    assert_eq!(h.orchestrator.portfolio().last_status, Some(RefreshState::Fatal));
}

#[test]
fn test_coordinator_panic_becomes_failure_notification() {
    let coordinator = Arc::new(FakeCoordinator::new().panicking());
    let h = harness(coordinator, store_with(&["TCS"]));

    assert_eq!(h.orchestrator.trigger_refresh(), TriggerOutcome::Started);
    assert!(h.ui.run_until(WAIT, || h.listener.finished() == 1));

    let errors = h.listener.errors.lock().unwrap().clone();
    match errors.as_slice() {
        [RefreshError::Internal(message)] => assert!(message.contains("coordinator blew up")),
        other => panic!("unexpected errors: {:?}", other),
    }
    assert_eq!(h.orchestrator.state(), RefreshState::Idle);
    assert!(!h.orchestrator.is_running());
}

#[test]
fn test_rejected_configuration_is_reported_as_fatal() {
    let runtime = runtime();
    let store = store_with(&["TCS", "ITC"]);
    let providers: Vec<Arc<dyn QuoteProvider>> = vec![Arc::new(DemoProvider::fixed())];
    let coordinator = Arc::new(FetchCoordinator::new(
        Arc::new(ProviderChain::new(providers, Arc::new(SuffixResolver::new()))),
        Arc::new(QuoteCache::new()),
        Duration::from_secs(60),
    ));
    let (executor, ui) = ui_channel();
    let listener = Arc::new(RecordingListener::default());
    let orchestrator = RefreshOrchestrator::new(
        coordinator,
        store.clone(),
        Arc::new(executor),
        listener.clone(),
        RefreshSettings {
            max_concurrency: 0,
            ..RefreshSettings::default()
        },
        runtime.handle().clone(),
    );

    assert_eq!(orchestrator.trigger_refresh(), TriggerOutcome::Started);
    assert!(ui.run_until(WAIT, || listener.finished() == 1));

    let errors = listener.errors.lock().unwrap().clone();
    assert!(matches!(errors.as_slice(), [RefreshError::InvalidRequest(_)]));
    assert_eq!(errors[0].kind(), ErrorKind::Fatal);
    assert!(listener.reports.lock().unwrap().is_empty());
    assert_eq!(orchestrator.state(), RefreshState::Idle);
    assert!(!orchestrator.is_running());
    assert_eq!(orchestrator.portfolio().last_status, Some(RefreshState::Fatal));
    assert!(store.get_cached_price(&symbol("TCS")).unwrap().is_none());
}

#[test]
fn test_load_portfolio_uses_stored_prices() {
    let store = store_with(&["TCS", "ITC"]);
    store
        .put_cached_price(&symbol("TCS"), &Quote::new(symbol("TCS"), dec!(3600), "INR", "NSE"))
        .unwrap();
    let h = harness(Arc::new(FakeCoordinator::new()), store);

    h.orchestrator.load_portfolio().unwrap();

    let portfolio = h.orchestrator.portfolio();
    assert_eq!(portfolio.positions.len(), 2);
    assert_eq!(portfolio.quotes[&symbol("TCS")].price, dec!(3600));
    assert!(!portfolio.quotes.contains_key(&symbol("ITC")));
    assert!(portfolio.last_updated.is_some());
    assert_eq!(portfolio.last_status, None);
}

#[test]
fn test_progress_and_completion_arrive_on_ui_thread() {
    let runtime = runtime();
    let ui_thread = std::thread::current().id();

    struct ThreadCheck {
        ui_thread: std::thread::ThreadId,
        wrong_thread: AtomicUsize,
        done: AtomicUsize,
    }
    impl RefreshListener for ThreadCheck {
        fn on_refresh_progress(&self, _completed: usize, _total: usize) {
            if std::thread::current().id() != self.ui_thread {
                self.wrong_thread.fetch_add(1, Ordering::SeqCst);
            }
        }
        fn on_refresh_completed(&self, _report: &RefreshReport) {
            if std::thread::current().id() != self.ui_thread {
                self.wrong_thread.fetch_add(1, Ordering::SeqCst);
            }
            self.done.fetch_add(1, Ordering::SeqCst);
        }
        fn on_refresh_failed(&self, _error: &RefreshError) {}
    }

    let check = Arc::new(ThreadCheck {
        ui_thread,
        wrong_thread: AtomicUsize::new(0),
        done: AtomicUsize::new(0),
    });
    let (executor, ui) = ui_channel();
    let orchestrator = RefreshOrchestrator::new(
        Arc::new(FakeCoordinator::new()),
        store_with(&["TCS", "INFY", "ITC"]),
        Arc::new(executor),
        check.clone(),
        RefreshSettings::default(),
        runtime.handle().clone(),
    );

    orchestrator.trigger_refresh();
    assert!(ui.run_until(WAIT, || check.done.load(Ordering::SeqCst) == 1));
    assert_eq!(check.wrong_thread.load(Ordering::SeqCst), 0);
}
