//! Refresh cycles driven from the UI thread.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use futures::FutureExt;
use log::{debug, error, info, warn};
use tokio::runtime::Handle;

use shareprofit_market_data::Symbol;

use super::executor::UiExecutor;
use super::listener::RefreshListener;
use super::state::{PortfolioState, RefreshReport, RefreshState, TriggerOutcome};
use crate::errors::Result;
use crate::portfolio::PortfolioStore;
use crate::quotes::{ProgressCallback, RefreshCoordinator, RefreshError, RefreshOutcome};
use crate::settings::RefreshSettings;

/// Runs refresh cycles off the UI thread and hands each result back to it.
///
/// `trigger_refresh` is called on the UI thread and returns at once. The
/// coordinator runs on the tokio runtime. When it settles, exactly one
/// completion job is posted to the [`UiExecutor`]; that job commits prices to
/// the store, updates [`PortfolioState`] and notifies the listener. A trigger
/// while a cycle is running is coalesced into it.
#[derive(Clone)]
pub struct RefreshOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    coordinator: Arc<dyn RefreshCoordinator>,
    store: Arc<dyn PortfolioStore>,
    executor: Arc<dyn UiExecutor>,
    listener: Arc<dyn RefreshListener>,
    settings: RefreshSettings,
    runtime: Handle,
    running: AtomicBool,
    phase: Mutex<RefreshState>,
    portfolio: RwLock<PortfolioState>,
}

impl RefreshOrchestrator {
    pub fn new(
        coordinator: Arc<dyn RefreshCoordinator>,
        store: Arc<dyn PortfolioStore>,
        executor: Arc<dyn UiExecutor>,
        listener: Arc<dyn RefreshListener>,
        settings: RefreshSettings,
        runtime: Handle,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                coordinator,
                store,
                executor,
                listener,
                settings,
                runtime,
                running: AtomicBool::new(false),
                phase: Mutex::new(RefreshState::Idle),
                portfolio: RwLock::new(PortfolioState::default()),
            }),
        }
    }

    /// Load positions and persisted prices so the UI has something to show
    /// before the first refresh.
    pub fn load_portfolio(&self) -> Result<()> {
        let loaded = PortfolioState::load(self.inner.store.as_ref())?;
        info!(
            "Loaded {} positions with {} stored prices",
            loaded.positions.len(),
            loaded.quotes.len()
        );
        *self.inner.write_portfolio() = loaded;
        Ok(())
    }

    pub fn state(&self) -> RefreshState {
        self.inner.phase()
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Snapshot of the UI-visible portfolio.
    pub fn portfolio(&self) -> PortfolioState {
        match self.inner.portfolio.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn trigger_refresh(&self) -> TriggerOutcome {
        if self
            .inner
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Refresh already running, trigger coalesced");
            return TriggerOutcome::AlreadyRunning;
        }

        let symbols = match self.inner.store.get_all_symbols() {
            Ok(symbols) => symbols,
            Err(e) => {
                error!("Could not read portfolio symbols: {}", e);
                let error = RefreshError::Store(e.to_string());
                self.inner.finish_failed(&error);
                return TriggerOutcome::Failed;
            }
        };
        if symbols.is_empty() {
            debug!("Portfolio is empty, nothing to refresh");
            self.inner.running.store(false, Ordering::SeqCst);
            return TriggerOutcome::NothingToRefresh;
        }

        self.inner.set_phase(RefreshState::Running);
        self.inner.listener.on_refresh_started();
        info!("Refreshing prices for {} symbols", symbols.len());

        let inner = Arc::clone(&self.inner);
        self.inner.runtime.spawn(async move {
            inner.run_cycle(symbols).await;
        });
        TriggerOutcome::Started
    }
}

impl Inner {
    fn phase(&self) -> RefreshState {
        match self.phase.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn set_phase(&self, next: RefreshState) {
        match self.phase.lock() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    fn write_portfolio(&self) -> std::sync::RwLockWriteGuard<'_, PortfolioState> {
        match self.portfolio.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    async fn run_cycle(self: Arc<Self>, symbols: Vec<Symbol>) {
        let progress: ProgressCallback = {
            let inner = Arc::clone(&self);
            Arc::new(move |completed, total| {
                let listener = Arc::clone(&inner.listener);
                let posted = inner.executor.post(Box::new(move || {
                    listener.on_refresh_progress(completed, total)
                }));
                if posted.is_err() {
                    debug!("Dropped progress update {}/{}", completed, total);
                }
            })
        };

        let refresh = self.coordinator.refresh_symbols(
            &symbols,
            self.settings.max_concurrency,
            self.settings.request_timeout(),
            Some(progress),
        );
        let result = match AssertUnwindSafe(refresh).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(RefreshError::Internal(panic_message(panic))),
        };

        let inner = Arc::clone(&self);
        if let Err(e) = self.executor.post(Box::new(move || inner.complete(result))) {
            warn!("Refresh result could not be delivered: {}", e);
            self.set_phase(RefreshState::Idle);
            self.running.store(false, Ordering::SeqCst);
        }
    }

    /// Completion job. Runs on the UI thread.
    fn complete(&self, result: std::result::Result<RefreshOutcome, RefreshError>) {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Refresh failed: {}", e);
                self.finish_failed(&e);
                return;
            }
        };

        let mut committed = 0;
        for result in outcome.results.values().filter(|r| !r.from_cache) {
            if let Some(quote) = result.quote() {
                match self.store.put_cached_price(&result.symbol, quote) {
                    Ok(()) => committed += 1,
                    Err(e) => warn!("Could not store price for {}: {}", result.symbol, e),
                }
            }
        }
        debug!("Committed {} prices to the store", committed);

        let status = if outcome.summary.failed == 0 {
            RefreshState::Succeeded
        } else {
            RefreshState::PartiallyFailed
        };

        {
            let mut portfolio = self.write_portfolio();
            match self.store.get_positions() {
                Ok(positions) => portfolio.positions = positions,
                Err(e) => warn!("Could not reload positions: {}", e),
            }
            portfolio.apply(&outcome.results, status);
        }

        let report = RefreshReport {
            status,
            summary: outcome.summary,
            results: outcome.results,
        };

        self.set_phase(RefreshState::Idle);
        self.running.store(false, Ordering::SeqCst);
        self.listener.on_refresh_completed(&report);
    }

    fn finish_failed(&self, error: &RefreshError) {
        self.write_portfolio().last_status = Some(RefreshState::Fatal);
        self.set_phase(RefreshState::Idle);
        self.running.store(false, Ordering::SeqCst);
        self.listener.on_refresh_failed(error);
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("refresh panicked: {}", message)
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("refresh panicked: {}", message)
    } else {
        "refresh panicked".to_string()
    }
}
