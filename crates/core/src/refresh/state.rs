use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use log::warn;
use serde::Serialize;

use shareprofit_market_data::{ErrorKind, Quote, Symbol};

use crate::errors::Result;
use crate::portfolio::{summarize, value_positions, PortfolioStore, PortfolioSummary, Position, PositionValuation};
use crate::quotes::{FetchFailure, FetchResult, RefreshSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefreshState {
    Idle,
    Running,
    /// Every symbol has a quote.
    Succeeded,
    /// At least one symbol failed; the rest were updated.
    PartiallyFailed,
    /// No results at all.
    Fatal,
}

impl RefreshState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RefreshState::Succeeded | RefreshState::PartiallyFailed | RefreshState::Fatal
        )
    }
}

/// What a call to `trigger_refresh` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Started,
    /// A cycle is already running; this trigger was folded into it.
    AlreadyRunning,
    /// The portfolio holds no symbols.
    NothingToRefresh,
    /// The portfolio could not be read. Listeners were notified.
    Failed,
}

/// Result of a completed cycle as handed to listeners.
#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub status: RefreshState,
    pub summary: RefreshSummary,
    pub results: HashMap<Symbol, FetchResult>,
}

impl RefreshReport {
    pub fn failed_symbols(&self) -> Vec<&Symbol> {
        let mut symbols: Vec<&Symbol> = self
            .results
            .values()
            .filter(|r| !r.is_success())
            .map(|r| &r.symbol)
            .collect();
        symbols.sort();
        symbols
    }
}

/// What the UI shows: positions with the latest known prices.
#[derive(Debug, Clone, Default)]
pub struct PortfolioState {
    pub positions: Vec<Position>,
    pub quotes: HashMap<Symbol, Quote>,
    /// Symbols whose last refresh failed. Their previous quote, if any, stays.
    pub failures: HashMap<Symbol, FetchFailure>,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_status: Option<RefreshState>,
}

impl PortfolioState {
    /// Positions plus whatever prices were persisted by earlier runs.
    pub fn load(store: &dyn PortfolioStore) -> Result<Self> {
        let positions = store.get_positions()?;
        let mut quotes = HashMap::new();
        for symbol in store.get_all_symbols()? {
            match store.get_cached_price(&symbol) {
                Ok(Some(quote)) => {
                    quotes.insert(symbol, quote);
                }
                Ok(None) => {}
                Err(e) => warn!("Could not read cached price for {}: {}", symbol, e),
            }
        }
        let last_updated = quotes.values().map(|q| q.fetched_at).max();

        Ok(Self {
            positions,
            quotes,
            failures: HashMap::new(),
            last_updated,
            last_status: None,
        })
    }

    pub fn failure_kind(&self, symbol: &Symbol) -> Option<ErrorKind> {
        self.failures.get(symbol).map(|f| f.kind)
    }

    pub fn valuations(&self, today: NaiveDate) -> Vec<PositionValuation> {
        value_positions(&self.positions, &self.quotes, today)
    }

    pub fn summary(&self, today: NaiveDate) -> PortfolioSummary {
        summarize(&self.valuations(today))
    }

    /// Fold one cycle's results in.
    pub(crate) fn apply(&mut self, results: &HashMap<Symbol, FetchResult>, status: RefreshState) {
        for result in results.values() {
            match (result.quote(), result.failure()) {
                (Some(quote), _) => {
                    self.quotes.insert(result.symbol.clone(), quote.clone());
                    self.failures.remove(&result.symbol);
                }
                (None, Some(failure)) => {
                    self.failures.insert(result.symbol.clone(), failure.clone());
                }
                (None, None) => {}
            }
        }
        self.last_updated = Some(Utc::now());
        self.last_status = Some(status);
    }
}
