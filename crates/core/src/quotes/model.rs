use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use serde::Serialize;

use shareprofit_market_data::{ErrorKind, Quote, Symbol};

/// Why a symbol has no quote this cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchFailure {
    pub kind: ErrorKind,
    /// Human readable detail, including the provider trail.
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum FetchOutcome {
    Success { quote: Quote },
    Failure(FetchFailure),
}

/// Per-symbol result of a refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResult {
    pub symbol: Symbol,
    pub outcome: FetchOutcome,
    /// The quote was served from the cache without a network call.
    pub from_cache: bool,
}

impl FetchResult {
    pub fn fetched(symbol: Symbol, quote: Quote) -> Self {
        Self {
            symbol,
            outcome: FetchOutcome::Success { quote },
            from_cache: false,
        }
    }

    pub fn cached(symbol: Symbol, quote: Quote) -> Self {
        Self {
            symbol,
            outcome: FetchOutcome::Success { quote },
            from_cache: true,
        }
    }

    pub fn failed(symbol: Symbol, kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            symbol,
            outcome: FetchOutcome::Failure(FetchFailure {
                kind,
                detail: detail.into(),
            }),
            from_cache: false,
        }
    }

    pub fn quote(&self) -> Option<&Quote> {
        match &self.outcome {
            FetchOutcome::Success { quote } => Some(quote),
            FetchOutcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FetchFailure> {
        match &self.outcome {
            FetchOutcome::Success { .. } => None,
            FetchOutcome::Failure(failure) => Some(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, FetchOutcome::Success { .. })
    }
}

/// Aggregate counts for one refresh.
///
/// `cache_hits + succeeded + failed == requested.len()`; `succeeded` counts
/// network fetches only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummary {
    pub requested: BTreeSet<Symbol>,
    pub succeeded: usize,
    pub failed: usize,
    pub cache_hits: usize,
    pub elapsed: Duration,
}

impl RefreshSummary {
    /// Quotes available after the refresh, cached or fresh.
    pub fn available(&self) -> usize {
        self.cache_hits + self.succeeded
    }

    /// Status line in the form the tracker shows after a refresh.
    pub fn status_line(&self) -> String {
        format!(
            "Updated {}/{} prices in {:.1}s ({} cached, {} failed)",
            self.available(),
            self.requested.len(),
            self.elapsed.as_secs_f64(),
            self.cache_hits,
            self.failed
        )
    }
}

/// Everything a refresh produced.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    /// Exactly one entry per requested symbol.
    pub results: HashMap<Symbol, FetchResult>,
    pub summary: RefreshSummary,
}

impl RefreshOutcome {
    pub fn failures(&self) -> impl Iterator<Item = &FetchResult> {
        self.results.values().filter(|r| !r.is_success())
    }

    pub fn quotes(&self) -> impl Iterator<Item = &Quote> {
        self.results.values().filter_map(FetchResult::quote)
    }
}
