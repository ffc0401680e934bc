//! Quote caching and concurrent fetching.

mod cache;
mod clock;
mod coordinator;
mod errors;
mod model;

#[cfg(test)]
mod coordinator_tests;

pub use cache::{CacheStats, QuoteCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use coordinator::{FetchCoordinator, ProgressCallback, RefreshCoordinator};
pub use errors::RefreshError;
pub use model::{FetchFailure, FetchOutcome, FetchResult, RefreshOutcome, RefreshSummary};
