//! Share Profit Tracker core - price refresh pipeline and portfolio domain.
//!
//! This crate holds the business logic. It is storage-agnostic: persistence
//! is reached through the [`portfolio::PortfolioStore`] trait, implemented by
//! the `storage-sqlite` crate.
//!
//! A refresh flows through three layers:
//!
//! - [`quotes::QuoteCache`] serves fresh prices without touching the network.
//! - [`quotes::FetchCoordinator`] fetches the cache misses concurrently through
//!   the market-data provider chain, with a bounded number of requests in
//!   flight and a timeout per symbol.
//! - [`refresh::RefreshOrchestrator`] runs the coordinator on the async
//!   runtime and hands the outcome back to the UI thread through a single
//!   completion job.

pub mod constants;
pub mod errors;
pub mod portfolio;
pub mod quotes;
pub mod refresh;
pub mod settings;

pub use errors::Error;
pub use errors::Result;

pub use shareprofit_market_data::{ErrorKind, Quote, Symbol};
