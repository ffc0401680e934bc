//! Market data fetching for Share Profit Tracker.
//!
//! This crate turns a portfolio symbol into a validated live [`Quote`] by
//! walking an ordered chain of quote sources.
//!
//! # Architecture
//!
//! ```text
//! +-------------------+
//! |   ProviderChain   |  <- Entry point, one call per symbol
//! +-------------------+
//!           |
//!           v
//! +-------------------+     +-------------------+
//! |  SymbolResolver   |---->|  ResolvedSymbol   |
//! +-------------------+     +-------------------+
//!           |
//!           v
//! +-------------------+
//! |  QuoteProvider    |  <- NSE, Yahoo, Demo
//! +-------------------+
//!           |
//!           v
//! +-------------------+
//! |  QuoteValidator   |  <- Sanity checks before a quote is accepted
//! +-------------------+
//! ```
//!
//! Each provider is guarded by a token-bucket [`RateLimiter`] and a
//! [`CircuitBreaker`]. Failures are classified into an [`ErrorKind`] that
//! callers surface to the user, and a [`RetryClass`] that decides whether the
//! chain moves on to the next provider.

pub mod errors;
pub mod models;
pub mod provider;
pub mod registry;
pub mod resolver;

pub use errors::{ErrorKind, MarketDataError, RetryClass};
pub use models::{ProviderId, ProviderSymbol, Quote, QuoteRequest, Symbol};
pub use provider::{
    DemoProvider, NseProvider, ProviderCapabilities, QuoteProvider, RateLimit, YahooProvider,
};
pub use registry::{
    CircuitBreaker, CircuitBreakerConfig, CircuitState, FetchDiagnostics, ProviderAttempt,
    ProviderChain, QuoteValidator, RateLimitConfig, RateLimiter, SkipReason, ValidatorConfig,
};
pub use resolver::{ResolvedSymbol, SuffixResolver, SymbolResolver};
