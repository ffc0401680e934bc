//! Quote source abstractions and implementations.
//!
//! This module contains:
//! - The `QuoteProvider` trait that every quote source implements
//! - Provider capabilities and rate limiting configuration
//! - Concrete sources: NSE India, Yahoo Finance and an offline demo table
//!
//! Providers receive an already resolved `QuoteRequest`. Turning a portfolio
//! ticker into the provider's own format happens in the resolver module, and
//! choosing which provider to ask happens in the registry.

mod capabilities;
mod traits;

pub mod demo;
pub mod nse;
pub mod yahoo;

pub use capabilities::{ProviderCapabilities, RateLimit};
pub use demo::DemoProvider;
pub use nse::NseProvider;
pub use traits::QuoteProvider;
pub use yahoo::YahooProvider;

/// Browser-like user agent. Both NSE and Yahoo reject requests without one.
pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Convert a JSON price into a `Decimal`, rejecting NaN and infinities.
pub(crate) fn price_from_f64(value: f64) -> Option<rust_decimal::Decimal> {
    use num_traits::FromPrimitive;

    if !value.is_finite() {
        return None;
    }
    rust_decimal::Decimal::from_f64(value).map(|d| d.normalize())
}
