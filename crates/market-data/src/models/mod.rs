//! Market data models
//!
//! - `symbol` - Canonical portfolio ticker (Symbol)
//! - `quote` - Live price snapshot and the per-provider request (Quote, QuoteRequest)
//! - `types` - Type aliases for provider-facing identifiers

mod quote;
mod symbol;
mod types;

pub use quote::{Quote, QuoteRequest};
pub use symbol::Symbol;
pub use types::{ProviderId, ProviderSymbol};
