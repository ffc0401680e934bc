//! Symbol resolution for quote providers.
//!
//! Portfolio tickers come in three shapes: bare (`RELIANCE`), exchange
//! qualified (`RELIANCE.NS`, `SHOP.TO`) and explicitly US (`AAPL.US`). Each
//! provider wants its own format, so before a provider is asked the resolver
//! turns the canonical symbol into a [`ResolvedSymbol`]:
//!
//! | Symbol | Market | Yahoo | NSE |
//! |--------|--------|-------|-----|
//! | `RELIANCE` | `NS` (default) | `RELIANCE.NS` | `RELIANCE` |
//! | `RELIANCE.NS` | `NS` | `RELIANCE.NS` | `RELIANCE` |
//! | `AAPL.US` | `US` | `AAPL` | fails |
//! | `SHOP.TO` | `TO` | `SHOP.TO` | fails |

mod suffix_resolver;
mod traits;

pub use suffix_resolver::SuffixResolver;
pub use traits::{ResolvedSymbol, SymbolResolver};
