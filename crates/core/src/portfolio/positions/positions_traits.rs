use shareprofit_market_data::{Quote, Symbol};

use super::positions_model::Position;
use crate::errors::Result;

/// Persistence contract the refresh pipeline depends on.
///
/// Implementations are called from the UI thread and from the refresh
/// worker, so they must be shareable. Calls are short and synchronous.
pub trait PortfolioStore: Send + Sync {
    /// Distinct symbols across all positions.
    fn get_all_symbols(&self) -> Result<Vec<Symbol>>;

    fn get_positions(&self) -> Result<Vec<Position>>;

    /// Last committed quote for `symbol`, regardless of age.
    fn get_cached_price(&self, symbol: &Symbol) -> Result<Option<Quote>>;

    /// Persist `quote` as the latest price for `symbol`, replacing any older one.
    fn put_cached_price(&self, symbol: &Symbol, quote: &Quote) -> Result<()>;
}
