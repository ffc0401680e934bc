//! Portfolio valuation domain models.

use rust_decimal::Decimal;
use serde::Serialize;

use shareprofit_market_data::Symbol;

/// Profit and loss of one position at a given price.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionValuation {
    pub position_id: String,
    pub symbol: Symbol,
    pub company_name: String,
    pub quantity: Decimal,
    pub purchase_price: Decimal,
    pub current_price: Option<Decimal>,
    pub total_investment: Decimal,
    /// Zero while the position has no price.
    pub current_value: Decimal,
    pub profit_loss: Decimal,
    pub profit_loss_percent: Decimal,
    pub days_held: i64,
    pub annualized_return_percent: Decimal,
}

impl PositionValuation {
    pub fn is_priced(&self) -> bool {
        self.current_price.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformerRef {
    pub symbol: Symbol,
    pub profit_loss_percent: Decimal,
}

/// Portfolio totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_investment: Decimal,
    pub current_value: Decimal,
    pub profit_loss: Decimal,
    pub profit_loss_percent: Decimal,
    pub position_count: usize,
    pub priced_count: usize,
    pub best_performer: Option<PerformerRef>,
    pub worst_performer: Option<PerformerRef>,
}
