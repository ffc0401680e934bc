use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use shareprofit_market_data::{Quote, Symbol};

use super::valuation_model::{PerformerRef, PortfolioSummary, PositionValuation};
use crate::constants::DISPLAY_DECIMAL_PRECISION;
use crate::portfolio::positions::Position;

const DAYS_PER_YEAR: i64 = 365;

fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        Decimal::ZERO
    } else {
        (part / whole * Decimal::ONE_HUNDRED).round_dp(DISPLAY_DECIMAL_PRECISION)
    }
}

/// Values one position at `price` as of `today`.
///
/// An unpriced position is worth zero and reports a P/L of minus the full
/// investment, so the totals never silently mix in stale values.
pub fn value_position(
    position: &Position,
    price: Option<Decimal>,
    today: NaiveDate,
) -> PositionValuation {
    let total_investment = position.total_investment();
    let current_value = price
        .map(|p| p * position.quantity)
        .unwrap_or(Decimal::ZERO);
    let profit_loss = current_value - total_investment;
    let profit_loss_percent = percent_of(profit_loss, total_investment);

    let days_held = (today - position.purchase_date).num_days().max(0);
    let annualized_return_percent = if days_held > 0 {
        (profit_loss_percent / Decimal::from(days_held) * Decimal::from(DAYS_PER_YEAR))
            .round_dp(DISPLAY_DECIMAL_PRECISION)
    } else {
        Decimal::ZERO
    };

    PositionValuation {
        position_id: position.id.clone(),
        symbol: position.symbol.clone(),
        company_name: position.company_name.clone(),
        quantity: position.quantity,
        purchase_price: position.purchase_price,
        current_price: price,
        total_investment,
        current_value,
        profit_loss,
        profit_loss_percent,
        days_held,
        annualized_return_percent,
    }
}

/// Values every position against the quotes on hand.
pub fn value_positions(
    positions: &[Position],
    quotes: &HashMap<Symbol, Quote>,
    today: NaiveDate,
) -> Vec<PositionValuation> {
    positions
        .iter()
        .map(|p| value_position(p, quotes.get(&p.symbol).map(|q| q.price), today))
        .collect()
}

pub fn summarize(valuations: &[PositionValuation]) -> PortfolioSummary {
    let total_investment: Decimal = valuations.iter().map(|v| v.total_investment).sum();
    let current_value: Decimal = valuations.iter().map(|v| v.current_value).sum();
    let profit_loss = current_value - total_investment;

    let priced: Vec<&PositionValuation> = valuations.iter().filter(|v| v.is_priced()).collect();
    let to_ref = |v: &&PositionValuation| PerformerRef {
        symbol: v.symbol.clone(),
        profit_loss_percent: v.profit_loss_percent,
    };
    let best_performer = priced
        .iter()
        .max_by_key(|v| v.profit_loss_percent)
        .map(to_ref);
    let worst_performer = priced
        .iter()
        .min_by_key(|v| v.profit_loss_percent)
        .map(to_ref);

    PortfolioSummary {
        total_investment,
        current_value,
        profit_loss,
        profit_loss_percent: percent_of(profit_loss, total_investment),
        position_count: valuations.len(),
        priced_count: priced.len(),
        best_performer,
        worst_performer,
    }
}
