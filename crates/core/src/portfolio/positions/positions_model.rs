//! Position domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shareprofit_market_data::Symbol;

use crate::errors::{Result, ValidationError};

/// A recorded purchase of a stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: String,
    pub symbol: Symbol,
    pub company_name: String,
    pub quantity: Decimal,
    pub purchase_price: Decimal,
    pub purchase_date: NaiveDate,
    pub broker: Option<String>,
    /// Cash actually paid including charges. Defaults to quantity x price.
    pub cash_invested: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Position {
    /// Cost at purchase price, excluding charges.
    pub fn total_investment(&self) -> Decimal {
        self.quantity * self.purchase_price
    }
}

/// Input model for recording a purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPosition {
    pub symbol: Symbol,
    pub company_name: String,
    pub quantity: Decimal,
    pub purchase_price: Decimal,
    pub purchase_date: NaiveDate,
    #[serde(default)]
    pub broker: Option<String>,
    #[serde(default)]
    pub cash_invested: Option<Decimal>,
}

impl NewPosition {
    pub fn validate(&self) -> Result<()> {
        if self.quantity <= Decimal::ZERO {
            return Err(ValidationError::InvalidInput(format!(
                "Quantity must be positive, got {}",
                self.quantity
            ))
            .into());
        }
        if self.purchase_price <= Decimal::ZERO {
            return Err(ValidationError::InvalidInput(format!(
                "Purchase price must be positive, got {}",
                self.purchase_price
            ))
            .into());
        }
        if let Some(cash) = self.cash_invested {
            if cash < Decimal::ZERO {
                return Err(ValidationError::InvalidInput(format!(
                    "Cash invested cannot be negative, got {}",
                    cash
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Cash invested, falling back to quantity x purchase price when unset or zero.
    pub fn effective_cash_invested(&self) -> Decimal {
        match self.cash_invested {
            Some(cash) if !cash.is_zero() => cash,
            _ => self.quantity * self.purchase_price,
        }
    }

    pub fn into_position(self, id: String, created_at: DateTime<Utc>) -> Position {
        let cash_invested = self.effective_cash_invested();
        Position {
            id,
            symbol: self.symbol,
            company_name: self.company_name,
            quantity: self.quantity,
            purchase_price: self.purchase_price,
            purchase_date: self.purchase_date,
            broker: self.broker.filter(|b| !b.trim().is_empty()),
            cash_invested,
            created_at,
        }
    }
}
