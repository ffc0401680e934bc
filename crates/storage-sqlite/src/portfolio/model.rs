//! Database models for positions and persisted prices.
//!
//! Decimals and timestamps are stored as text so no precision is lost.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;

use shareprofit_core::portfolio::Position;
use shareprofit_core::{Quote, Symbol};

use crate::errors::StorageError;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::positions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PositionDB {
    pub id: String,
    pub symbol: String,
    pub company_name: String,
    pub quantity: String,
    pub purchase_price: String,
    pub purchase_date: String,
    pub broker: Option<String>,
    pub cash_invested: String,
    pub created_at: String,
}

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::price_cache)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PriceCacheDB {
    pub symbol: String,
    pub price: String,
    pub currency: String,
    pub previous_close: Option<String>,
    pub source: String,
    pub fetched_at: String,
    pub market_time: Option<String>,
}

fn decimal(field: &str, raw: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(raw)
        .map_err(|e| StorageError::CorruptRow(format!("{} '{}': {}", field, raw, e)))
}

fn timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::CorruptRow(format!("{} '{}': {}", field, raw, e)))
}

fn symbol(raw: &str) -> Result<Symbol, StorageError> {
    Symbol::parse(raw).map_err(|e| StorageError::CorruptRow(e.to_string()))
}

impl From<&Position> for PositionDB {
    fn from(p: &Position) -> Self {
        Self {
            id: p.id.clone(),
            symbol: p.symbol.to_string(),
            company_name: p.company_name.clone(),
            quantity: p.quantity.to_string(),
            purchase_price: p.purchase_price.to_string(),
            purchase_date: p.purchase_date.format(DATE_FORMAT).to_string(),
            broker: p.broker.clone(),
            cash_invested: p.cash_invested.to_string(),
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

impl TryFrom<PositionDB> for Position {
    type Error = StorageError;

    fn try_from(row: PositionDB) -> Result<Self, Self::Error> {
        let purchase_date = NaiveDate::parse_from_str(&row.purchase_date, DATE_FORMAT)
            .map_err(|e| {
                StorageError::CorruptRow(format!("purchase_date '{}': {}", row.purchase_date, e))
            })?;
        Ok(Position {
            symbol: symbol(&row.symbol)?,
            quantity: decimal("quantity", &row.quantity)?,
            purchase_price: decimal("purchase_price", &row.purchase_price)?,
            cash_invested: decimal("cash_invested", &row.cash_invested)?,
            created_at: timestamp("created_at", &row.created_at)?,
            purchase_date,
            id: row.id,
            company_name: row.company_name,
            broker: row.broker,
        })
    }
}

impl PriceCacheDB {
    pub fn from_quote(symbol: &Symbol, quote: &Quote) -> Self {
        Self {
            symbol: symbol.to_string(),
            price: quote.price.to_string(),
            currency: quote.currency.clone(),
            previous_close: quote.previous_close.map(|p| p.to_string()),
            source: quote.source.clone(),
            fetched_at: quote.fetched_at.to_rfc3339(),
            market_time: quote.market_time.map(|t| t.to_rfc3339()),
        }
    }
}

impl TryFrom<PriceCacheDB> for Quote {
    type Error = StorageError;

    fn try_from(row: PriceCacheDB) -> Result<Self, Self::Error> {
        let mut quote = Quote::new(
            symbol(&row.symbol)?,
            decimal("price", &row.price)?,
            row.currency,
            row.source,
        )
        .with_fetched_at(timestamp("fetched_at", &row.fetched_at)?);

        if let Some(raw) = row.previous_close.as_deref() {
            quote = quote.with_previous_close(decimal("previous_close", raw)?);
        }
        if let Some(raw) = row.market_time.as_deref() {
            quote = quote.with_market_time(timestamp("market_time", raw)?);
        }
        Ok(quote)
    }
}
