use std::sync::Arc;

use chrono::Utc;
use diesel::prelude::*;
use log::debug;
use uuid::Uuid;

use shareprofit_core::errors::{DatabaseError, Error, Result};
use shareprofit_core::portfolio::{NewPosition, PortfolioStore, Position};
use shareprofit_core::{Quote, Symbol};

use super::model::{PositionDB, PriceCacheDB};
use crate::db::{get_connection, DbPool};
use crate::errors::{IntoCore, StorageError};
use crate::schema::{positions, price_cache};

/// SQLite-backed [`PortfolioStore`].
pub struct PortfolioRepository {
    pool: Arc<DbPool>,
}

impl PortfolioRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        PortfolioRepository { pool }
    }

    pub fn add_position(&self, new_position: NewPosition) -> Result<Position> {
        new_position.validate()?;
        let position = new_position.into_position(Uuid::new_v4().to_string(), Utc::now());

        let mut conn = get_connection(&self.pool)?;
        diesel::insert_into(positions::table)
            .values(PositionDB::from(&position))
            .execute(&mut conn)
            .into_core()?;

        debug!("Added position {} for {}", position.id, position.symbol);
        Ok(position)
    }

    pub fn delete_position(&self, position_id: &str) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;
        let deleted = diesel::delete(positions::table.find(position_id))
            .execute(&mut conn)
            .into_core()?;

        if deleted == 0 {
            return Err(Error::Database(DatabaseError::NotFound(format!(
                "Position {} not found",
                position_id
            ))));
        }
        Ok(())
    }
}

impl PortfolioStore for PortfolioRepository {
    fn get_all_symbols(&self) -> Result<Vec<Symbol>> {
        let mut conn = get_connection(&self.pool)?;
        let raw: Vec<String> = positions::table
            .select(positions::symbol)
            .distinct()
            .order(positions::symbol.asc())
            .load(&mut conn)
            .into_core()?;

        raw.iter()
            .map(|s| {
                Symbol::parse(s)
                    .map_err(|e| Error::from(StorageError::CorruptRow(e.to_string())))
            })
            .collect()
    }

    fn get_positions(&self) -> Result<Vec<Position>> {
        let mut conn = get_connection(&self.pool)?;
        let rows: Vec<PositionDB> = positions::table
            .select(PositionDB::as_select())
            .order((positions::purchase_date.asc(), positions::created_at.asc()))
            .load(&mut conn)
            .into_core()?;

        rows.into_iter()
            .map(|row| Position::try_from(row).map_err(Error::from))
            .collect()
    }

    fn get_cached_price(&self, symbol: &Symbol) -> Result<Option<Quote>> {
        let mut conn = get_connection(&self.pool)?;
        let row: Option<PriceCacheDB> = price_cache::table
            .find(symbol.as_str())
            .select(PriceCacheDB::as_select())
            .first(&mut conn)
            .optional()
            .into_core()?;

        row.map(|r| Quote::try_from(r).map_err(Error::from))
            .transpose()
    }

    fn put_cached_price(&self, symbol: &Symbol, quote: &Quote) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;
        let row = PriceCacheDB::from_quote(symbol, quote);
        diesel::replace_into(price_cache::table)
            .values(&row)
            .execute(&mut conn)
            .into_core()?;
        Ok(())
    }
}
