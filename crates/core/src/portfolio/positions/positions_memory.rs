//! Map-backed store used in demo mode and tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use chrono::Utc;
use uuid::Uuid;

use shareprofit_market_data::{Quote, Symbol};

use super::positions_model::{NewPosition, Position};
use super::positions_traits::PortfolioStore;
use crate::errors::{Error, Result};

#[derive(Default)]
pub struct InMemoryPortfolioStore {
    positions: RwLock<Vec<Position>>,
    prices: RwLock<HashMap<Symbol, Quote>>,
}

impl InMemoryPortfolioStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_position(&self, new_position: NewPosition) -> Result<Position> {
        new_position.validate()?;
        let position = new_position.into_position(Uuid::new_v4().to_string(), Utc::now());
        self.positions
            .write()
            .map_err(|_| lock_poisoned())?
            .push(position.clone());
        Ok(position)
    }

    pub fn delete_position(&self, id: &str) -> Result<()> {
        let mut positions = self.positions.write().map_err(|_| lock_poisoned())?;
        let before = positions.len();
        positions.retain(|p| p.id != id);
        if positions.len() == before {
            return Err(Error::Repository(format!("Position {} not found", id)));
        }
        Ok(())
    }
}

fn lock_poisoned() -> Error {
    Error::Unexpected("portfolio store lock poisoned".to_string())
}

impl PortfolioStore for InMemoryPortfolioStore {
    fn get_all_symbols(&self) -> Result<Vec<Symbol>> {
        let positions = self.positions.read().map_err(|_| lock_poisoned())?;
        let symbols: BTreeSet<Symbol> = positions.iter().map(|p| p.symbol.clone()).collect();
        Ok(symbols.into_iter().collect())
    }

    fn get_positions(&self) -> Result<Vec<Position>> {
        let positions = self.positions.read().map_err(|_| lock_poisoned())?;
        Ok(positions.clone())
    }

    fn get_cached_price(&self, symbol: &Symbol) -> Result<Option<Quote>> {
        let prices = self.prices.read().map_err(|_| lock_poisoned())?;
        Ok(prices.get(symbol).cloned())
    }

    fn put_cached_price(&self, symbol: &Symbol, quote: &Quote) -> Result<()> {
        self.prices
            .write()
            .map_err(|_| lock_poisoned())?
            .insert(symbol.clone(), quote.clone());
        Ok(())
    }
}
