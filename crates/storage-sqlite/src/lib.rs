//! SQLite storage implementation for Share Profit Tracker.
//!
//! This crate is the only place Diesel appears. It implements the
//! [`shareprofit_core::portfolio::PortfolioStore`] contract on top of an r2d2
//! pool and embedded migrations.
//!
//! ```text
//! core (domain, refresh)
//!         │
//!         ▼
//! storage-sqlite (this crate)
//!         │
//!         ▼
//!     SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod portfolio;
pub mod schema;

pub use db::{create_pool, get_connection, init, open, run_migrations, DbConnection, DbPool};
pub use errors::{IntoCore, StorageError};
pub use portfolio::PortfolioRepository;

pub use shareprofit_core::errors::{DatabaseError, Error, Result};
