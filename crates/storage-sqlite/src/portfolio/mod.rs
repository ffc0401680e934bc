mod model;
mod repository;

pub use model::{PositionDB, PriceCacheDB};
pub use repository::PortfolioRepository;
