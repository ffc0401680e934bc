mod positions_memory;
mod positions_model;
mod positions_traits;

pub use positions_memory::InMemoryPortfolioStore;
pub use positions_model::{NewPosition, Position};
pub use positions_traits::PortfolioStore;
