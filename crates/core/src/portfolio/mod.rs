//! Positions, their persistence contract, and profit/loss valuation.

pub mod positions;
pub mod valuation;

pub use positions::*;
pub use valuation::*;
