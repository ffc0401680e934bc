use thiserror::Error;

use shareprofit_market_data::ErrorKind;

/// A refresh that could not be carried out at all.
///
/// Per-symbol problems are never reported this way; they are data in the
/// refresh results.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("Invalid refresh request: {0}")]
    InvalidRequest(String),

    #[error("Failed to read portfolio: {0}")]
    Store(String),

    #[error("Refresh aborted: {0}")]
    Internal(String),
}

impl RefreshError {
    /// Every refresh-level error is fatal to its cycle.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Fatal
    }
}
