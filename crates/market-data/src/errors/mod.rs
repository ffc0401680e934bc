//! Error types and failure classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The error enum for everything a quote source can report
//! - [`ErrorKind`]: The user-facing category a failure is reported under
//! - [`RetryClass`]: How the provider chain reacts to an error

mod retry;

pub use retry::RetryClass;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// User-facing failure category for a symbol.
///
/// Every failed fetch is reported as exactly one of these.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Transient source failure (network, 5xx, rate limiting). Worth retrying later.
    Unavailable,
    /// The symbol is unknown to every source. The user has to correct it.
    NotFound,
    /// No answer within the per-request timeout.
    Timeout,
    /// Unrecoverable failure; the fetch could not be carried out at all.
    Fatal,
}

impl ErrorKind {
    /// Whether a later refresh could plausibly succeed without user action.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Unavailable | Self::Timeout)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unavailable => "unavailable",
            Self::NotFound => "not found",
            Self::Timeout => "timeout",
            Self::Fatal => "fatal",
        };
        f.write_str(label)
    }
}

/// Errors that can occur while fetching a quote.
///
/// Each variant maps to a [`RetryClass`] via [`retry_class`](Self::retry_class)
/// and to an [`ErrorKind`] via [`kind`](Self::kind).
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The ticker could not be parsed at all.
    #[error("Invalid symbol: {0:?}")]
    InvalidSymbol(String),

    /// The provider does not know this symbol.
    /// Another provider might, so the chain moves on.
    #[error("Symbol not found: {symbol} ({provider})")]
    SymbolNotFound {
        /// Symbol as sent to the provider
        symbol: String,
        /// The provider that reported it missing
        provider: String,
    },

    /// The provider rate limited the request (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// A provider-specific error occurred (unexpected status, malformed body).
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The provider cannot express this symbol, e.g. a US ticker sent to NSE.
    #[error("Resolution failed for provider {provider}: {symbol}")]
    ResolutionFailed {
        /// The provider that failed to resolve the symbol
        provider: String,
        /// The canonical symbol
        symbol: String,
    },

    /// The circuit breaker is open for this provider.
    #[error("Circuit open: {provider}")]
    CircuitOpen {
        /// The provider with an open circuit
        provider: String,
    },

    /// The provider returned data that failed validation checks.
    #[error("Validation failed: {message}")]
    ValidationFailed {
        /// Description of the validation failure
        message: String,
    },

    /// No provider is configured, or none covers the symbol's market.
    #[error("No providers available")]
    NoProvidersAvailable,

    /// The caller's deadline passed before a provider could be asked.
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use shareprofit_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::RateLimited { provider: "YAHOO".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::FailoverWithPenalty);
    ///
    /// let error = MarketDataError::SymbolNotFound {
    ///     symbol: "NOPE".to_string(),
    ///     provider: "NSE".to_string(),
    /// };
    /// assert_eq!(error.retry_class(), RetryClass::NextProvider);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::InvalidSymbol(_) | Self::NoProvidersAvailable | Self::DeadlineExceeded => {
                RetryClass::Never
            }

            Self::RateLimited { .. }
            | Self::Timeout { .. }
            | Self::ProviderError { .. }
            | Self::Network(_) => RetryClass::FailoverWithPenalty,

            Self::SymbolNotFound { .. }
            | Self::ResolutionFailed { .. }
            | Self::ValidationFailed { .. } => RetryClass::NextProvider,

            Self::CircuitOpen { .. } => RetryClass::CircuitOpen,
        }
    }

    /// Returns the user-facing category for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSymbol(_)
            | Self::SymbolNotFound { .. }
            | Self::ResolutionFailed { .. } => ErrorKind::NotFound,

            Self::Timeout { .. } | Self::DeadlineExceeded => ErrorKind::Timeout,

            Self::Network(e) if e.is_timeout() => ErrorKind::Timeout,

            Self::RateLimited { .. }
            | Self::ProviderError { .. }
            | Self::CircuitOpen { .. }
            | Self::ValidationFailed { .. }
            | Self::NoProvidersAvailable
            | Self::Network(_) => ErrorKind::Unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found() -> MarketDataError {
        MarketDataError::SymbolNotFound {
            symbol: "XYZ".to_string(),
            provider: "NSE".to_string(),
        }
    }

    #[test]
    fn test_symbol_not_found_moves_to_next_provider() {
        assert_eq!(not_found().retry_class(), RetryClass::NextProvider);
        assert_eq!(not_found().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_rate_limited_is_penalized() {
        let error = MarketDataError::RateLimited {
            provider: "YAHOO".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::FailoverWithPenalty);
        assert_eq!(error.kind(), ErrorKind::Unavailable);
    }

    #[test]
    fn test_timeout() {
        let error = MarketDataError::Timeout {
            provider: "YAHOO".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::FailoverWithPenalty);
        assert_eq!(error.kind(), ErrorKind::Timeout);
        assert_eq!(MarketDataError::DeadlineExceeded.kind(), ErrorKind::Timeout);
    }

    #[test]
    fn test_provider_error() {
        let error = MarketDataError::ProviderError {
            provider: "NSE".to_string(),
            message: "HTTP 503".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::FailoverWithPenalty);
        assert_eq!(error.kind(), ErrorKind::Unavailable);
        assert_eq!(error.to_string(), "Provider error: NSE - HTTP 503");
    }

    #[test]
    fn test_resolution_failed() {
        let error = MarketDataError::ResolutionFailed {
            provider: "NSE".to_string(),
            symbol: "AAPL.US".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::NextProvider);
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_validation_failed_tries_next_provider() {
        let error = MarketDataError::ValidationFailed {
            message: "Non-positive price: 0".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::NextProvider);
        assert_eq!(error.kind(), ErrorKind::Unavailable);
    }

    #[test]
    fn test_circuit_open() {
        let error = MarketDataError::CircuitOpen {
            provider: "YAHOO".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::CircuitOpen);
        assert_eq!(error.kind(), ErrorKind::Unavailable);
    }

    #[test]
    fn test_terminal_errors() {
        assert_eq!(
            MarketDataError::InvalidSymbol(String::new()).retry_class(),
            RetryClass::Never
        );
        assert_eq!(
            MarketDataError::NoProvidersAvailable.retry_class(),
            RetryClass::Never
        );
    }

    #[test]
    fn test_error_kind_retryable() {
        assert!(ErrorKind::Unavailable.is_retryable());
        assert!(ErrorKind::Timeout.is_retryable());
        assert!(!ErrorKind::NotFound.is_retryable());
        assert!(!ErrorKind::Fatal.is_retryable());
    }

    #[test]
    fn test_error_kind_serializes_screaming() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::NotFound).unwrap(),
            "\"NOT_FOUND\""
        );
    }
}
