//! Quote sanity checks.
//!
//! A quote that fails a hard check is discarded and the next provider is
//! asked. Soft checks only log.

use log::warn;
use rust_decimal::Decimal;

use crate::errors::MarketDataError;
use crate::models::Quote;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationSeverity {
    /// Reject the quote.
    Hard,
    /// Accept the quote but log a warning.
    Soft,
}

#[derive(Clone, Debug)]
pub struct ValidationIssue {
    pub severity: ValidationSeverity,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct ValidatorConfig {
    /// Prices above this are treated as garbage.
    pub max_price: Option<Decimal>,
    /// Warn when the move against previous close exceeds this percentage.
    pub max_daily_move_percent: Option<Decimal>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_price: Some(Decimal::from(100_000_000i64)),
            max_daily_move_percent: Some(Decimal::from(50)),
        }
    }
}

pub struct QuoteValidator {
    config: ValidatorConfig,
}

impl QuoteValidator {
    pub fn new() -> Self {
        Self::with_config(ValidatorConfig::default())
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Validate a quote, logging soft issues and failing on hard ones.
    pub fn validate(&self, quote: &Quote) -> Result<(), MarketDataError> {
        let issues = self.check(quote);

        let hard: Vec<&str> = issues
            .iter()
            .filter(|i| i.severity == ValidationSeverity::Hard)
            .map(|i| i.message.as_str())
            .collect();
        if !hard.is_empty() {
            return Err(MarketDataError::ValidationFailed {
                message: hard.join("; "),
            });
        }

        for issue in &issues {
            warn!(
                "Quote validation warning for {} from {}: {}",
                quote.symbol, quote.source, issue.message
            );
        }
        Ok(())
    }

    fn check(&self, quote: &Quote) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        if quote.price <= Decimal::ZERO {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Hard,
                message: format!("Non-positive price: {}", quote.price),
            });
        }

        if let Some(max) = self.config.max_price {
            if quote.price > max {
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Hard,
                    message: format!("Price {} exceeds sanity limit {}", quote.price, max),
                });
            }
        }

        match quote.previous_close {
            Some(prev) if prev <= Decimal::ZERO => issues.push(ValidationIssue {
                severity: ValidationSeverity::Soft,
                message: format!("Non-positive previous close: {}", prev),
            }),
            _ => {}
        }

        if let (Some(limit), Some(change)) =
            (self.config.max_daily_move_percent, quote.change_percent())
        {
            if change.abs() > limit {
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Soft,
                    message: format!("Unusual move of {}% against previous close", change),
                });
            }
        }

        if quote.currency.trim().is_empty() {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Soft,
                message: "Missing currency".to_string(),
            });
        }

        issues
    }
}

impl Default for QuoteValidator {
    fn default() -> Self {
        Self::new()
    }
}
