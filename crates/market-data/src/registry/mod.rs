//! Provider orchestration: ordering, fallback, throttling and validation.

mod chain;
mod circuit_breaker;
mod diagnostics;
mod rate_limiter;
mod validator;

pub use chain::ProviderChain;
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use diagnostics::{FetchDiagnostics, ProviderAttempt, SkipReason};
pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use validator::{QuoteValidator, ValidationIssue, ValidationSeverity, ValidatorConfig};
