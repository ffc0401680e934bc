//! Per-provider circuit breaker.
//!
//! After repeated transient failures a provider is short-circuited for a
//! cool-down period, so a refresh of a large portfolio does not pay the
//! timeout of a dead source once per symbol. After the cool-down a few trial
//! requests decide whether the circuit closes again.
//!
//! State is in-memory and resets on restart.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::models::ProviderId;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CircuitState {
    /// Requests flow normally.
    Closed,
    /// Requests are refused until the recovery timeout passes.
    Open,
    /// Trial requests are allowed; one failure reopens the circuit.
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Closed => "Closed",
            Self::Open => "Open",
            Self::HalfOpen => "HalfOpen",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// How long an open circuit refuses requests.
    pub recovery_timeout: Duration,
    /// Trial successes needed to close a half-open circuit.
    pub half_open_success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(60),
            half_open_success_threshold: 2,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Circuit {
    Closed { failures: u32 },
    Open { since: Instant },
    HalfOpen { successes: u32 },
}

impl Circuit {
    fn state(&self) -> CircuitState {
        match self {
            Self::Closed { .. } => CircuitState::Closed,
            Self::Open { .. } => CircuitState::Open,
            Self::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }
}

const CLOSED: Circuit = Circuit::Closed { failures: 0 };

pub struct CircuitBreaker {
    circuits: Mutex<HashMap<String, Circuit>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }

    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self {
            circuits: Mutex::new(HashMap::new()),
            config,
        }
    }

    fn lock_circuits(&self) -> MutexGuard<'_, HashMap<String, Circuit>> {
        self.circuits.lock().unwrap_or_else(|poisoned| {
            warn!("Circuit breaker mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Whether `provider` may be called now.
    ///
    /// An open circuit whose recovery timeout has passed moves to half-open
    /// and lets the request through.
    pub fn is_allowed(&self, provider: &ProviderId) -> bool {
        let mut circuits = self.lock_circuits();
        let circuit = circuits.entry(provider.to_string()).or_insert(CLOSED);

        match *circuit {
            Circuit::Closed { .. } | Circuit::HalfOpen { .. } => true,
            Circuit::Open { since } if since.elapsed() >= self.config.recovery_timeout => {
                info!("Circuit breaker: '{}' Open -> HalfOpen", provider);
                *circuit = Circuit::HalfOpen { successes: 0 };
                true
            }
            Circuit::Open { .. } => false,
        }
    }

    pub fn record_success(&self, provider: &ProviderId) {
        let mut circuits = self.lock_circuits();
        let circuit = circuits.entry(provider.to_string()).or_insert(CLOSED);

        *circuit = match *circuit {
            Circuit::Closed { .. } => CLOSED,
            Circuit::HalfOpen { successes } => {
                let successes = successes + 1;
                if successes >= self.config.half_open_success_threshold {
                    info!("Circuit breaker: '{}' HalfOpen -> Closed", provider);
                    CLOSED
                } else {
                    Circuit::HalfOpen { successes }
                }
            }
            // A request admitted just before the circuit opened.
            open @ Circuit::Open { .. } => open,
        };
    }

    pub fn record_failure(&self, provider: &ProviderId) {
        let mut circuits = self.lock_circuits();
        let circuit = circuits.entry(provider.to_string()).or_insert(CLOSED);
        let now = Instant::now();

        *circuit = match *circuit {
            Circuit::Closed { failures } => {
                let failures = failures + 1;
                if failures >= self.config.failure_threshold {
                    warn!(
                        "Circuit breaker: opening '{}' after {} consecutive failures",
                        provider, failures
                    );
                    Circuit::Open { since: now }
                } else {
                    debug!(
                        "Circuit breaker: failure for '{}' ({}/{})",
                        provider, failures, self.config.failure_threshold
                    );
                    Circuit::Closed { failures }
                }
            }
            Circuit::HalfOpen { .. } => {
                info!("Circuit breaker: '{}' failed its trial, reopening", provider);
                Circuit::Open { since: now }
            }
            Circuit::Open { .. } => Circuit::Open { since: now },
        };
    }

    pub fn state(&self, provider: &ProviderId) -> CircuitState {
        self.lock_circuits()
            .get(provider.as_ref())
            .map(Circuit::state)
            .unwrap_or(CircuitState::Closed)
    }

    pub fn reset(&self, provider: &ProviderId) {
        self.lock_circuits().remove(provider.as_ref());
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}
