//! Per-symbol record of what each provider did during a fetch.

use crate::models::ProviderId;

/// Why a provider was not asked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The provider does not serve the symbol's market.
    MarketNotCovered { market: Option<String> },
    /// The provider cannot express the symbol.
    ResolutionFailed { message: String },
    /// The provider's circuit is open.
    CircuitBreakerOpen,
}

#[derive(Clone, Debug)]
pub struct ProviderAttempt {
    pub provider_id: ProviderId,
    pub skipped: Option<SkipReason>,
    pub error: Option<String>,
    pub success: bool,
}

#[derive(Clone, Debug, Default)]
pub struct FetchDiagnostics {
    pub attempts: Vec<ProviderAttempt>,
}

impl FetchDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_skip(&mut self, provider_id: ProviderId, reason: SkipReason) {
        self.attempts.push(ProviderAttempt {
            provider_id,
            skipped: Some(reason),
            error: None,
            success: false,
        });
    }

    pub fn record_error(&mut self, provider_id: ProviderId, error: String) {
        self.attempts.push(ProviderAttempt {
            provider_id,
            skipped: None,
            error: Some(error),
            success: false,
        });
    }

    pub fn record_success(&mut self, provider_id: ProviderId) {
        self.attempts.push(ProviderAttempt {
            provider_id,
            skipped: None,
            error: None,
            success: true,
        });
    }

    /// One-line trail such as `NSE: ERROR (HTTP 503) -> YAHOO: SUCCESS`.
    pub fn summary(&self) -> String {
        self.attempts
            .iter()
            .map(|a| match (&a.skipped, &a.error) {
                _ if a.success => format!("{}: SUCCESS", a.provider_id),
                (Some(skip), _) => format!("{}: SKIPPED ({:?})", a.provider_id, skip),
                (None, Some(err)) => format!("{}: ERROR ({})", a.provider_id, err),
                (None, None) => format!("{}: UNKNOWN", a.provider_id),
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Providers that were actually called, in order.
    pub fn called(&self) -> Vec<&ProviderId> {
        self.attempts
            .iter()
            .filter(|a| a.skipped.is_none())
            .map(|a| &a.provider_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    #[test]
    fn test_summary_trail() {
        let mut diagnostics = FetchDiagnostics::new();
        diagnostics.record_skip(
            Cow::Borrowed("NSE"),
            SkipReason::MarketNotCovered {
                market: Some("US".to_string()),
            },
        );
        diagnostics.record_error(Cow::Borrowed("YAHOO"), "HTTP 503".to_string());
        diagnostics.record_success(Cow::Borrowed("DEMO"));

        let summary = diagnostics.summary();
        assert!(summary.starts_with("NSE: SKIPPED"));
        assert!(summary.contains("YAHOO: ERROR (HTTP 503)"));
        assert!(summary.ends_with("DEMO: SUCCESS"));
        assert_eq!(diagnostics.called().len(), 2);
    }
}
