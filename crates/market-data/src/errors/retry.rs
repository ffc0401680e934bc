/// How the provider chain reacts to an error from one provider.
///
/// | Class | Try next provider? | Circuit breaker failure? |
/// |-------|--------------------|--------------------------|
/// | `Never` | No | No |
/// | `FailoverWithPenalty` | Yes | Yes |
/// | `NextProvider` | Yes | No |
/// | `CircuitOpen` | Yes (skip this one) | No |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Stop the chain. The request itself is unusable.
    Never,

    /// Transient source trouble (429, timeout, 5xx, network).
    /// Counted against the provider's circuit breaker before moving on.
    FailoverWithPenalty,

    /// This provider cannot answer (unknown symbol, unsupported market,
    /// implausible data) but another one might. No penalty.
    NextProvider,

    /// The provider is currently short-circuited.
    CircuitOpen,
}
