use std::borrow::Cow;
use std::sync::Arc;

/// Provider id such as `NSE`. Borrowed for built-in providers.
pub type ProviderId = Cow<'static, str>;

/// Ticker in the format a specific provider expects, e.g. `RELIANCE.NS` for
/// Yahoo and `RELIANCE` for NSE.
pub type ProviderSymbol = Arc<str>;
