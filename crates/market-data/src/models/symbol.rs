use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::MarketDataError;

/// Exchange suffixes recognised on portfolio tickers.
///
/// A ticker ending in one of these (`INFY.NS`, `SHOP.TO`) is already qualified
/// for a market. Anything else is treated as a bare ticker, which keeps
/// class-share symbols such as `BRK.B` intact.
const MARKET_SUFFIXES: &[&str] = &[
    "NS", "BO", "US", "L", "TO", "V", "AX", "HK", "T", "SI", "KS", "DE", "F", "PA", "AS", "MI",
    "SW", "SA", "MX",
];

/// Canonical ticker identifying a holding.
///
/// Symbols are trimmed and upper-cased on construction, so `" reliance.ns "`
/// and `"RELIANCE.NS"` compare equal. Cloning is cheap.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Arc<str>);

impl Symbol {
    /// Parse a user supplied ticker. Empty or whitespace-only input is rejected.
    pub fn parse(raw: &str) -> Result<Self, MarketDataError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(MarketDataError::InvalidSymbol(raw.to_string()));
        }
        Ok(Self(Arc::from(trimmed.to_ascii_uppercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into the base ticker and a recognised market suffix.
    ///
    /// ```
    /// use shareprofit_market_data::Symbol;
    ///
    /// let symbol = Symbol::parse("tcs.ns").unwrap();
    /// assert_eq!(symbol.split_market(), ("TCS", Some("NS")));
    ///
    /// let symbol = Symbol::parse("BRK.B").unwrap();
    /// assert_eq!(symbol.split_market(), ("BRK.B", None));
    /// ```
    pub fn split_market(&self) -> (&str, Option<&str>) {
        if let Some((base, suffix)) = self.0.rsplit_once('.') {
            if !base.is_empty() && MARKET_SUFFIXES.contains(&suffix) {
                return (base, Some(suffix));
            }
        }
        (&self.0, None)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for Symbol {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Symbol::parse(&raw).map_err(serde::de::Error::custom)
    }
}
