//! Runner configuration from the environment.
//!
//! Every knob has a default, so an empty environment gives a working
//! tracker on `./data/portfolio.db` that refreshes from NSE, then Yahoo.

use std::str::FromStr;

use anyhow::Context;

use shareprofit_core::settings::RefreshSettings;

const DEFAULT_DB_PATH: &str = "./data/portfolio.db";

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub refresh: RefreshSettings,
    /// Exit after the first refresh instead of running the scheduler.
    pub run_once: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = RefreshSettings::default();

        let refresh = RefreshSettings {
            max_concurrency: parse_or(&lookup, "SPT_MAX_CONCURRENCY", defaults.max_concurrency)?,
            request_timeout_ms: parse_or(
                &lookup,
                "SPT_REQUEST_TIMEOUT_MS",
                defaults.request_timeout_ms,
            )?,
            cache_ttl_secs: parse_or(&lookup, "SPT_CACHE_TTL_SECS", defaults.cache_ttl_secs)?,
            cache_capacity: parse_or(&lookup, "SPT_CACHE_CAPACITY", defaults.cache_capacity)?,
            auto_refresh_secs: parse_or(
                &lookup,
                "SPT_REFRESH_INTERVAL_SECS",
                defaults.auto_refresh_secs,
            )?,
            default_market_suffix: lookup("SPT_MARKET_SUFFIX")
                .unwrap_or(defaults.default_market_suffix),
            provider_order: lookup("SPT_PROVIDERS")
                .map(|raw| {
                    raw.split(',')
                        .map(|id| id.trim().to_uppercase())
                        .filter(|id| !id.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.provider_order),
            demo_mode: flag(&lookup, "SPT_DEMO_MODE")?,
        };
        refresh.validate()?;

        Ok(Config {
            db_path: lookup("SPT_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            refresh,
            run_once: flag(&lookup, "SPT_RUN_ONCE")?,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has invalid value '{}'", key, raw)),
        None => Ok(default),
    }
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<bool> {
    match lookup(key).as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some(v) if v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes") => {
            Ok(true)
        }
        Some(v) if v == "0" || v.eq_ignore_ascii_case("false") || v.eq_ignore_ascii_case("no") => {
            Ok(false)
        }
        Some(v) => anyhow::bail!("{} must be true or false, got '{}'", key, v),
    }
}
