//! In-memory TTL cache of live quotes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::debug;
use serde::Serialize;

use shareprofit_market_data::{Quote, Symbol};

use super::clock::{Clock, SystemClock};
use crate::constants::DEFAULT_CACHE_CAPACITY;

#[derive(Debug, Clone)]
struct CacheEntry {
    quote: Quote,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub hit_count: u64,
    pub miss_count: u64,
}

/// Symbol to quote cache with a per-entry expiry.
///
/// Safe to share between fetch tasks and the UI thread. An entry is never
/// returned once `now >= expires_at`; expired entries are dropped lazily on
/// read and eagerly when the cache is full.
pub struct QuoteCache {
    entries: DashMap<Symbol, CacheEntry>,
    clock: Arc<dyn Clock>,
    max_capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl QuoteCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock), DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(max_capacity: usize) -> Self {
        Self::with_clock(Arc::new(SystemClock), max_capacity)
    }

    pub fn with_clock(clock: Arc<dyn Clock>, max_capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            max_capacity: max_capacity.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// The cached quote, if present and unexpired.
    pub fn get(&self, symbol: &Symbol) -> Option<Quote> {
        let now = self.clock.now();

        // Copy out before touching the map again; holding a shard guard
        // across remove_if would deadlock.
        let found = self
            .entries
            .get(symbol)
            .map(|entry| (entry.expires_at > now).then(|| entry.quote.clone()));

        match found {
            Some(Some(quote)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(quote)
            }
            Some(None) => {
                self.entries
                    .remove_if(symbol, |_, entry| entry.expires_at <= now);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store `quote` for `symbol`, replacing any previous entry.
    ///
    /// The capacity check and the insert are separate steps, so concurrent
    /// writers can overshoot `max_capacity` by at most one entry each.
    pub fn put(&self, symbol: Symbol, quote: Quote, ttl: Duration) {
        let now = self.clock.now();
        // TTLs past the end of the calendar never expire.
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        if !self.entries.contains_key(&symbol) && self.entries.len() >= self.max_capacity {
            self.make_room(now);
        }

        self.entries.insert(
            symbol,
            CacheEntry { quote, expires_at },
        );
    }

    pub fn invalidate(&self, symbol: &Symbol) {
        self.entries.remove(symbol);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            hit_count: self.hits.load(Ordering::Relaxed),
            miss_count: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Drop expired entries, then the one closest to expiry if still full.
    fn make_room(&self, now: DateTime<Utc>) {
        self.entries.retain(|_, entry| entry.expires_at > now);
        if self.entries.len() < self.max_capacity {
            return;
        }

        let victim = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().expires_at)
            .map(|entry| entry.key().clone());

        if let Some(symbol) = victim {
            debug!("Quote cache full, evicting {}", symbol);
            self.entries.remove(&symbol);
        }
    }
}

impl Default for QuoteCache {
    fn default() -> Self {
        Self::new()
    }
}
