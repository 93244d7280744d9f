//! Exchange-rate caching with a fixed TTL.

use cambio_common::time::Timestamp;
use chrono::Duration;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Cached rate entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Units of destination currency per one unit of source currency.
    pub rate: f64,
    /// When the rate was fetched.
    pub cached_at: Timestamp,
}

impl CacheEntry {
    /// Create a new cache entry.
    pub fn new(rate: f64, cached_at: Timestamp) -> Self {
        Self { rate, cached_at }
    }

    /// A cached rate is reusable until it has aged past the TTL.
    ///
    /// Pure function of elapsed time; staleness is evaluated lazily at
    /// read time, never by a background sweep.
    pub fn is_fresh(&self, now: Timestamp, ttl: Duration) -> bool {
        now.signed_duration_since(self.cached_at) < ttl
    }
}

/// Keyed store of the most recent rate fetched for each currency pair.
///
/// Entries are overwritten on every successful fetch and never deleted;
/// stale entries are superseded, not removed. The key universe is the
/// catalog's pair list, which is small enough that unbounded growth is not
/// a concern.
pub struct RateCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl RateCache {
    /// Create a new cache with the given TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Ordered cache key for a currency pair.
    pub fn key(source: &str, destination: &str) -> String {
        format!("{source}-{destination}")
    }

    /// Get the entry for the ordered pair, fresh or not.
    pub fn get(&self, source: &str, destination: &str) -> Option<CacheEntry> {
        self.entries
            .get(&Self::key(source, destination))
            .map(|entry| *entry)
    }

    /// Store a fetched rate, unconditionally overwriting any existing entry
    /// for the pair.
    pub fn put(&self, source: &str, destination: &str, rate: f64, now: Timestamp) {
        debug!(source, destination, rate, "Caching rate");
        self.entries
            .insert(Self::key(source, destination), CacheEntry::new(rate, now));
    }

    /// Fresh rate for the pair, if one is cached and within the TTL.
    pub fn fresh_rate(&self, source: &str, destination: &str, now: Timestamp) -> Option<f64> {
        self.get(source, destination)
            .filter(|entry| entry.is_fresh(now, self.ttl))
            .map(|entry| entry.rate)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of all entries, ordered by key, for persistence.
    pub fn export(&self) -> BTreeMap<String, CacheEntry> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    /// Restore entries from a persisted snapshot.
    pub fn restore(&self, entries: impl IntoIterator<Item = (String, CacheEntry)>) {
        for (key, entry) in entries {
            self.entries.insert(key, entry);
        }
    }
}
