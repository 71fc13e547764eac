//! Freshness cache for resolved shower feeds.
//!
//! One entry, fully replaced on every successful resolution. Timestamps are
//! epoch milliseconds so the persisted form stays readable and stable.
//!
//! TTL: 6 hours. Strict boundary: an entry aged exactly at the TTL is stale.

use super::types::ShowerRecord;
use crate::store::Store;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SHOWER_TTL_MS: i64 = 6 * 3600 * 1000; // 6 hours in ms

const STORE_KEY: &str = "meteorData";

/// A cached feed with capture time and provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: Vec<ShowerRecord>,
    /// Capture time in epoch milliseconds.
    pub time: i64,
    #[serde(default)]
    pub source: String,
}

impl CacheEntry {
    pub fn new(data: Vec<ShowerRecord>, source: String, captured_at: DateTime<Utc>) -> Self {
        Self {
            data,
            time: captured_at.timestamp_millis(),
            source,
        }
    }

    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.time)
    }

    /// True when the entry's age is strictly below the TTL.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl_ms: i64) -> bool {
        now.timestamp_millis() - self.time < ttl_ms
    }
}

/// Freshness-aware wrapper over the key-value store.
pub struct FreshnessCache {
    store: Store,
}

impl FreshnessCache {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Read the cached entry. A missing or malformed entry reads as None.
    pub fn read(&self) -> Option<CacheEntry> {
        let raw = self.store.get(STORE_KEY)?;
        serde_json::from_str(raw).ok()
    }

    /// Replace the cached entry wholesale. Partial merges are never done;
    /// a resolution either supersedes the cache entirely or not at all.
    pub fn write(&mut self, entry: &CacheEntry) {
        if let Ok(json) = serde_json::to_string(entry) {
            self.store.set(STORE_KEY, json);
        }
    }
}
