//! Shower data resolver — orchestrates the fallback chain.
//!
//! Flow: fresh cache → providers in order (first non-empty wins) →
//!       curated dataset → static display set
//!
//! The resolver never fails: every rung of the ladder degrades to the next,
//! and the static set at the bottom is always non-empty.

use super::cache::{CacheEntry, FreshnessCache, SHOWER_TTL_MS};
use super::normalize::{self, WindowPolicy};
use super::providers::{self, ShowerProvider};
use super::types::ShowerFeed;
use chrono::{DateTime, Utc};

/// Provenance label for the curated annual calendar.
pub const CURATED_SOURCE: &str = "Curated Dataset";

/// The shower resolver with its fallback pipeline.
pub struct ShowerResolver {
    cache: FreshnessCache,
    providers: Vec<Box<dyn ShowerProvider + Send>>,
    offline: bool,
}

impl ShowerResolver {
    pub fn new() -> Self {
        Self {
            cache: FreshnessCache::new(crate::store::Store::open()),
            providers: providers::default_providers(),
            offline: false,
        }
    }

    /// Create a resolver with a specific cache (for testing).
    pub fn with_cache(cache: FreshnessCache) -> Self {
        Self {
            cache,
            providers: providers::default_providers(),
            offline: false,
        }
    }

    /// Swap in a specific provider chain (for testing).
    pub fn with_providers(mut self, providers: Vec<Box<dyn ShowerProvider + Send>>) -> Self {
        self.providers = providers;
        self
    }

    /// Set offline mode — skip network providers.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// Resolve the upcoming-shower feed. Serves the cache while it is fresh;
    /// otherwise runs the full chain via [`refresh`].
    pub fn resolve(&mut self, now: DateTime<Utc>) -> ShowerFeed {
        if let Some(entry) = self.cache.read() {
            if entry.is_fresh(now, SHOWER_TTL_MS) && !entry.data.is_empty() {
                let fetched_at = entry.captured_at().unwrap_or(now);
                return ShowerFeed {
                    records: entry.data,
                    source: entry.source,
                    fetched_at,
                };
            }
        }
        self.refresh(now)
    }

    /// Run the fallback chain unconditionally and cache the result.
    ///
    /// Provider errors are isolated: a failing source logs a line and the
    /// chain moves on. A provider "wins" only when its records survive
    /// normalization and the upcoming window.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> ShowerFeed {
        if !self.offline {
            for provider in &self.providers {
                let raws = match provider.fetch() {
                    Ok(raws) => raws,
                    Err(e) => {
                        eprintln!("  Warning: {} failed: {}", provider.label(), e);
                        continue;
                    }
                };
                let records =
                    normalize::select(normalize::normalize(&raws, now), WindowPolicy::Upcoming, now);
                if records.is_empty() {
                    continue;
                }
                let source = provider.label().to_string();
                self.cache
                    .write(&CacheEntry::new(records.clone(), source.clone(), now));
                return ShowerFeed {
                    records,
                    source,
                    fetched_at: now,
                };
            }
        }

        let curated = providers::curated_upcoming(now);
        if !curated.is_empty() {
            self.cache.write(&CacheEntry::new(
                curated.clone(),
                CURATED_SOURCE.to_string(),
                now,
            ));
            return ShowerFeed {
                records: curated,
                source: CURATED_SOURCE.to_string(),
                fetched_at: now,
            };
        }

        // Last resort: never cached, no provenance tracked.
        ShowerFeed {
            records: providers::static_display_set(now),
            source: String::new(),
            fetched_at: now,
        }
    }

    /// The active-shower view: recently peaked and imminent showers drawn
    /// from the same resolved data.
    pub fn active(&mut self, now: DateTime<Utc>) -> ShowerFeed {
        let feed = self.resolve(now);
        ShowerFeed {
            records: normalize::select(feed.records, WindowPolicy::Active, now),
            source: feed.source,
            fetched_at: feed.fetched_at,
        }
    }
}

impl Default for ShowerResolver {
    fn default() -> Self {
        Self::new()
    }
}
