//! Meteor-shower data subsystem for Aureo.
//!
//! Provides live source providers, record normalization, a freshness cache,
//! and a fallback chain that always yields a non-empty feed.

pub mod cache;
pub mod normalize;
pub mod providers;
pub mod resolver;
pub mod types;

pub use cache::{CacheEntry, FreshnessCache, SHOWER_TTL_MS};
pub use normalize::{next_peak, WindowPolicy};
pub use providers::{curated_upcoming, popular_feed, popular_showers, ShowerProvider, POPULAR_SOURCE};
pub use resolver::{ShowerResolver, CURATED_SOURCE};
pub use types::{RawShower, ShowerError, ShowerFeed, ShowerRecord, Zhr};
