//! Shower data providers: live APIs, the curated dataset, and the static
//! display set.
//!
//! Every provider returns raw records; normalization happens in the
//! fallback chain. Each live call carries an explicit timeout so a hung
//! provider cannot stall the chain's progression to the next source.

use super::types::{RawShower, ShowerError, ShowerFeed, ShowerRecord, Zhr};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);
const USER_AGENT: &str = "AureoMeteor/0.3 (viewing-conditions-engine)";

/// A single data source in the fallback chain.
pub trait ShowerProvider {
    /// Provenance label recorded alongside any data this source produces.
    fn label(&self) -> &'static str;
    /// Fetch raw records. Errors and empty results are equivalent to the
    /// chain: both move it to the next provider.
    fn fetch(&self) -> Result<Vec<RawShower>, ShowerError>;
}

/// The default provider ordering: IMO table, NASA APOD search, community API.
pub fn default_providers() -> Vec<Box<dyn ShowerProvider + Send>> {
    vec![
        Box::new(ImoCalendar),
        Box::new(NasaApod),
        Box::new(CommunityApi),
    ]
}

// ─── IMO calendar ────────────────────────────────────────────────

/// IMO's published calendar is HTML and needs server-side scraping, so this
/// provider carries the 2024 calendar as a fixed table. Records past their
/// window fall out during normalization, which pushes the chain onward.
pub struct ImoCalendar;

struct ImoEntry {
    name: &'static str,
    peak: &'static str,
    zhr: f64,
    parent: &'static str,
    description: &'static str,
    radiant: &'static str,
    velocity: &'static str,
}

const IMO_2024: &[ImoEntry] = &[
    ImoEntry {
        name: "Quadrantids",
        peak: "2024-01-04T06:00:00Z",
        zhr: 110.0,
        parent: "2003 EH1",
        description: "One of the most intense annual meteor showers",
        radiant: "Bootes",
        velocity: "41 km/s",
    },
    ImoEntry {
        name: "Lyrids",
        peak: "2024-04-22T18:00:00Z",
        zhr: 18.0,
        parent: "Comet Thatcher",
        description: "Known for producing bright meteors with persistent trains",
        radiant: "Lyra",
        velocity: "49 km/s",
    },
    ImoEntry {
        name: "Eta Aquariids",
        peak: "2024-05-06T09:00:00Z",
        zhr: 50.0,
        parent: "Comet Halley",
        description: "Best viewed from southern hemisphere",
        radiant: "Aquarius",
        velocity: "66 km/s",
    },
    ImoEntry {
        name: "Perseids",
        peak: "2024-08-13T07:00:00Z",
        zhr: 100.0,
        parent: "Comet Swift-Tuttle",
        description: "Most popular meteor shower of the year",
        radiant: "Perseus",
        velocity: "59 km/s",
    },
    ImoEntry {
        name: "Orionids",
        peak: "2024-10-21T23:00:00Z",
        zhr: 20.0,
        parent: "Comet Halley",
        description: "Fast meteors with persistent trains",
        radiant: "Orion",
        velocity: "66 km/s",
    },
    ImoEntry {
        name: "Leonids",
        peak: "2024-11-17T05:00:00Z",
        zhr: 15.0,
        parent: "Comet Tempel-Tuttle",
        description: "Famous for producing meteor storms",
        radiant: "Leo",
        velocity: "71 km/s",
    },
    ImoEntry {
        name: "Geminids",
        peak: "2024-12-14T19:00:00Z",
        zhr: 120.0,
        parent: "Asteroid 3200 Phaethon",
        description: "Most reliable meteor shower of the year",
        radiant: "Gemini",
        velocity: "35 km/s",
    },
    ImoEntry {
        name: "Ursids",
        peak: "2024-12-22T22:00:00Z",
        zhr: 10.0,
        parent: "Comet Tuttle",
        description: "Minor shower visible from northern hemisphere",
        radiant: "Ursa Minor",
        velocity: "33 km/s",
    },
];

impl ShowerProvider for ImoCalendar {
    fn label(&self) -> &'static str {
        "IMO Meteor Shower Database"
    }

    fn fetch(&self) -> Result<Vec<RawShower>, ShowerError> {
        Ok(IMO_2024
            .iter()
            .map(|e| RawShower {
                name: Some(e.name.into()),
                peak: Some(e.peak.into()),
                zhr: Some(Zhr::Rate(e.zhr)),
                parent: Some(e.parent.into()),
                description: Some(e.description.into()),
                radiant: Some(e.radiant.into()),
                velocity: Some(e.velocity.into()),
                ..Default::default()
            })
            .collect())
    }
}

// ─── NASA APOD search ────────────────────────────────────────────

/// NASA has no meteor-shower endpoint; the APOD feed is searched for
/// meteor-related entries and the best match is surfaced as a single
/// special-event record with its image attached.
pub struct NasaApod;

#[derive(Deserialize)]
struct ApodEntry {
    #[serde(default)]
    title: String,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    url: Option<String>,
}

impl ShowerProvider for NasaApod {
    fn label(&self) -> &'static str {
        "NASA Astronomy API"
    }

    fn fetch(&self) -> Result<Vec<RawShower>, ShowerError> {
        let key = std::env::var("AUREO_NASA_KEY").unwrap_or_else(|_| "DEMO_KEY".into());
        let url = format!(
            "https://api.nasa.gov/planetary/apod?api_key={}&count=10",
            key
        );

        let response = ureq::get(&url)
            .set("User-Agent", USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .call()
            .map_err(|e| ShowerError::Network(e.to_string()))?;

        let entries: Vec<ApodEntry> = response
            .into_json()
            .map_err(|e| ShowerError::InvalidResponse(e.to_string()))?;

        let featured = entries.into_iter().find(|e| {
            e.title.to_lowercase().contains("meteor")
                || e.explanation.to_lowercase().contains("meteor")
        });

        Ok(featured
            .map(|e| {
                let mut description: String = e.explanation.chars().take(100).collect();
                if !description.is_empty() {
                    description.push_str("...");
                }
                vec![RawShower {
                    name: Some("NASA Featured Meteor Event".into()),
                    peak: Some(Utc::now().to_rfc3339()),
                    zhr: Some(Zhr::Label("Special Event".into())),
                    parent: Some("NASA".into()),
                    description: Some(description),
                    image: e.url,
                    ..Default::default()
                }]
            })
            .unwrap_or_default())
    }
}

// ─── Community meteor-shower API ─────────────────────────────────

/// Community-maintained JSON listing. The payload is an array of loosely
/// shaped shower objects; RawShower absorbs whatever fields are present.
pub struct CommunityApi;

impl ShowerProvider for CommunityApi {
    fn label(&self) -> &'static str {
        "Meteor Shower API"
    }

    fn fetch(&self) -> Result<Vec<RawShower>, ShowerError> {
        let response = ureq::get("https://meteor-shower-api.vercel.app/api/showers")
            .set("Accept", "application/json")
            .set("User-Agent", USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .call()
            .map_err(|e| ShowerError::Network(e.to_string()))?;

        response
            .into_json()
            .map_err(|e| ShowerError::InvalidResponse(e.to_string()))
    }
}

// ─── Curated dataset ─────────────────────────────────────────────

struct CuratedEntry {
    name: &'static str,
    month: u32,
    day: u32,
    zhr: f64,
    parent: &'static str,
    description: &'static str,
}

const CURATED: &[CuratedEntry] = &[
    CuratedEntry { name: "Quadrantids", month: 1, day: 4, zhr: 110.0, parent: "2003 EH1", description: "Sharp, short peak; strong Northern shower." },
    CuratedEntry { name: "Lyrids", month: 4, day: 22, zhr: 18.0, parent: "Comet Thatcher", description: "Occasional fireballs, steady annual show." },
    CuratedEntry { name: "Eta Aquariids", month: 5, day: 6, zhr: 50.0, parent: "Comet Halley", description: "Best before dawn; stronger in Southern hemisphere." },
    CuratedEntry { name: "Perseids", month: 8, day: 12, zhr: 100.0, parent: "Comet Swift-Tuttle", description: "Most popular Northern shower; bright and numerous." },
    CuratedEntry { name: "Orionids", month: 10, day: 21, zhr: 20.0, parent: "Comet Halley", description: "Fast meteors with persistent trains." },
    CuratedEntry { name: "Leonids", month: 11, day: 17, zhr: 15.0, parent: "Comet Tempel-Tuttle", description: "Can produce storms in some years." },
    CuratedEntry { name: "Geminids", month: 12, day: 14, zhr: 120.0, parent: "3200 Phaethon", description: "Most reliable; many bright, medium-speed meteors." },
    CuratedEntry { name: "Ursids", month: 12, day: 22, zhr: 10.0, parent: "Comet Tuttle", description: "Northern minor shower near the Little Dipper." },
];

/// Project a month/day onto its nearest future occurrence at 06:00 UTC,
/// rolling to next year when this year's date has already passed.
fn nearest_future_peak(now: DateTime<Utc>, month: u32, day: u32) -> DateTime<Utc> {
    let this_year = Utc
        .with_ymd_and_hms(now.year(), month, day, 6, 0, 0)
        .single()
        .unwrap_or(now);
    if this_year < now {
        Utc.with_ymd_and_hms(now.year() + 1, month, day, 6, 0, 0)
            .single()
            .unwrap_or(this_year)
    } else {
        this_year
    }
}

/// The curated annual calendar projected forward from `now`. Non-empty by
/// construction: every entry rolls to a future date.
pub fn curated_upcoming(now: DateTime<Utc>) -> Vec<ShowerRecord> {
    let mut records: Vec<ShowerRecord> = CURATED
        .iter()
        .map(|e| ShowerRecord {
            name: e.name.into(),
            peak: nearest_future_peak(now, e.month, e.day),
            zhr: Zhr::Rate(e.zhr),
            parent: e.parent.into(),
            description: e.description.into(),
            radiant: String::new(),
            velocity: String::new(),
            image: None,
        })
        .collect();
    records.retain(|r| r.peak >= now);
    records.sort_by_key(|r| r.peak);
    records.truncate(8);
    records
}

// ─── Popular showers ─────────────────────────────────────────────

/// Provenance label for the popular-shower calendar.
pub const POPULAR_SOURCE: &str = "Popular Showers";

const POPULAR: &[(&str, u32, u32, f64, &str)] = &[
    ("Quadrantids", 1, 4, 110.0, "2003 EH1"),
    ("Lyrids", 4, 22, 18.0, "Comet Thatcher"),
    ("Perseids", 8, 12, 100.0, "Comet Swift-Tuttle"),
    ("Leonids", 11, 17, 15.0, "Comet Tempel-Tuttle"),
    ("Geminids", 12, 14, 120.0, "3200 Phaethon"),
];

/// The fixed headline five, projected forward and sorted by next peak.
pub fn popular_showers(now: DateTime<Utc>, limit: usize) -> Vec<ShowerRecord> {
    let mut records: Vec<ShowerRecord> = POPULAR
        .iter()
        .map(|&(name, month, day, zhr, parent)| ShowerRecord {
            name: name.into(),
            peak: nearest_future_peak(now, month, day),
            zhr: Zhr::Rate(zhr),
            parent: parent.into(),
            description: String::new(),
            radiant: String::new(),
            velocity: String::new(),
            image: None,
        })
        .collect();
    records.retain(|r| r.peak >= now);
    records.sort_by_key(|r| r.peak);
    records.truncate(limit);
    records
}

/// The popular five wrapped as a feed under their own provenance label,
/// distinct from the curated fallback.
pub fn popular_feed(now: DateTime<Utc>) -> ShowerFeed {
    ShowerFeed {
        records: popular_showers(now, 5),
        source: POPULAR_SOURCE.to_string(),
        fetched_at: now,
    }
}

// ─── Static display set ──────────────────────────────────────────

/// Last-resort display set for when even the curated projection yields
/// nothing. No provenance is tracked for these.
pub fn static_display_set(now: DateTime<Utc>) -> Vec<ShowerRecord> {
    [
        ("Perseids", 8u32, 12u32, 100.0, "Comet Swift-Tuttle"),
        ("Geminids", 12, 14, 120.0, "3200 Phaethon"),
        ("Quadrantids", 1, 4, 110.0, "2003 EH1"),
    ]
    .iter()
    .map(|&(name, month, day, zhr, parent)| ShowerRecord {
        name: name.into(),
        peak: nearest_future_peak(now, month, day),
        zhr: Zhr::Rate(zhr),
        parent: parent.into(),
        description: String::new(),
        radiant: String::new(),
        velocity: String::new(),
        image: None,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_imo_table_complete() {
        let raws = ImoCalendar.fetch().unwrap();
        assert_eq!(raws.len(), 8);
        assert!(raws.iter().all(|r| r.peak.is_some() && r.radiant.is_some()));
    }

    #[test]
    fn test_nearest_future_rolls_to_next_year() {
        let now = at(2025, 9, 1);
        // Perseids (Aug 12) already passed in 2025.
        let peak = nearest_future_peak(now, 8, 12);
        assert_eq!(peak, Utc.with_ymd_and_hms(2026, 8, 12, 6, 0, 0).unwrap());
        // Geminids (Dec 14) still ahead.
        let peak = nearest_future_peak(now, 12, 14);
        assert_eq!(peak, Utc.with_ymd_and_hms(2025, 12, 14, 6, 0, 0).unwrap());
    }

    #[test]
    fn test_curated_always_full_and_sorted() {
        for &(y, m, d) in &[(2025, 1, 1), (2025, 8, 15), (2025, 12, 30)] {
            let now = at(y, m, d);
            let records = curated_upcoming(now);
            assert_eq!(records.len(), 8, "curated set must stay complete");
            assert!(records.windows(2).all(|w| w[0].peak <= w[1].peak));
            assert!(records.iter().all(|r| r.peak >= now));
        }
    }

    #[test]
    fn test_curated_first_after_new_year() {
        let now = at(2025, 1, 1);
        let records = curated_upcoming(now);
        assert_eq!(records[0].name, "Quadrantids");
        assert_eq!(records[0].peak.year(), 2025);
    }

    #[test]
    fn test_popular_limit_and_order() {
        let now = at(2025, 6, 1);
        let records = popular_showers(now, 5);
        assert_eq!(records.len(), 5);
        assert_eq!(records[0].name, "Perseids"); // next up from June
        assert!(records.windows(2).all(|w| w[0].peak <= w[1].peak));
    }

    #[test]
    fn test_popular_feed_carries_its_own_provenance() {
        let feed = popular_feed(at(2025, 6, 1));
        assert_eq!(feed.source, POPULAR_SOURCE);
        assert_ne!(feed.source, crate::showers::CURATED_SOURCE);
        assert_eq!(feed.records.len(), 5);
    }

    #[test]
    fn test_static_display_set_never_empty() {
        let records = static_display_set(at(2025, 12, 31));
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| !r.name.is_empty()));
    }
}
