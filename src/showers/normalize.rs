//! Normalization of heterogeneous source records into canonical form.
//!
//! Sources disagree on field names (`peak` vs `peakDate` vs `date`) and on
//! which fields exist at all. Everything is resolved here, at the boundary,
//! so nothing loosely typed travels further into the system.

use super::types::{RawShower, ShowerRecord, Zhr};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

/// Display truncation for the upcoming-events feed.
pub const UPCOMING_LIMIT: usize = 8;
/// Display truncation for the active-shower list.
pub const ACTIVE_LIMIT: usize = 5;
/// How far ahead the upcoming view looks.
pub const UPCOMING_HORIZON_DAYS: i64 = 365;

/// Windowing policies for the two consumers of normalized data. The event
/// feed wants strictly future peaks; the alert surface also wants showers
/// just past their peak, which are still producing meteors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPolicy {
    /// Peaks in [now, now + horizon), truncated to 8.
    Upcoming,
    /// Peaks in [now - 7 days, now + 30 days], truncated to 5.
    Active,
}

/// Parse a source date string. Accepts RFC 3339, a bare datetime, or a bare
/// date (midnight UTC).
fn parse_peak(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    None
}

/// Normalize one raw record. Returns None when the record must be dropped
/// (a peak field was present but unparseable). An entirely absent peak
/// defaults to `now` rather than dropping the record.
fn normalize_one(raw: &RawShower, now: DateTime<Utc>) -> Option<ShowerRecord> {
    let peak_field = raw
        .peak
        .as_deref()
        .or(raw.peak_date.as_deref())
        .or(raw.date.as_deref());

    let peak = match peak_field {
        Some(s) => parse_peak(s)?,
        None => now,
    };

    let name = match raw.name.as_deref() {
        Some(n) if !n.trim().is_empty() => n.trim().to_string(),
        _ => "Unknown Shower".to_string(),
    };

    Some(ShowerRecord {
        name,
        peak,
        zhr: raw.zhr.clone().unwrap_or_else(Zhr::unknown),
        parent: raw
            .parent
            .clone()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| "Unknown".into()),
        description: raw.description.clone().unwrap_or_default(),
        radiant: raw.radiant.clone().unwrap_or_default(),
        velocity: raw.velocity.clone().unwrap_or_default(),
        image: raw.image.clone().filter(|u| !u.is_empty()),
    })
}

/// Normalize a batch of raw source records. Unparseable records are dropped,
/// everything else gets sentinel defaults for missing fields. No windowing
/// or ordering is applied here — see [`select`].
pub fn normalize(raws: &[RawShower], now: DateTime<Utc>) -> Vec<ShowerRecord> {
    raws.iter().filter_map(|r| normalize_one(r, now)).collect()
}

/// Apply a window policy: filter, sort ascending by peak, then truncate.
/// Truncation always happens after the sort so the nearest peaks win.
pub fn select(
    mut records: Vec<ShowerRecord>,
    policy: WindowPolicy,
    now: DateTime<Utc>,
) -> Vec<ShowerRecord> {
    records.retain(|r| match policy {
        WindowPolicy::Upcoming => {
            r.peak >= now && r.peak < now + Duration::days(UPCOMING_HORIZON_DAYS)
        }
        WindowPolicy::Active => {
            r.peak >= now - Duration::days(7) && r.peak <= now + Duration::days(30)
        }
    });
    records.sort_by_key(|r| r.peak);
    let limit = match policy {
        WindowPolicy::Upcoming => UPCOMING_LIMIT,
        WindowPolicy::Active => ACTIVE_LIMIT,
    };
    records.truncate(limit);
    records
}

/// The next shower peaking strictly after `now`, from an already-normalized
/// list.
pub fn next_peak(records: &[ShowerRecord], now: DateTime<Utc>) -> Option<&ShowerRecord> {
    records
        .iter()
        .filter(|r| r.peak > now)
        .min_by_key(|r| r.peak)
}
