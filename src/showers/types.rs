//! Core types for the meteor-shower data subsystem.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Zenithal hourly rate: a numeric rate when the source provides one, or a
/// free-form label ("Unknown", "Special Event") when it does not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Zhr {
    Rate(f64),
    Label(String),
}

impl Zhr {
    pub fn unknown() -> Self {
        Self::Label("Unknown".into())
    }

    /// Numeric rate if present.
    pub fn rate(&self) -> Option<f64> {
        match self {
            Self::Rate(r) => Some(*r),
            Self::Label(_) => None,
        }
    }
}

impl fmt::Display for Zhr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rate(r) if r.fract() == 0.0 => write!(f, "{}", *r as i64),
            Self::Rate(r) => write!(f, "{}", r),
            Self::Label(s) => write!(f, "{}", s),
        }
    }
}

/// A meteor shower in canonical form. Every record that enters a sorted or
/// filtered collection carries a valid peak timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowerRecord {
    pub name: String,
    pub peak: DateTime<Utc>,
    pub zhr: Zhr,
    pub parent: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub radiant: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub velocity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ShowerRecord {
    /// Whole days from `now` until the peak (negative if past).
    pub fn days_until_peak(&self, now: DateTime<Utc>) -> i64 {
        (self.peak - now).num_days()
    }
}

/// A loosely-typed record as received from an external source. Every field
/// may be absent; the normalizer is the only place these are interpreted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawShower {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub peak: Option<String>,
    #[serde(default, rename = "peakDate")]
    pub peak_date: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub zhr: Option<Zhr>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub radiant: Option<String>,
    #[serde(default)]
    pub velocity: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// A resolved feed: the records plus where they came from and when.
#[derive(Debug, Clone, Serialize)]
pub struct ShowerFeed {
    pub records: Vec<ShowerRecord>,
    /// Provenance label of the source that produced the records.
    pub source: String,
    pub fetched_at: DateTime<Utc>,
}

/// Data-source errors. A provider error never propagates past the fallback
/// chain; it only moves the chain to the next provider.
#[derive(Debug)]
pub enum ShowerError {
    Network(String),
    InvalidResponse(String),
}

impl fmt::Display for ShowerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::InvalidResponse(msg) => write!(f, "Invalid API response: {}", msg),
        }
    }
}

impl std::error::Error for ShowerError {}
