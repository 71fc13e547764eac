//! Coarse lunar phase and viewing-window approximations.
//!
//! The moon math here is intentionally low precision: elapsed days since a
//! fixed reference new moon, folded into the mean synodic cycle and mapped
//! onto eight named bands with piecewise-linear illumination. Good enough
//! to decide whether the sky is washed out, not an ephemeris.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use std::fmt;

/// Mean synodic month length in civil days.
pub const LUNAR_CYCLE_DAYS: f64 = 29.53059;

/// Reference new moon used as the cycle anchor (2024-01-11 11:57 UTC).
pub fn reference_new_moon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 11, 11, 57, 0).unwrap()
}

/// The eight named phase bands of the lunar cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MoonPhase {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl fmt::Display for MoonPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewMoon => write!(f, "New Moon"),
            Self::WaxingCrescent => write!(f, "Waxing Crescent"),
            Self::FirstQuarter => write!(f, "First Quarter"),
            Self::WaxingGibbous => write!(f, "Waxing Gibbous"),
            Self::FullMoon => write!(f, "Full Moon"),
            Self::WaningGibbous => write!(f, "Waning Gibbous"),
            Self::LastQuarter => write!(f, "Last Quarter"),
            Self::WaningCrescent => write!(f, "Waning Crescent"),
        }
    }
}

/// Moon state at an instant: phase band, illuminated fraction, cycle age.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MoonState {
    pub phase: MoonPhase,
    /// Illuminated disc fraction as a percentage, clamped to [0, 100].
    pub illumination_percent: f64,
    /// Days into the current synodic cycle, in [0, 29.53059).
    pub age_days: f64,
}

// Band boundaries in cycle days. Each band spans roughly an eighth of the
// cycle except the final crescent, which absorbs the remainder.
const B1: f64 = 1.84566;
const B2: f64 = 5.53699;
const B3: f64 = 9.22831;
const B4: f64 = 12.91963;
const B5: f64 = 16.61096;
const B6: f64 = 20.30228;
const B7: f64 = 23.99361;

/// Compute the moon state for a UTC instant. Total: never fails, always
/// returns clamped values.
pub fn moon_state(at: DateTime<Utc>) -> MoonState {
    let elapsed = (at - reference_new_moon()).num_seconds() as f64 / 86_400.0;
    let age = elapsed.rem_euclid(LUNAR_CYCLE_DAYS);

    let (phase, illumination) = if age < B1 {
        (MoonPhase::NewMoon, 0.0)
    } else if age < B2 {
        (MoonPhase::WaxingCrescent, (age - B1) / 3.69133 * 25.0)
    } else if age < B3 {
        (MoonPhase::FirstQuarter, 25.0 + (age - B2) / 3.69132 * 25.0)
    } else if age < B4 {
        (MoonPhase::WaxingGibbous, 50.0 + (age - B3) / 3.69132 * 25.0)
    } else if age < B5 {
        (MoonPhase::FullMoon, 75.0 + (age - B4) / 3.69133 * 25.0)
    } else if age < B6 {
        (MoonPhase::WaningGibbous, 100.0 - (age - B5) / 3.69132 * 25.0)
    } else if age < B7 {
        (MoonPhase::LastQuarter, 75.0 - (age - B6) / 3.69133 * 25.0)
    } else {
        (MoonPhase::WaningCrescent, 50.0 - (age - B7) / 5.53699 * 25.0)
    };

    MoonState {
        phase,
        illumination_percent: illumination.clamp(0.0, 100.0),
        age_days: age,
    }
}

/// Apparent visual magnitude from the illuminated percentage.
pub fn moon_magnitude(illumination_percent: f64) -> f64 {
    let i = illumination_percent;
    -12.74 + 0.026 * i + 4e-9 * i.powi(4)
}

/// Five-bucket qualitative brightness label.
pub fn brightness_description(illumination_percent: f64) -> &'static str {
    if illumination_percent < 5.0 {
        "Very Dark"
    } else if illumination_percent < 25.0 {
        "Dark"
    } else if illumination_percent < 50.0 {
        "Moderate"
    } else if illumination_percent < 75.0 {
        "Bright"
    } else {
        "Very Bright"
    }
}

/// How strongly the moon degrades meteor visibility.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MoonImpact {
    pub level: &'static str,
    pub description: &'static str,
}

pub fn moon_impact(illumination_percent: f64) -> MoonImpact {
    if illumination_percent < 10.0 {
        MoonImpact {
            level: "Minimal",
            description: "Moon has little impact on meteor visibility. Excellent conditions!",
        }
    } else if illumination_percent < 30.0 {
        MoonImpact {
            level: "Low",
            description: "Moon provides some light pollution but meteors should still be visible.",
        }
    } else if illumination_percent < 60.0 {
        MoonImpact {
            level: "Moderate",
            description: "Moon brightness may wash out fainter meteors. Look for brighter ones.",
        }
    } else if illumination_percent < 90.0 {
        MoonImpact {
            level: "High",
            description: "Bright moon significantly reduces meteor visibility. Only bright meteors visible.",
        }
    } else {
        MoonImpact {
            level: "Very High",
            description: "Full moon creates severe light pollution. Very poor meteor viewing conditions.",
        }
    }
}

/// Fixed-clock viewing window for a local date.
///
/// Sunset and sunrise are NOT geographically derived — 18:30 and 06:30 are
/// deliberate placeholders until a proper solar model lands.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ViewingWindow {
    pub sunset: NaiveDateTime,
    pub best_start: NaiveDateTime,
    pub peak_start: NaiveDateTime,
    pub peak_end: NaiveDateTime,
    pub sunrise: NaiveDateTime,
}

/// Build the viewing window for the night starting on `date`.
pub fn viewing_window(date: NaiveDate) -> ViewingWindow {
    let sunset = date.and_time(NaiveTime::from_hms_opt(18, 30, 0).unwrap());
    let sunrise = (date + Duration::days(1)).and_time(NaiveTime::from_hms_opt(6, 30, 0).unwrap());
    ViewingWindow {
        sunset,
        best_start: sunset + Duration::hours(2),
        peak_start: sunset + Duration::hours(4),
        peak_end: sunrise - Duration::hours(2),
        sunrise,
    }
}

/// Human-readable status for "should I go outside right now".
pub fn viewing_status(now: NaiveDateTime, window: &ViewingWindow) -> &'static str {
    if now < window.sunset {
        "Wait for sunset"
    } else if now < window.sunrise {
        "Good viewing time!"
    } else {
        "Wait for tonight"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reference_epoch_is_new_moon() {
        let state = moon_state(reference_new_moon());
        assert_eq!(state.phase, MoonPhase::NewMoon);
        assert_relative_eq!(state.illumination_percent, 0.0);
        assert!(state.age_days < 1e-9);
    }

    #[test]
    fn test_full_moon_mid_cycle() {
        let at = reference_new_moon() + Duration::days(14) + Duration::hours(18);
        let state = moon_state(at);
        assert_eq!(state.phase, MoonPhase::FullMoon);
        assert!(state.illumination_percent > 75.0);
    }

    #[test]
    fn test_illumination_bounded_over_full_cycle() {
        let epoch = reference_new_moon();
        for h in 0..(30 * 24) {
            let state = moon_state(epoch + Duration::hours(h));
            assert!(
                (0.0..=100.0).contains(&state.illumination_percent),
                "illumination out of range at +{}h: {}",
                h,
                state.illumination_percent
            );
            assert!(state.age_days >= 0.0 && state.age_days < LUNAR_CYCLE_DAYS);
        }
    }

    #[test]
    fn test_dates_before_epoch_fold_positive() {
        let state = moon_state(reference_new_moon() - Duration::days(3));
        assert!(state.age_days >= 0.0 && state.age_days < LUNAR_CYCLE_DAYS);
    }

    #[test]
    fn test_quarter_illumination_anchors() {
        // Midpoint of the First Quarter band should sit near 37.5%.
        let at = reference_new_moon() + Duration::milliseconds((7.38265 * 86_400_000.0) as i64);
        let state = moon_state(at);
        assert_eq!(state.phase, MoonPhase::FirstQuarter);
        assert!((state.illumination_percent - 37.5).abs() < 1.0);
    }

    #[test]
    fn test_moon_magnitude_new_and_full() {
        assert_relative_eq!(moon_magnitude(0.0), -12.74);
        assert!(moon_magnitude(100.0) > moon_magnitude(0.0));
    }

    #[test]
    fn test_brightness_buckets() {
        assert_eq!(brightness_description(2.0), "Very Dark");
        assert_eq!(brightness_description(24.9), "Dark");
        assert_eq!(brightness_description(49.0), "Moderate");
        assert_eq!(brightness_description(74.0), "Bright");
        assert_eq!(brightness_description(95.0), "Very Bright");
    }

    #[test]
    fn test_impact_levels() {
        assert_eq!(moon_impact(5.0).level, "Minimal");
        assert_eq!(moon_impact(20.0).level, "Low");
        assert_eq!(moon_impact(45.0).level, "Moderate");
        assert_eq!(moon_impact(80.0).level, "High");
        assert_eq!(moon_impact(97.0).level, "Very High");
    }

    #[test]
    fn test_viewing_window_offsets() {
        let date = NaiveDate::from_ymd_opt(2025, 8, 12).unwrap();
        let w = viewing_window(date);
        assert_eq!(w.best_start - w.sunset, Duration::hours(2));
        assert_eq!(w.peak_start - w.sunset, Duration::hours(4));
        assert_eq!(w.sunrise - w.peak_end, Duration::hours(2));
        assert_eq!(w.sunrise.date(), date + Duration::days(1));
    }

    #[test]
    fn test_viewing_status_transitions() {
        let date = NaiveDate::from_ymd_opt(2025, 8, 12).unwrap();
        let w = viewing_window(date);
        let afternoon = date.and_time(NaiveTime::from_hms_opt(14, 0, 0).unwrap());
        let midnight = date.and_time(NaiveTime::from_hms_opt(23, 30, 0).unwrap());
        let morning = (date + Duration::days(1)).and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(viewing_status(afternoon, &w), "Wait for sunset");
        assert_eq!(viewing_status(midnight, &w), "Good viewing time!");
        assert_eq!(viewing_status(morning, &w), "Wait for tonight");
    }
}
