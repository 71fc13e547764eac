//! Viewing-condition scoring policies.
//!
//! Two deliberately distinct formulas coexist: the live-stats policy
//! (continuous penalties) and the alert policy (stepped bonuses/penalties).
//! They drifted apart in the product and are kept as separate named
//! policies on purpose — do not merge them.

use crate::astro::{MoonPhase, MoonState};
use crate::weather::WeatherState;
use serde::Serialize;
use std::fmt;

/// Discretized human-readable bucket for a 0-100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tier {
    Excellent,
    Good,
    Fair,
    Poor,
    VeryPoor,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Excellent => write!(f, "Excellent"),
            Self::Good => write!(f, "Good"),
            Self::Fair => write!(f, "Fair"),
            Self::Poor => write!(f, "Poor"),
            Self::VeryPoor => write!(f, "Very Poor"),
        }
    }
}

/// A bounded visibility score with its derived tier.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct VisibilityScore {
    pub value: u8,
    pub tier: Tier,
}

impl VisibilityScore {
    /// Round and clamp a raw score into [0, 100], then bucket it.
    pub fn from_raw(raw: f64) -> Self {
        let value = raw.round().clamp(0.0, 100.0) as u8;
        let tier = if value >= 80 {
            Tier::Excellent
        } else if value >= 60 {
            Tier::Good
        } else if value >= 40 {
            Tier::Fair
        } else if value >= 20 {
            Tier::Poor
        } else {
            Tier::VeryPoor
        };
        Self { value, tier }
    }
}

fn is_daytime(hour: u32) -> bool {
    (6..=18).contains(&hour)
}

fn is_late_night(hour: u32) -> bool {
    hour >= 22 || hour <= 4
}

/// Live-stats policy: continuous penalties from moon glare, cloud cover,
/// and a coarse daytime gate. Total and clamped for any input.
pub fn visibility_score(moon: &MoonState, weather: &WeatherState, hour: u32) -> VisibilityScore {
    let mut score = 100.0;
    score -= moon.illumination_percent * 0.5;
    score -= weather.cloud_cover_percent * 0.3;
    if is_daytime(hour) {
        score -= 50.0;
    }
    VisibilityScore::from_raw(score)
}

/// Alert policy: stepped bonuses and penalties keyed off phase names and
/// thresholds rather than continuous values. Diverges from
/// [`visibility_score`] by design.
pub fn alert_score(moon: &MoonState, weather: &WeatherState, hour: u32) -> VisibilityScore {
    let mut score = 100.0;

    match moon.phase {
        MoonPhase::FullMoon => score -= 40.0,
        MoonPhase::NewMoon => score += 20.0,
        _ => {}
    }

    if weather.cloud_cover_percent > 70.0 {
        score -= 30.0;
    } else if weather.cloud_cover_percent < 30.0 {
        score += 10.0;
    }

    if is_daytime(hour) {
        score -= 50.0;
    } else if is_late_night(hour) {
        score += 20.0;
    }

    VisibilityScore::from_raw(score)
}

/// Additive meteor-intensity estimate used by the notification surface:
/// ZHR contributes up to 40 points, sky clarity up to 30, visibility
/// distance up to 20, and a dark-moon bonus up to 10.
pub fn meteor_intensity(zhr: f64, weather: &WeatherState, moon_phase: MoonPhase) -> u8 {
    let mut intensity = (zhr / 120.0 * 40.0).min(40.0).max(0.0);

    if weather.cloud_cover_percent < 20.0 {
        intensity += 30.0;
    } else if weather.cloud_cover_percent < 50.0 {
        intensity += 20.0;
    } else if weather.cloud_cover_percent < 80.0 {
        intensity += 10.0;
    }

    if weather.visibility_km > 15.0 {
        intensity += 20.0;
    } else if weather.visibility_km > 10.0 {
        intensity += 15.0;
    } else if weather.visibility_km > 5.0 {
        intensity += 10.0;
    }

    match moon_phase {
        MoonPhase::NewMoon => intensity += 10.0,
        MoonPhase::WaningCrescent | MoonPhase::WaxingCrescent => intensity += 5.0,
        _ => {}
    }

    intensity.clamp(0.0, 100.0).round() as u8
}

/// Qualitative activity label from a shower's zenithal hourly rate.
pub fn zhr_activity_level(zhr: f64) -> &'static str {
    if zhr >= 100.0 {
        "Very High"
    } else if zhr >= 50.0 {
        "High"
    } else if zhr >= 20.0 {
        "Medium"
    } else if zhr >= 10.0 {
        "Low"
    } else {
        "Very Low"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astro::MoonPhase;

    fn moon(illumination: f64, phase: MoonPhase) -> MoonState {
        MoonState {
            phase,
            illumination_percent: illumination,
            age_days: 0.0,
        }
    }

    fn weather(cloud: f64, visibility: f64) -> WeatherState {
        WeatherState {
            cloud_cover_percent: cloud,
            visibility_km: visibility,
            condition: "Clear".into(),
            temperature_c: 15.0,
        }
    }

    #[test]
    fn test_perfect_night() {
        let s = visibility_score(&moon(0.0, MoonPhase::NewMoon), &weather(0.0, 20.0), 23);
        assert_eq!(s.value, 100);
        assert_eq!(s.tier, Tier::Excellent);
    }

    #[test]
    fn test_washed_out_afternoon() {
        // Bright moon, heavy cloud, daytime: 100 - 47.5 - 27 - 50 < 0 -> 0.
        let s = visibility_score(&moon(95.0, MoonPhase::FullMoon), &weather(90.0, 2.0), 14);
        assert!(s.value <= 5);
        assert_eq!(s.tier, Tier::VeryPoor);
    }

    #[test]
    fn test_clamps_out_of_range_inputs() {
        let s = visibility_score(&moon(150.0, MoonPhase::FullMoon), &weather(250.0, 0.0), 12);
        assert_eq!(s.value, 0);
        let s = visibility_score(&moon(-50.0, MoonPhase::NewMoon), &weather(-30.0, 0.0), 23);
        assert_eq!(s.value, 100);
    }

    #[test]
    fn test_monotonic_in_illumination() {
        let w = weather(40.0, 12.0);
        let mut prev = u8::MAX;
        for ill in [0.0, 10.0, 25.0, 50.0, 75.0, 100.0] {
            let s = visibility_score(&moon(ill, MoonPhase::WaxingGibbous), &w, 23);
            assert!(s.value <= prev, "score must not increase with illumination");
            prev = s.value;
        }
    }

    #[test]
    fn test_monotonic_in_cloud_cover() {
        let m = moon(20.0, MoonPhase::WaxingCrescent);
        let mut prev = u8::MAX;
        for cloud in [0.0, 20.0, 40.0, 60.0, 80.0, 100.0] {
            let s = visibility_score(&m, &weather(cloud, 12.0), 23);
            assert!(s.value <= prev, "score must not increase with cloud cover");
            prev = s.value;
        }
    }

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(VisibilityScore::from_raw(80.0).tier, Tier::Excellent);
        assert_eq!(VisibilityScore::from_raw(79.0).tier, Tier::Good);
        assert_eq!(VisibilityScore::from_raw(60.0).tier, Tier::Good);
        assert_eq!(VisibilityScore::from_raw(59.0).tier, Tier::Fair);
        assert_eq!(VisibilityScore::from_raw(40.0).tier, Tier::Fair);
        assert_eq!(VisibilityScore::from_raw(39.0).tier, Tier::Poor);
        assert_eq!(VisibilityScore::from_raw(20.0).tier, Tier::Poor);
        assert_eq!(VisibilityScore::from_raw(19.0).tier, Tier::VeryPoor);
    }

    #[test]
    fn test_alert_policy_diverges_from_live_policy() {
        // 50% illumination, 50% cloud, late night: live policy penalizes
        // continuously, alert policy applies neither bonus nor penalty.
        let m = moon(50.0, MoonPhase::WaxingGibbous);
        let w = weather(50.0, 12.0);
        let live = visibility_score(&m, &w, 23);
        let alert = alert_score(&m, &w, 23);
        assert_ne!(live.value, alert.value);
    }

    #[test]
    fn test_alert_score_new_moon_clear_late() {
        let s = alert_score(&moon(0.0, MoonPhase::NewMoon), &weather(10.0, 18.0), 23);
        assert_eq!(s.value, 100); // 100 + 20 + 10 + 20 clamped
    }

    #[test]
    fn test_alert_score_full_moon_overcast_noon() {
        let s = alert_score(&moon(100.0, MoonPhase::FullMoon), &weather(90.0, 2.0), 12);
        assert_eq!(s.value, 0); // 100 - 40 - 30 - 50 clamped
    }

    #[test]
    fn test_meteor_intensity_best_case() {
        // Geminids-class ZHR, clear, far visibility, new moon: 40+30+20+10.
        let i = meteor_intensity(120.0, &weather(10.0, 20.0), MoonPhase::NewMoon);
        assert_eq!(i, 100);
    }

    #[test]
    fn test_meteor_intensity_overcast_floor() {
        let i = meteor_intensity(10.0, &weather(95.0, 3.0), MoonPhase::FullMoon);
        assert!(i <= 5);
    }

    #[test]
    fn test_zhr_activity_levels() {
        assert_eq!(zhr_activity_level(120.0), "Very High");
        assert_eq!(zhr_activity_level(60.0), "High");
        assert_eq!(zhr_activity_level(20.0), "Medium");
        assert_eq!(zhr_activity_level(12.0), "Low");
        assert_eq!(zhr_activity_level(5.0), "Very Low");
    }
}
