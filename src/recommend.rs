//! Viewing recommendations and the alerting surface.
//!
//! Recommendations are produced by a fixed-order rule list so output stays
//! stable for a given set of conditions. The alert checker is a separate
//! surface with its own thresholds and user-tunable settings.

use crate::astro::{MoonPhase, MoonState};
use crate::score::{meteor_intensity, zhr_activity_level, VisibilityScore};
use crate::showers::ShowerRecord;
use crate::store::Store;
use crate::weather::WeatherState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single piece of viewing advice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub icon: &'static str,
    pub text: String,
}

fn rec(icon: &'static str, text: impl Into<String>) -> Recommendation {
    Recommendation {
        icon,
        text: text.into(),
    }
}

/// Build the recommendation list. Rules fire in a fixed order: moon, cloud,
/// time of day, overall score, then nearest shower. When nothing fires, a
/// single moderate-conditions entry is returned so the list is never empty.
pub fn recommendations(
    moon: &MoonState,
    weather: &WeatherState,
    hour: u32,
    score: &VisibilityScore,
    nearest: Option<&ShowerRecord>,
    now: DateTime<Utc>,
) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if moon.illumination_percent > 80.0 {
        out.push(rec(
            "🌕",
            "Bright moon will wash out faint meteors - focus on fireballs",
        ));
    } else if moon.illumination_percent < 20.0 {
        out.push(rec("🌑", "Dark moon - excellent conditions for faint meteors"));
    }

    if weather.cloud_cover_percent > 70.0 {
        out.push(rec("☁️", "Heavy cloud cover - viewing not recommended tonight"));
    } else if weather.cloud_cover_percent < 30.0 {
        out.push(rec("⭐", "Clear skies - great night for meteor watching"));
    }

    if (6..=18).contains(&hour) {
        out.push(rec("🌅", "Daytime - wait for darkness after sunset"));
    } else if hour >= 22 || hour <= 4 {
        out.push(rec("🌠", "Prime viewing hours - radiants are high in the sky"));
    }

    if score.value > 80 {
        out.push(rec("🎯", "Conditions are excellent - get outside now"));
    } else if score.value < 30 {
        out.push(rec("⏰", "Poor conditions - check back tomorrow night"));
    }

    if let Some(shower) = nearest {
        let days = shower.days_until_peak(now);
        if (0..=3).contains(&days) {
            let activity = shower
                .zhr
                .rate()
                .map(zhr_activity_level)
                .unwrap_or("Unknown");
            out.push(rec(
                "💫",
                format!(
                    "{} peaks within {} day(s) - expected activity: {}",
                    shower.name,
                    days.max(1),
                    activity
                ),
            ));
        }
    }

    if out.is_empty() {
        out.push(rec("🔍", "Moderate conditions - some meteors may be visible"));
    }
    out
}

// ─── Alerts ──────────────────────────────────────────────────────

const SETTINGS_KEY: &str = "meteorAlertSettings";
const HISTORY_KEY: &str = "meteorAlertHistory";
const NOTIFICATION_SETTINGS_KEY: &str = "aureoNotificationSettings";

/// Most recent alerts kept in history.
pub const ALERT_HISTORY_LIMIT: usize = 20;

/// User-tunable alert toggles, persisted alongside the shower cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertSettings {
    pub enabled: bool,
    pub new_moon_alerts: bool,
    pub clear_sky_alerts: bool,
    pub prime_time_alerts: bool,
    pub shower_alerts: bool,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            new_moon_alerts: true,
            clear_sky_alerts: true,
            prime_time_alerts: true,
            shower_alerts: true,
        }
    }
}

impl AlertSettings {
    /// Load persisted settings, falling back to defaults.
    pub fn load(store: &Store) -> Self {
        store
            .get(SETTINGS_KEY)
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, store: &mut Store) {
        if let Ok(json) = serde_json::to_string(self) {
            store.set(SETTINGS_KEY, json);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertPriority {
    High,
    Medium,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub kind: String,
    pub message: String,
    pub priority: AlertPriority,
}

/// Evaluate alert conditions. Settings gate each rule individually; a
/// disabled master switch yields nothing. Results come back highest
/// priority first, rule order within a priority.
pub fn check_alert_conditions(
    settings: &AlertSettings,
    moon: &MoonState,
    weather: &WeatherState,
    hour: u32,
    active: &[ShowerRecord],
) -> Vec<Alert> {
    if !settings.enabled {
        return Vec::new();
    }
    let mut alerts = Vec::new();

    if settings.new_moon_alerts && moon.phase == MoonPhase::NewMoon {
        alerts.push(Alert {
            kind: "new_moon".into(),
            message: "New moon tonight - the darkest skies of the month".into(),
            priority: AlertPriority::High,
        });
    }

    if settings.clear_sky_alerts && weather.cloud_cover_percent < 20.0 {
        alerts.push(Alert {
            kind: "clear_sky".into(),
            message: format!(
                "Exceptionally clear skies ({:.0}% cloud cover)",
                weather.cloud_cover_percent
            ),
            priority: AlertPriority::High,
        });
    }

    if settings.prime_time_alerts && (hour >= 22 || hour <= 4) {
        alerts.push(Alert {
            kind: "prime_time".into(),
            message: "Prime meteor viewing hours are underway".into(),
            priority: AlertPriority::Medium,
        });
    }

    if settings.shower_alerts {
        let best = active
            .iter()
            .max_by(|a, b| {
                let ra = a.zhr.rate().unwrap_or(0.0);
                let rb = b.zhr.rate().unwrap_or(0.0);
                ra.partial_cmp(&rb).unwrap_or(std::cmp::Ordering::Equal)
            });
        if let Some(shower) = best {
            let intensity = meteor_intensity(
                shower.zhr.rate().unwrap_or(0.0),
                weather,
                moon.phase,
            );
            alerts.push(Alert {
                kind: "active_shower".into(),
                message: format!(
                    "{} is active now (ZHR {}, expected intensity {}/100)",
                    shower.name, shower.zhr, intensity
                ),
                priority: AlertPriority::High,
            });
        }
    }

    alerts.sort_by_key(|a| a.priority);
    alerts
}

/// Persisted alert history, newest first, capped at
/// [`ALERT_HISTORY_LIMIT`] entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HistoryEntry {
    alert: Alert,
    /// Epoch milliseconds.
    time: i64,
}

pub struct AlertHistory {
    entries: Vec<HistoryEntry>,
}

impl AlertHistory {
    pub fn load(store: &Store) -> Self {
        let entries = store
            .get(HISTORY_KEY)
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default();
        Self { entries }
    }

    pub fn record(&mut self, store: &mut Store, alert: Alert, at: DateTime<Utc>) {
        self.entries.insert(
            0,
            HistoryEntry {
                alert,
                time: at.timestamp_millis(),
            },
        );
        self.entries.truncate(ALERT_HISTORY_LIMIT);
        if let Ok(json) = serde_json::to_string(&self.entries) {
            store.set(HISTORY_KEY, json);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Messages of recorded alerts, newest first.
    pub fn messages(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.alert.message.as_str()).collect()
    }
}

// ─── Notifications ───────────────────────────────────────────────

/// User-tunable notification toggles. A separate blob from [`AlertSettings`]:
/// alerts drive the in-app alert surface, notifications drive the sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub weather_alerts: bool,
    pub peak_alerts: bool,
    pub intensity_alerts: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            weather_alerts: true,
            peak_alerts: true,
            intensity_alerts: true,
        }
    }
}

impl NotificationSettings {
    pub fn load(store: &Store) -> Self {
        store
            .get(NOTIFICATION_SETTINGS_KEY)
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, store: &mut Store) {
        if let Ok(json) = serde_json::to_string(self) {
            store.set(NOTIFICATION_SETTINGS_KEY, json);
        }
    }
}

/// A title+body pair ready for a [`NotificationSink`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// Evaluate notification conditions: exceptional sky (clear and far
/// visibility), prime viewing hours, and high expected activity from the
/// strongest currently active shower. Each rule is gated by its own toggle.
pub fn check_notification_conditions(
    settings: &NotificationSettings,
    moon: &MoonState,
    weather: &WeatherState,
    hour: u32,
    active: &[ShowerRecord],
) -> Vec<Notification> {
    let mut notifications = Vec::new();

    if settings.weather_alerts && weather.cloud_cover_percent < 20.0 && weather.visibility_km > 15.0
    {
        notifications.push(Notification {
            title: "Perfect Viewing Conditions".into(),
            body: format!(
                "Clear skies with {:.0} km visibility - ideal for meteor watching",
                weather.visibility_km
            ),
        });
    }

    if settings.peak_alerts && (hour >= 22 || hour <= 4) {
        notifications.push(Notification {
            title: "Peak Viewing Hours".into(),
            body: "Radiants are high - the best meteor rates of the night are now".into(),
        });
    }

    if settings.intensity_alerts {
        let strongest = active.iter().max_by(|a, b| {
            let ra = a.zhr.rate().unwrap_or(0.0);
            let rb = b.zhr.rate().unwrap_or(0.0);
            ra.partial_cmp(&rb).unwrap_or(std::cmp::Ordering::Equal)
        });
        if let Some(shower) = strongest {
            let intensity =
                meteor_intensity(shower.zhr.rate().unwrap_or(0.0), weather, moon.phase);
            if intensity > 80 {
                notifications.push(Notification {
                    title: "High Meteor Activity".into(),
                    body: format!(
                        "{} is producing strong activity (intensity {}/100)",
                        shower.name, intensity
                    ),
                });
            }
        }
    }

    notifications
}

/// Delivery seam for alert notifications. The default sink drops alerts
/// silently so a headless run degrades without errors.
pub trait NotificationSink {
    fn notify(&self, title: &str, body: &str);
}

pub struct NoopSink;

impl NotificationSink for NoopSink {
    fn notify(&self, _title: &str, _body: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::showers::Zhr;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn moon(illumination: f64, phase: MoonPhase) -> MoonState {
        MoonState {
            phase,
            illumination_percent: illumination,
            age_days: 0.0,
        }
    }

    fn weather(cloud: f64) -> WeatherState {
        WeatherState {
            cloud_cover_percent: cloud,
            visibility_km: 12.0,
            condition: "Clear".into(),
            temperature_c: 15.0,
        }
    }

    fn shower(name: &str, zhr: f64, peak: DateTime<Utc>) -> ShowerRecord {
        ShowerRecord {
            name: name.into(),
            peak,
            zhr: Zhr::Rate(zhr),
            parent: "Unknown".into(),
            description: String::new(),
            radiant: String::new(),
            velocity: String::new(),
            image: None,
        }
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_recommendations_never_empty() {
        // Middling everything: no rule fires, fallback entry appears.
        let m = moon(50.0, MoonPhase::FirstQuarter);
        let w = weather(50.0);
        let score = VisibilityScore::from_raw(55.0);
        let recs = recommendations(&m, &w, 20, &score, None, at(2025, 8, 10));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].icon, "🔍");
    }

    #[test]
    fn test_recommendation_rule_order_is_fixed() {
        // Full moon + overcast + daytime + poor score: four rules fire in
        // moon, cloud, time, score order.
        let m = moon(95.0, MoonPhase::FullMoon);
        let w = weather(90.0);
        let score = VisibilityScore::from_raw(5.0);
        let recs = recommendations(&m, &w, 12, &score, None, at(2025, 8, 10));
        let icons: Vec<&str> = recs.iter().map(|r| r.icon).collect();
        assert_eq!(icons, vec!["🌕", "☁️", "🌅", "⏰"]);
    }

    #[test]
    fn test_recommendation_perfect_night() {
        let m = moon(5.0, MoonPhase::NewMoon);
        let w = weather(10.0);
        let score = VisibilityScore::from_raw(95.0);
        let recs = recommendations(&m, &w, 23, &score, None, at(2025, 8, 10));
        let icons: Vec<&str> = recs.iter().map(|r| r.icon).collect();
        assert_eq!(icons, vec!["🌑", "⭐", "🌠", "🎯"]);
    }

    #[test]
    fn test_imminent_peak_recommendation() {
        let now = at(2025, 8, 10);
        let m = moon(50.0, MoonPhase::FirstQuarter);
        let w = weather(50.0);
        let score = VisibilityScore::from_raw(55.0);
        let nearest = shower("Perseids", 100.0, now + Duration::days(2));
        let recs = recommendations(&m, &w, 20, &score, Some(&nearest), now);
        assert!(recs.iter().any(|r| r.icon == "💫" && r.text.contains("Perseids")));
    }

    #[test]
    fn test_distant_peak_stays_quiet() {
        let now = at(2025, 8, 10);
        let m = moon(50.0, MoonPhase::FirstQuarter);
        let w = weather(50.0);
        let score = VisibilityScore::from_raw(55.0);
        let nearest = shower("Geminids", 120.0, now + Duration::days(120));
        let recs = recommendations(&m, &w, 20, &score, Some(&nearest), now);
        assert!(recs.iter().all(|r| r.icon != "💫"));
    }

    #[test]
    fn test_alerts_disabled_master_switch() {
        let settings = AlertSettings {
            enabled: false,
            ..Default::default()
        };
        let alerts = check_alert_conditions(
            &settings,
            &moon(0.0, MoonPhase::NewMoon),
            &weather(5.0),
            23,
            &[],
        );
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_alert_conditions_all_firing() {
        let settings = AlertSettings::default();
        let peak = Utc.with_ymd_and_hms(2025, 8, 12, 6, 0, 0).unwrap();
        let active = vec![
            shower("Lyrids", 18.0, peak),
            shower("Perseids", 100.0, peak),
        ];
        let alerts = check_alert_conditions(
            &settings,
            &moon(0.0, MoonPhase::NewMoon),
            &weather(5.0),
            23,
            &active,
        );
        // High-priority alerts first, prime_time (medium) last.
        let kinds: Vec<&str> = alerts.iter().map(|a| a.kind.as_str()).collect();
        assert_eq!(kinds, vec!["new_moon", "clear_sky", "active_shower", "prime_time"]);
        // The strongest active shower is the one named.
        assert!(alerts[2].message.contains("Perseids"));
        assert_eq!(alerts[3].priority, AlertPriority::Medium);
    }

    #[test]
    fn test_alert_history_caps_at_limit() {
        let dir = TempDir::new().unwrap();
        let mut store = Store::open_at(dir.path().join("store.json"));
        let mut history = AlertHistory::load(&store);
        let base = Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap();

        for i in 0..25 {
            history.record(
                &mut store,
                Alert {
                    kind: "clear_sky".into(),
                    message: format!("alert {}", i),
                    priority: AlertPriority::High,
                },
                base + Duration::minutes(i),
            );
        }
        assert_eq!(history.len(), ALERT_HISTORY_LIMIT);
        // Newest first.
        assert_eq!(history.messages()[0], "alert 24");

        // Survives a reload.
        let reloaded = AlertHistory::load(&store);
        assert_eq!(reloaded.len(), ALERT_HISTORY_LIMIT);
    }

    fn clear_far_weather() -> WeatherState {
        WeatherState {
            cloud_cover_percent: 10.0,
            visibility_km: 20.0,
            condition: "Clear".into(),
            temperature_c: 15.0,
        }
    }

    #[test]
    fn test_notification_conditions_all_firing() {
        let settings = NotificationSettings::default();
        let peak = Utc.with_ymd_and_hms(2025, 12, 14, 6, 0, 0).unwrap();
        // Geminids-class ZHR under a new moon pushes intensity past 80.
        let active = vec![shower("Geminids", 120.0, peak)];
        let notifications = check_notification_conditions(
            &settings,
            &moon(0.0, MoonPhase::NewMoon),
            &clear_far_weather(),
            23,
            &active,
        );
        let titles: Vec<&str> = notifications.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Perfect Viewing Conditions", "Peak Viewing Hours", "High Meteor Activity"]
        );
        assert!(notifications[2].body.contains("Geminids"));
    }

    #[test]
    fn test_notification_weather_rule_needs_both_conditions() {
        let settings = NotificationSettings::default();
        // Clear but hazy: visibility at 10 km misses the >15 km bar.
        let hazy = WeatherState {
            visibility_km: 10.0,
            ..clear_far_weather()
        };
        let notifications = check_notification_conditions(
            &settings,
            &moon(50.0, MoonPhase::FirstQuarter),
            &hazy,
            12,
            &[],
        );
        assert!(notifications.is_empty());
    }

    #[test]
    fn test_notification_intensity_threshold() {
        let settings = NotificationSettings::default();
        let peak = Utc.with_ymd_and_hms(2025, 4, 22, 6, 0, 0).unwrap();
        // Weak shower under a bright moon stays under the intensity bar.
        let active = vec![shower("Lyrids", 18.0, peak)];
        let overcast = WeatherState {
            cloud_cover_percent: 85.0,
            visibility_km: 4.0,
            condition: "Overcast".into(),
            temperature_c: 15.0,
        };
        let notifications = check_notification_conditions(
            &settings,
            &moon(95.0, MoonPhase::FullMoon),
            &overcast,
            12,
            &active,
        );
        assert!(notifications.iter().all(|n| n.title != "High Meteor Activity"));
    }

    #[test]
    fn test_notification_toggles_gate_individually() {
        let settings = NotificationSettings {
            weather_alerts: false,
            peak_alerts: true,
            intensity_alerts: false,
        };
        let notifications = check_notification_conditions(
            &settings,
            &moon(0.0, MoonPhase::NewMoon),
            &clear_far_weather(),
            23,
            &[],
        );
        let titles: Vec<&str> = notifications.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["Peak Viewing Hours"]);
    }

    #[test]
    fn test_notification_settings_blob_is_separate() {
        let dir = TempDir::new().unwrap();
        let mut store = Store::open_at(dir.path().join("store.json"));
        let notif = NotificationSettings {
            intensity_alerts: false,
            ..Default::default()
        };
        notif.save(&mut store);

        // The alert blob is untouched and loads its own defaults.
        let alerts = AlertSettings::load(&store);
        assert!(alerts.enabled && alerts.shower_alerts);
        let loaded = NotificationSettings::load(&store);
        assert!(!loaded.intensity_alerts);
        assert!(loaded.weather_alerts);
    }

    #[test]
    fn test_noop_sink_degrades_silently() {
        let sink: Box<dyn NotificationSink> = Box::new(NoopSink);
        sink.notify("title", "body");
    }

    #[test]
    fn test_settings_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut store = Store::open_at(dir.path().join("store.json"));
        let settings = AlertSettings {
            shower_alerts: false,
            ..Default::default()
        };
        settings.save(&mut store);
        let loaded = AlertSettings::load(&store);
        assert!(!loaded.shower_alerts);
        assert!(loaded.enabled);
    }
}
