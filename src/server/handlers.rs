use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::astro::{self, MoonState};
use crate::recommend;
use crate::score::{self, VisibilityScore};
use crate::showers::{next_peak, ShowerFeed, ShowerRecord};
use crate::weather::{self, WeatherState};

use super::state::AppState;

/// Default observer coordinates (New York City) when none are supplied.
pub const DEFAULT_LAT: f64 = 40.7128;
pub const DEFAULT_LON: f64 = -74.0060;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub(super) struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

// ─── Shared query handling ───────────────────────────────────────

#[derive(Deserialize)]
pub struct ConditionsQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub tz: Option<String>,
    pub seed: Option<u64>,
    pub offline: Option<bool>,
}

struct Observation {
    lat: f64,
    lon: f64,
    now: DateTime<Utc>,
    /// Observer-local hour, used by the time-of-day gates.
    hour: u32,
    moon: MoonState,
    weather: WeatherState,
    visibility: VisibilityScore,
    alert: VisibilityScore,
}

fn observe(params: &ConditionsQuery) -> Result<Observation, ApiError> {
    let lat = params.lat.unwrap_or(DEFAULT_LAT);
    let lon = params.lon.unwrap_or(DEFAULT_LON);
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Invalid coordinates. Lat: -90..90, Lon: -180..180",
        ));
    }

    let now = Utc::now();
    let hour = match &params.tz {
        Some(tz_str) => {
            let tz: chrono_tz::Tz = tz_str.parse().map_err(|_| {
                api_error(StatusCode::BAD_REQUEST, format!("Unknown timezone '{}'", tz_str))
            })?;
            now.with_timezone(&tz).hour()
        }
        None => now.hour(),
    };

    let moon = astro::moon_state(now);
    let seed = params
        .seed
        .unwrap_or_else(|| now.timestamp_millis() as u64);
    let weather = weather::current_weather(lat, lon, params.offline.unwrap_or(false), seed);
    let visibility = score::visibility_score(&moon, &weather, hour);
    let alert = score::alert_score(&moon, &weather, hour);

    Ok(Observation {
        lat,
        lon,
        now,
        hour,
        moon,
        weather,
        visibility,
        alert,
    })
}

// ─── GET /api/conditions ─────────────────────────────────────────

#[derive(Serialize)]
pub struct ConditionsResponse {
    pub lat: f64,
    pub lon: f64,
    pub time: DateTime<Utc>,
    pub moon_phase: String,
    pub moon_illumination: f64,
    pub moon_age_days: f64,
    pub moon_impact: String,
    pub weather: WeatherState,
    pub visibility: VisibilityScore,
    pub alert_visibility: VisibilityScore,
    pub window: astro::ViewingWindow,
    pub viewing_status: String,
}

pub async fn conditions(
    Query(params): Query<ConditionsQuery>,
) -> Result<Json<ConditionsResponse>, ApiError> {
    let start = Instant::now();
    let obs = observe(&params)?;

    let window = astro::viewing_window(obs.now.date_naive());
    let status = astro::viewing_status(obs.now.naive_utc(), &window);
    let impact = astro::moon_impact(obs.moon.illumination_percent);

    let elapsed = start.elapsed();
    eprintln!(
        "[{}] GET /api/conditions lat={:.2} lon={:.2} -> {} ({:.1}ms)",
        Utc::now().format("%H:%M:%S"),
        obs.lat,
        obs.lon,
        obs.visibility.tier,
        elapsed.as_secs_f64() * 1000.0,
    );

    Ok(Json(ConditionsResponse {
        lat: obs.lat,
        lon: obs.lon,
        time: obs.now,
        moon_phase: obs.moon.phase.to_string(),
        moon_illumination: obs.moon.illumination_percent,
        moon_age_days: obs.moon.age_days,
        moon_impact: impact.description.to_string(),
        weather: obs.weather,
        visibility: obs.visibility,
        alert_visibility: obs.alert,
        window,
        viewing_status: status.to_string(),
    }))
}

// ─── GET /api/showers ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ShowersQuery {
    pub view: Option<String>,
    pub refresh: Option<bool>,
}

#[derive(Serialize)]
pub struct ShowersResponse {
    pub showers: Vec<ShowerRecord>,
    pub source: String,
    pub fetched_at: DateTime<Utc>,
}

pub async fn showers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ShowersQuery>,
) -> Result<Json<ShowersResponse>, ApiError> {
    let start = Instant::now();
    let now = Utc::now();
    let view = params.view.as_deref().unwrap_or("upcoming");

    let feed: ShowerFeed = {
        let mut resolver = state.resolver.lock().unwrap();
        match view {
            "upcoming" if params.refresh.unwrap_or(false) => resolver.refresh(now),
            "upcoming" => resolver.resolve(now),
            "active" => resolver.active(now),
            "popular" => crate::showers::popular_feed(now),
            other => {
                return Err(api_error(
                    StatusCode::BAD_REQUEST,
                    format!("Unknown view '{}'. Use 'upcoming', 'active' or 'popular'.", other),
                ))
            }
        }
    };

    let elapsed = start.elapsed();
    eprintln!(
        "[{}] GET /api/showers view={} -> {} records from {} ({:.1}ms)",
        Utc::now().format("%H:%M:%S"),
        view,
        feed.records.len(),
        if feed.source.is_empty() { "static set" } else { feed.source.as_str() },
        elapsed.as_secs_f64() * 1000.0,
    );

    Ok(Json(ShowersResponse {
        showers: feed.records,
        source: feed.source,
        fetched_at: feed.fetched_at,
    }))
}

// ─── GET /api/recommendations ────────────────────────────────────

#[derive(Serialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<recommend::Recommendation>,
    pub visibility: VisibilityScore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_shower: Option<ShowerRecord>,
}

pub async fn recommendations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ConditionsQuery>,
) -> Result<Json<RecommendationsResponse>, ApiError> {
    let start = Instant::now();
    let obs = observe(&params)?;

    let feed = {
        let mut resolver = state.resolver.lock().unwrap();
        resolver.resolve(obs.now)
    };
    let nearest = next_peak(&feed.records, obs.now).cloned();

    let recs = recommend::recommendations(
        &obs.moon,
        &obs.weather,
        obs.hour,
        &obs.visibility,
        nearest.as_ref(),
        obs.now,
    );

    let elapsed = start.elapsed();
    eprintln!(
        "[{}] GET /api/recommendations lat={:.2} lon={:.2} -> {} entries ({:.1}ms)",
        Utc::now().format("%H:%M:%S"),
        obs.lat,
        obs.lon,
        recs.len(),
        elapsed.as_secs_f64() * 1000.0,
    );

    Ok(Json(RecommendationsResponse {
        recommendations: recs,
        visibility: obs.visibility,
        next_shower: nearest,
    }))
}
