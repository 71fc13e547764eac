//! Weather snapshot for scoring: live provider with a synthesized fallback.
//!
//! The live path queries OpenWeather's current-conditions endpoint. Any
//! failure (network, bad key, malformed payload) degrades to a locally
//! synthesized mock so scoring always has a fully populated WeatherState.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Observed or synthesized sky conditions. All four fields are always
/// present together; there is no partially populated state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherState {
    pub cloud_cover_percent: f64,
    pub visibility_km: f64,
    pub condition: String,
    pub temperature_c: f64,
}

#[derive(Debug)]
pub enum WeatherError {
    Network(String),
    InvalidResponse(String),
}

impl fmt::Display for WeatherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Weather network error: {}", msg),
            Self::InvalidResponse(msg) => write!(f, "Invalid weather response: {}", msg),
        }
    }
}

impl std::error::Error for WeatherError {}

// OpenWeather current-conditions payload, reduced to the fields we read.
#[derive(Deserialize)]
struct OwmResponse {
    clouds: OwmClouds,
    #[serde(default)]
    visibility: Option<f64>,
    weather: Vec<OwmCondition>,
    main: OwmMain,
}

#[derive(Deserialize)]
struct OwmClouds {
    all: f64,
}

#[derive(Deserialize)]
struct OwmCondition {
    main: String,
}

#[derive(Deserialize)]
struct OwmMain {
    temp: f64,
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Fetch current conditions from OpenWeather for a coordinate pair.
///
/// The API key comes from `AUREO_OWM_KEY`; without one the request fails
/// and callers fall back to [`mock_weather`].
pub fn fetch_weather(lat: f64, lon: f64) -> Result<WeatherState, WeatherError> {
    let key = std::env::var("AUREO_OWM_KEY").unwrap_or_else(|_| "demo".into());
    let url = format!(
        "https://api.openweathermap.org/data/2.5/weather?lat={}&lon={}&appid={}&units=metric",
        lat, lon, key
    );

    let response = ureq::get(&url)
        .set("User-Agent", "AureoMeteor/0.3 (viewing-conditions-engine)")
        .timeout(REQUEST_TIMEOUT)
        .call()
        .map_err(|e| WeatherError::Network(e.to_string()))?;

    let r: OwmResponse = response
        .into_json()
        .map_err(|e| WeatherError::InvalidResponse(e.to_string()))?;

    let condition = r
        .weather
        .first()
        .map(|c| c.main.clone())
        .ok_or_else(|| WeatherError::InvalidResponse("no weather condition".into()))?;

    Ok(WeatherState {
        cloud_cover_percent: r.clouds.all.clamp(0.0, 100.0),
        // OpenWeather reports visibility in meters, capped at 10 km.
        visibility_km: r.visibility.unwrap_or(10_000.0).max(0.0) / 1000.0,
        condition,
        temperature_c: r.main.temp,
    })
}

const MOCK_CONDITIONS: [&str; 4] = ["Clear", "Partly Cloudy", "Cloudy", "Overcast"];

/// Synthesize a plausible weather state from a seed.
///
/// Callers seed from the clock for variety; tests pass fixed seeds. Ranges
/// match the live provider's plausible envelope: cloud 0-99%, visibility
/// 5-24 km, temperature 10-39 °C.
pub fn mock_weather(seed: u64) -> WeatherState {
    let mut s = seed;
    let mut next = move || {
        // splitmix64 step
        s = s.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = s;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    };

    let cloud = (next() % 100) as f64;
    let visibility = 5.0 + (next() % 20) as f64;
    let condition = MOCK_CONDITIONS[(next() % 4) as usize].to_string();
    let temperature = 10.0 + (next() % 30) as f64;

    WeatherState {
        cloud_cover_percent: cloud,
        visibility_km: visibility,
        condition,
        temperature_c: temperature,
    }
}

/// Live weather when online, mock otherwise. Never fails.
pub fn current_weather(lat: f64, lon: f64, offline: bool, seed: u64) -> WeatherState {
    if !offline {
        match fetch_weather(lat, lon) {
            Ok(w) => return w,
            Err(e) => eprintln!("  Weather provider unavailable ({}), using synthesized data", e),
        }
    }
    mock_weather(seed)
}
