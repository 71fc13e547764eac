use aureo_meteor::astro;
use aureo_meteor::recommend::{
    self, AlertHistory, AlertSettings, NotificationSettings, NotificationSink,
};
use aureo_meteor::score;
use aureo_meteor::showers::{next_peak, ShowerFeed, ShowerResolver, WindowPolicy};
use aureo_meteor::store::Store;
use aureo_meteor::weather;
use aureo_meteor::{server, showers};
use chrono::{DateTime, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use clap::Parser;
use serde::Serialize;

/// Aureo Meteor v0.3 — Meteor Shower Viewing Companion
///
/// Scores tonight's viewing conditions from moon phase and weather, and
/// tracks upcoming meteor showers through a tiered data pipeline.
///
/// Examples:
///   aureo
///   aureo --lat 59.33 --lon 18.07 --tz Europe/Stockholm
///   aureo --popular
///   aureo --refresh --offline
///   aureo --serve --port 8080
#[derive(Parser)]
#[command(name = "aureo", version, about, long_about = None)]
struct Cli {
    /// Latitude (-90 to 90). Defaults to New York.
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude (-180 to 180). Defaults to New York.
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Date (YYYY-MM-DD) for the viewing window. Defaults to today.
    #[arg(long, short = 'd')]
    date: Option<String>,

    /// IANA timezone for the local-hour gates (e.g. Europe/Oslo).
    #[arg(long)]
    tz: Option<String>,

    /// Offline mode: skip network providers, use curated and mock data.
    #[arg(long)]
    offline: bool,

    /// Show the popular-shower calendar instead of live upcoming data.
    #[arg(long)]
    popular: bool,

    /// Force a data refresh, bypassing the freshness cache.
    #[arg(long)]
    refresh: bool,

    /// Seed for synthesized weather (testing/reproducibility).
    #[arg(long)]
    seed: Option<u64>,

    /// Run the JSON API server instead of a one-shot report.
    #[arg(long)]
    serve: bool,

    /// Server bind host.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server bind port.
    #[arg(long, default_value_t = 3000)]
    port: u16,
}

/// Terminal alert delivery; the library default is a silent no-op.
struct StderrSink;

impl NotificationSink for StderrSink {
    fn notify(&self, title: &str, body: &str) {
        eprintln!("  🔔 {}: {}", title, body);
    }
}

#[derive(Serialize)]
struct Report {
    lat: f64,
    lon: f64,
    time: DateTime<Utc>,
    moon_phase: String,
    moon_illumination: f64,
    moon_age_days: f64,
    moon_magnitude: f64,
    moon_brightness: &'static str,
    moon_impact: &'static str,
    weather: weather::WeatherState,
    visibility: score::VisibilityScore,
    alert_visibility: score::VisibilityScore,
    window: astro::ViewingWindow,
    viewing_status: &'static str,
    showers: Vec<showers::ShowerRecord>,
    source: String,
    recommendations: Vec<recommend::Recommendation>,
    alerts: Vec<recommend::Alert>,
    notifications: Vec<recommend::Notification>,
}

fn main() {
    let cli = Cli::parse();

    if cli.serve {
        let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("Error: Cannot start async runtime: {}", e);
            std::process::exit(1);
        });
        runtime.block_on(server::start(&cli.host, cli.port, cli.offline));
        return;
    }

    // ── Observer position ───────────────────────────────────────

    let (lat, lon) = match (cli.lat, cli.lon) {
        (Some(lat), Some(lon)) => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                eprintln!("Error: Invalid coordinates. Lat: -90..90, Lon: -180..180");
                std::process::exit(1);
            }
            (lat, lon)
        }
        (None, None) => {
            eprintln!("  Using default location: New York (40.71, -74.01)");
            (40.7128, -74.0060)
        }
        _ => {
            eprintln!("Error: Provide both --lat and --lon, or neither.");
            std::process::exit(1);
        }
    };

    // ── Observation instant ─────────────────────────────────────

    let now = match &cli.date {
        Some(d) => {
            let date = NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap_or_else(|e| {
                eprintln!("Error: Invalid date '{}': {}", d, e);
                std::process::exit(1);
            });
            // Evaluate the requested night at 23:00 UTC.
            Utc.from_utc_datetime(&date.and_hms_opt(23, 0, 0).unwrap())
        }
        None => Utc::now(),
    };

    let hour = match &cli.tz {
        Some(tz_str) => {
            let tz: Tz = tz_str.parse().unwrap_or_else(|_| {
                eprintln!(
                    "Error: Unknown timezone '{}'. Use IANA format (e.g. Europe/Oslo).",
                    tz_str
                );
                std::process::exit(1);
            });
            now.with_timezone(&tz).hour()
        }
        None => now.hour(),
    };

    // ── Conditions ──────────────────────────────────────────────

    let moon = astro::moon_state(now);
    let seed = cli.seed.unwrap_or_else(|| now.timestamp_millis() as u64);
    let sky = weather::current_weather(lat, lon, cli.offline, seed);
    let visibility = score::visibility_score(&moon, &sky, hour);
    let alert_visibility = score::alert_score(&moon, &sky, hour);
    let window = astro::viewing_window(now.date_naive());
    let status = astro::viewing_status(now.naive_utc(), &window);

    // ── Shower data ─────────────────────────────────────────────

    let mut resolver = ShowerResolver::new();
    resolver.set_offline(cli.offline);

    let feed: ShowerFeed = if cli.popular {
        showers::popular_feed(now)
    } else if cli.refresh {
        resolver.refresh(now)
    } else {
        resolver.resolve(now)
    };

    let nearest = next_peak(&feed.records, now).cloned();
    let recommendations =
        recommend::recommendations(&moon, &sky, hour, &visibility, nearest.as_ref(), now);

    let active = showers::normalize::select(feed.records.clone(), WindowPolicy::Active, now);
    let mut store = Store::open();
    let settings = AlertSettings::load(&store);
    let alerts = recommend::check_alert_conditions(&settings, &moon, &sky, hour, &active);
    let mut history = AlertHistory::load(&store);
    for alert in &alerts {
        history.record(&mut store, alert.clone(), now);
    }
    let notification_settings = NotificationSettings::load(&store);
    let notifications =
        recommend::check_notification_conditions(&notification_settings, &moon, &sky, hour, &active);

    // ── ASCII report to stderr ──────────────────────────────────

    eprintln!();
    eprintln!("  Aureo Meteor — {}", now.format("%Y-%m-%d %H:%M UTC"));
    eprintln!("  Observer: {:.4}, {:.4}", lat, lon);
    eprintln!();
    eprintln!(
        "  Moon:    {} ({:.0}% lit, {} sky, mag {:.1})",
        moon.phase,
        moon.illumination_percent,
        astro::brightness_description(moon.illumination_percent),
        astro::moon_magnitude(moon.illumination_percent),
    );
    eprintln!(
        "  Weather: {} ({:.0}% cloud, {:.0} km visibility, {:.0}°C)",
        sky.condition, sky.cloud_cover_percent, sky.visibility_km, sky.temperature_c,
    );
    eprintln!(
        "  Score:   {}/100 ({}) — {}",
        visibility.value, visibility.tier, status,
    );
    eprintln!();

    if feed.records.is_empty() {
        eprintln!("  No shower data available.");
    } else {
        let label = if cli.popular { "Popular showers" } else { "Upcoming showers" };
        let source = if feed.source.is_empty() { "static set".to_string() } else { feed.source.clone() };
        eprintln!("  {} (source: {}):", label, source);
        for shower in &feed.records {
            let activity = shower
                .zhr
                .rate()
                .map(score::zhr_activity_level)
                .unwrap_or("Unknown");
            eprintln!(
                "    {:<16} {}  ZHR {:>4}  {:<10} in {} day(s)",
                shower.name,
                shower.peak.format("%Y-%m-%d"),
                shower.zhr.to_string(),
                activity,
                shower.days_until_peak(now).max(0),
            );
        }
    }
    eprintln!();

    for rec in &recommendations {
        eprintln!("  {} {}", rec.icon, rec.text);
    }
    eprintln!();

    let sink = StderrSink;
    for alert in &alerts {
        sink.notify("Aureo Meteor", &alert.message);
    }
    for notification in &notifications {
        sink.notify(&notification.title, &notification.body);
    }
    if !alerts.is_empty() || !notifications.is_empty() {
        eprintln!();
    }

    // ── JSON to stdout ──────────────────────────────────────────

    let report = Report {
        lat,
        lon,
        time: now,
        moon_phase: moon.phase.to_string(),
        moon_illumination: moon.illumination_percent,
        moon_age_days: moon.age_days,
        moon_magnitude: astro::moon_magnitude(moon.illumination_percent),
        moon_brightness: astro::brightness_description(moon.illumination_percent),
        moon_impact: astro::moon_impact(moon.illumination_percent).description,
        weather: sky,
        visibility,
        alert_visibility,
        window,
        viewing_status: status,
        showers: feed.records,
        source: feed.source,
        recommendations,
        alerts,
        notifications,
    };
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: Cannot serialize report: {}", e);
            std::process::exit(1);
        }
    }
}
