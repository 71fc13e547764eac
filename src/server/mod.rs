mod handlers;
mod state;

use axum::routing::get;
use axum::Router;
use state::AppState;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

use crate::scheduler::RefreshScheduler;
use crate::showers::ShowerResolver;

fn router_for(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/conditions", get(handlers::conditions))
        .route("/api/showers", get(handlers::showers))
        .route("/api/recommendations", get(handlers::recommendations))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, offline: bool) {
    let mut resolver = ShowerResolver::new();
    resolver.set_offline(offline);
    let state = Arc::new(AppState {
        resolver: Mutex::new(resolver),
    });

    // Background freshness loop. The ticker wakes every minute; the
    // scheduler decides when a full check interval has elapsed, so a stale
    // cache is replaced without waiting for a request to hit it.
    let bg_state = Arc::clone(&state);
    tokio::spawn(async move {
        let mut scheduler = RefreshScheduler::new();
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            ticker.tick().await;
            let now = chrono::Utc::now();
            if !scheduler.due(now) {
                continue;
            }
            let feed = {
                let mut resolver = bg_state.resolver.lock().unwrap();
                resolver.resolve(now)
            };
            eprintln!(
                "[{}] freshness check -> {} records from {}",
                now.format("%H:%M:%S"),
                feed.records.len(),
                if feed.source.is_empty() { "static set" } else { feed.source.as_str() },
            );
        }
    });

    let app = router_for(state);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Error: Cannot bind to {}: {}", addr, e);
            std::process::exit(1);
        });

    eprintln!("  Aureo server listening on http://{}", addr);
    eprintln!("  Press Ctrl+C to stop.");

    axum::serve(listener, app).await.unwrap_or_else(|e| {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    });
}
