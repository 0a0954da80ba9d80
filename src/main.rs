//! Commute Misery Scanner — Binary Entrypoint
//! Boots the Axum HTTP server, wiring routes, shared state, and middleware.

use std::sync::Arc;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commute_misery_scanner::api::{self, AppState};
use commute_misery_scanner::config::AppConfig;
use commute_misery_scanner::metrics::Metrics;
use commute_misery_scanner::weather::OpenWeatherClient;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - MISERY_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("MISERY_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("commute_misery_scanner=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments. This enables
    // OPENWEATHER_API_KEY / COMMUTE_* overrides from .env.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    enable_dev_tracing();

    let config = AppConfig::from_env().expect("Failed to load service config");
    let metrics = Metrics::init(config.upstream_timeout.as_millis() as u64);

    let weather = OpenWeatherClient::new(config.api_key.clone(), config.upstream_timeout)
        .expect("Failed to build weather client");

    let state = AppState::new(config, Arc::new(weather)).expect("Failed to build app state");
    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}
