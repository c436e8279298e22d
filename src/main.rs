//! Status Dashboard Pipeline, binary entrypoint.
//! Boots the refresh loop and the Axum surface the rendering layer reads.

use std::sync::Arc;
use std::time::Duration;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newswatch_dashboard::api::{create_router, AppState};
use newswatch_dashboard::ingest::config::{DashboardConfig, Environment};
use newswatch_dashboard::ingest::DataSourceResolver;
use newswatch_dashboard::metrics::Metrics;
use newswatch_dashboard::pipeline::{spawn_refresh_loop, Pipeline};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - DASHBOARD_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("DASHBOARD_DEV_LOG")
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
        .unwrap_or_else(|_| EnvFilter::new("newswatch_dashboard=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments. This enables
    // PRIMARY_BASE_URL / ARCHIVE_BASE_URL / REFRESH_INTERVAL_SECS overrides.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    enable_dev_tracing();

    let config = DashboardConfig::load().expect("Failed to load dashboard config");
    let telemetry = Metrics::init(config.refresh_interval_secs);

    let environment = Environment::detect();
    let resolver = DataSourceResolver::from_config(&config, environment);
    let pipeline = Arc::new(Pipeline::new(resolver, config.clone()));

    // Fixed-cadence refresh; the task lives as long as the service.
    let _refresh = spawn_refresh_loop(
        pipeline.clone(),
        Duration::from_secs(config.refresh_interval_secs),
    );

    let router = create_router(AppState { pipeline }).merge(telemetry.router());

    Ok(router.into())
}
