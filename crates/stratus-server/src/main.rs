//! Stratus process entry point.
//!
//! Owns every long-lived component and wires them together: the event bus,
//! provider adapters, catalog, classifier, migration engine, and the HTTP
//! listener. Background loops (heartbeat, periodic catalog refresh) are
//! spawned here.

use std::time::Duration;
use stratus_server::{build_router, refresh_catalog, AppConfig, AppState};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load()?;
    config
        .validate()
        .map_err(|msg| anyhow::anyhow!("invalid configuration: {}", msg))?;

    let state = AppState::from_config(config).await?;

    // Resume interrupted jobs, then open the worker pool.
    state.engine.recover().await?;
    state.engine.start();

    stratus_events::spawn_heartbeat(state.bus.clone());
    spawn_refresh_loop(state.clone());

    let addr = format!(
        "{}:{}",
        state.config.server.host, state.config.server.port
    );
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("stratus control API listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically rebuild the catalog and recommendations.
fn spawn_refresh_loop(state: AppState) {
    let period = Duration::from_secs(state.config.catalog.refresh_interval_seconds.max(30));
    tokio::spawn(async move {
        if state.registry.configured().is_empty() {
            warn!("no providers configured; catalog refresh loop idle");
            return;
        }
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = refresh_catalog(&state).await {
                error!("periodic catalog refresh failed: {}", err);
            }
        }
    });
}
