//! Performance governor daemon
//!
//! Runs the adaptive performance governor against the host's real memory
//! counters, exposes health, metrics and a control API, and optionally
//! simulates display refresh ticks.

use anyhow::Result;
use governor_lib::{
    health::HealthRegistry,
    metrics::SystemMemoryProbe,
    observability::{GovernorMetrics, StructuredLogger},
    subsystems::{Subsystems, TieredDataCache},
    Governor,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;
mod host;

const GOVERNOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting perf-governor");

    let config = config::DaemonConfig::load()?;
    info!(
        device_name = %config.device_name,
        api_port = config.api_port,
        target_frame_rate = config.governor.target_frame_rate,
        "Governor configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register_all().await;

    let metrics = GovernorMetrics::new();
    let logger = StructuredLogger::new(&config.device_name);
    logger.log_startup(GOVERNOR_VERSION, config.governor.target_frame_rate);

    let governor = Governor::new(
        config.governor.clone(),
        Subsystems::logging(TieredDataCache::new()),
        Box::new(SystemMemoryProbe::new()),
        logger.clone(),
        Instant::now(),
    )?;
    let runtime = governor.start_monitoring();
    let handle = runtime.handle();
    let _health_bridge = host::bridge_health(&handle, health_registry.clone());

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    if config.simulate_display {
        tokio::spawn(host::drive_display(
            handle.clone(),
            config.governor.target_frame_rate,
            shutdown_tx.subscribe(),
        ));
    }

    let app_state = Arc::new(api::AppState::new(
        health_registry.clone(),
        metrics,
        handle,
    ));

    health_registry.set_ready(true).await;

    let api_port = config.api_port;
    let api_handle = tokio::spawn(async move {
        if let Err(e) = api::serve(api_port, app_state).await {
            error!(error = %e, "API server failed");
        }
    });

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");

    health_registry.set_ready(false).await;
    let _ = shutdown_tx.send(());
    api_handle.abort();
    runtime.stop_monitoring().await;

    info!("Shutdown complete");
    Ok(())
}
