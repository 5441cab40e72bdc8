//! HTTP API: health checks, Prometheus metrics and governor control

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use governor_lib::{
    health::{ComponentStatus, HealthRegistry},
    ActivityContext, GovernorError, GovernorHandle, GovernorMetrics, MemoryPressureLevel,
    PowerMode, ThermalState,
};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub metrics: GovernorMetrics,
    pub governor: GovernorHandle,
}

impl AppState {
    pub fn new(
        health_registry: HealthRegistry,
        metrics: GovernorMetrics,
        governor: GovernorHandle,
    ) -> Self {
        Self {
            health_registry,
            metrics,
            governor,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ContextRequest {
    pub context: String,
}

#[derive(Debug, Deserialize)]
pub struct PowerRequest {
    pub mode: String,
}

#[derive(Debug, Deserialize)]
pub struct BatteryRequest {
    /// Charge fraction in `[0, 1]`
    pub level: f32,
}

#[derive(Debug, Deserialize)]
pub struct ThermalRequest {
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct MemoryPressureRequest {
    pub level: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Map a governor error to a status code
fn governor_error(err: GovernorError) -> Response {
    let status = match err {
        GovernorError::NotRunning => StatusCode::SERVICE_UNAVAILABLE,
        GovernorError::UnknownValue { .. } | GovernorError::InvalidConfig(_) => {
            StatusCode::BAD_REQUEST
        }
    };
    if status.is_server_error() {
        warn!(error = %err, "Governor request failed");
    }
    error_response(status, err.to_string())
}

fn accepted(result: Result<(), GovernorError>) -> Response {
    match result {
        Ok(()) => (StatusCode::ACCEPTED, Json(json!({ "accepted": true }))).into_response(),
        Err(e) => governor_error(e),
    }
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        // Degraded device states are still operational
        ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    let encoder = TextEncoder::new();
    let metric_families = state.metrics.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

async fn report(State(state): State<Arc<AppState>>) -> Response {
    match state.governor.performance_report().await {
        Ok(report) => Json(report).into_response(),
        Err(e) => governor_error(e),
    }
}

async fn set_context(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ContextRequest>,
) -> Response {
    let context: ActivityContext = match req.context.parse() {
        Ok(context) => context,
        Err(e) => return governor_error(e),
    };
    info!(context = %context, "Activity context requested");
    accepted(state.governor.set_activity_context(context).await)
}

async fn set_power_mode(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PowerRequest>,
) -> Response {
    let mode: PowerMode = match req.mode.parse() {
        Ok(mode) => mode,
        Err(e) => return governor_error(e),
    };
    accepted(state.governor.power_mode_changed(mode).await)
}

async fn set_battery(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatteryRequest>,
) -> Response {
    if !(0.0..=1.0).contains(&req.level) {
        return error_response(StatusCode::BAD_REQUEST, "level must be within [0, 1]");
    }
    accepted(state.governor.battery_level_changed(req.level).await)
}

async fn thermal(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ThermalRequest>,
) -> Response {
    let thermal: ThermalState = match req.state.parse() {
        Ok(thermal) => thermal,
        Err(e) => return governor_error(e),
    };
    accepted(state.governor.thermal_state_changed(thermal))
}

async fn memory_pressure(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MemoryPressureRequest>,
) -> Response {
    let level: MemoryPressureLevel = match req.level.parse() {
        Ok(level) => level,
        Err(e) => return governor_error(e),
    };
    accepted(state.governor.memory_pressure(level))
}

async fn memory_warning(State(state): State<Arc<AppState>>) -> Response {
    accepted(state.governor.low_memory_warning())
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/report", get(report))
        .route("/context", put(set_context))
        .route("/power", put(set_power_mode))
        .route("/battery", put(set_battery))
        .route("/thermal", post(thermal))
        .route("/memory-pressure", post(memory_pressure))
        .route("/memory-warning", post(memory_warning))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
