use crate::{errors::ServiceError, AppState};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Instant;
use utoipa::ToSchema;

/// Component health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Up,
    Down,
}

/// Individual component health details
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Full health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub version: String,
    pub timestamp: String,
    pub uptime_secs: u64,
    pub database: ComponentHealth,
    pub cart_lines: usize,
    pub response_time_ms: u64,
}

/// Tracks application start time for uptime calculation
static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize the start time (call this on application startup)
pub fn init_start_time() {
    let _ = START_TIME.get_or_init(Instant::now);
}

fn get_uptime_secs() -> u64 {
    START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0)
}

async fn database_health(state: &AppState) -> ComponentHealth {
    let started = Instant::now();
    let result = crate::db::check_connection(&state.db).await;
    let latency_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(()) => ComponentHealth {
            status: ComponentStatus::Up,
            message: "Connection successful".to_string(),
            latency_ms: Some(latency_ms),
        },
        Err(e) => ComponentHealth {
            status: ComponentStatus::Down,
            message: format!("Connection failed: {}", e),
            latency_ms: Some(latency_ms),
        },
    }
}

/// Liveness probe: the process is serving requests
#[utoipa::path(
    get,
    path = "/health/live",
    responses((status = 200, description = "Service is running")),
    tag = "Health"
)]
pub async fn liveness_check() -> impl IntoResponse {
    Json(json!({
        "status": "up",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Readiness probe: the database answers
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Ready for traffic"),
        (status = 503, description = "Database unavailable")
    ),
    tag = "Health"
)]
pub async fn readiness_check(State(state): State<AppState>) -> Response {
    let database = database_health(&state).await;
    let (code, status) = match database.status {
        ComponentStatus::Up => (StatusCode::OK, "ready"),
        ComponentStatus::Down => (StatusCode::SERVICE_UNAVAILABLE, "not_ready"),
    };
    (
        code,
        Json(json!({
            "status": status,
            "checks": { "database": database }
        })),
    )
        .into_response()
}

/// Health of every component
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "All components up", body = HealthResponse),
        (status = 503, description = "A component is down", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let start = Instant::now();
    let database = database_health(&state).await;
    let cart_lines = state.cart.lock().await.state().items.len();

    let status = database.status;
    let code = match status {
        ComponentStatus::Up => StatusCode::OK,
        ComponentStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
    };

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime_secs: get_uptime_secs(),
        database,
        cart_lines,
        response_time_ms: start.elapsed().as_millis() as u64,
    };
    Ok((code, Json(response)).into_response())
}

/// Creates the router for health check endpoints
///
/// - GET /health       - component status
/// - GET /health/live  - liveness probe
/// - GET /health/ready - readiness probe (database ping)
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/live", get(liveness_check))
        .route("/ready", get(readiness_check))
}
