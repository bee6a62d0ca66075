use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::metrics::LatencyMonitor;
use crate::models::PingResponse;

use super::responses::StatsResponse;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Wall-clock time the server came up, for uptime reporting
    pub started_at: DateTime<Utc>,

    /// Aggregate the in-process prober writes into
    pub monitor: Arc<LatencyMonitor>,
}

impl AppState {
    pub fn new(monitor: Arc<LatencyMonitor>) -> Self {
        Self {
            started_at: Utc::now(),
            monitor,
        }
    }
}

/// Ping endpoint backing the latency probes
#[utoipa::path(
    get,
    path = "/api/ping",
    tag = "Ping",
    responses(
        (status = 200, description = "Server time and uptime", body = PingResponse)
    )
)]
pub async fn ping(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "no-cache")],
        Json(PingResponse::now(state.started_at)),
    )
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy")
    )
)]
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

/// Prober statistics snapshot
#[utoipa::path(
    get,
    path = "/api/v1/stats",
    tag = "Stats",
    responses(
        (status = 200, description = "Rolling average and session counters", body = StatsResponse)
    )
)]
pub async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatsResponse::new(
        state.monitor.snapshot(),
        state.started_at,
    ))
}
