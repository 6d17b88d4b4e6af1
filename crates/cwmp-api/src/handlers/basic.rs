//! Basic handlers - health check and system status.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::json;

use super::ServerState;

const SERVICE_NAME: &str = "cwmp-bridge";

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: &'static str,
    pub uptime: u64,
}

/// Dependency health status.
#[derive(Debug, Clone, Serialize)]
pub struct DependencyStatus {
    /// Name of the active transport, e.g. `mqtt`.
    pub transport: String,
    pub transport_connected: bool,
}

/// Readiness check response.
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessStatus {
    pub ready: bool,
    pub dependencies: DependencyStatus,
}

/// Basic health check handler (public endpoint).
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Detailed health check with uptime.
pub async fn health_status_handler(State(state): State<ServerState>) -> Json<HealthStatus> {
    let uptime = chrono::Utc::now().timestamp() - state.started_at;

    Json(HealthStatus {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION"),
        uptime: uptime.max(0) as u64,
    })
}

/// Liveness probe - simple check if server is running.
pub async fn liveness_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "alive",
    }))
}

/// Readiness probe - ready only while the transport can reach the broker.
pub async fn readiness_handler(
    State(state): State<ServerState>,
) -> (StatusCode, Json<ReadinessStatus>) {
    let transport_connected = state.transport_ready();
    let status = if transport_connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessStatus {
            ready: transport_connected,
            dependencies: DependencyStatus {
                transport: state.bridge.transport().name().to_string(),
                transport_connected,
            },
        }),
    )
}
