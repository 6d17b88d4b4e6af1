//! Application router configuration.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::types::{ServerState, MAX_REQUEST_BODY_SIZE};

/// Create the application router with a specific state.
pub fn create_router_with_state(state: ServerState) -> Router {
    use crate::handlers::{basic, cwmp};

    Router::new()
        // Health check endpoints
        .route("/api/health", get(basic::health_handler))
        .route("/api/health/status", get(basic::health_status_handler))
        .route("/api/health/live", get(basic::liveness_handler))
        .route("/api/health/ready", get(basic::readiness_handler))
        // CWMP device RPCs
        .route(
            "/api/device/cwmp/:sn/getParameterNames",
            post(cwmp::get_parameter_names_handler),
        )
        .route(
            "/api/device/cwmp/:sn/getParameterAttributes",
            post(cwmp::get_parameter_attributes_handler),
        )
        .route(
            "/api/device/cwmp/:sn/getParameterValues",
            post(cwmp::get_parameter_values_handler),
        )
        .route(
            "/api/device/cwmp/:sn/setParameterValues",
            post(cwmp::set_parameter_values_handler),
        )
        .route(
            "/api/device/cwmp/:sn/addObject",
            post(cwmp::add_object_handler),
        )
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
