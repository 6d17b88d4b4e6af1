//! Unified error handling for the API.

use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cwmp_devices::{BridgeError, TransportError};
use serde::Serialize;
use std::fmt;

/// Unified API error response with proper HTTP status codes.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// HTTP status code.
    #[serde(skip)]
    pub status: StatusCode,
    /// Structured context, e.g. every failed decode attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Optional request ID for tracing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(code: impl Into<String>, message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status,
            details: None,
            request_id: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Set the request ID.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Unreadable or oversized request body (400).
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new("INVALID_INPUT", message, StatusCode::BAD_REQUEST)
    }

    /// Internal server error (500).
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Service unavailable (503).
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(
            "TRANSPORT_UNAVAILABLE",
            message,
            StatusCode::SERVICE_UNAVAILABLE,
        )
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = self.status;
        let mut error = serde_json::json!({
            "code": self.code,
            "message": self.message,
        });
        if let Some(details) = self.details {
            error["details"] = details;
        }
        if let Some(request_id) = self.request_id {
            error["request_id"] = serde_json::Value::String(request_id);
        }
        let body = serde_json::json!({
            "success": false,
            "error": error,
        });
        (status, axum::Json(body)).into_response()
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorResponse {}

impl From<BytesRejection> for ErrorResponse {
    fn from(rejection: BytesRejection) -> Self {
        let mut err =
            Self::invalid_input(format!("Failed to read request body: {}", rejection.body_text()));
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            err.status = StatusCode::PAYLOAD_TOO_LARGE;
        }
        err
    }
}

impl From<TransportError> for ErrorResponse {
    fn from(e: TransportError) -> Self {
        let message = e.to_string();
        match e {
            TransportError::Timeout(_) => {
                Self::new("DEVICE_TIMEOUT", message, StatusCode::GATEWAY_TIMEOUT)
            }
            TransportError::Adapter { code, .. } => {
                let status = StatusCode::from_u16(code)
                    .ok()
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                Self::new("ADAPTER_ERROR", message, status)
            }
            TransportError::NotConnected
            | TransportError::Connection(_)
            | TransportError::Closed => Self::service_unavailable(message),
            TransportError::Publish(_) => {
                Self::new("TRANSPORT_ERROR", message, StatusCode::BAD_GATEWAY)
            }
            TransportError::Configuration(_) => Self::internal(message),
        }
    }
}

impl From<BridgeError> for ErrorResponse {
    fn from(e: BridgeError) -> Self {
        match e {
            BridgeError::InvalidDeviceId(reason) => Self::new(
                "INVALID_DEVICE_ID",
                format!("Invalid device id: {}", reason),
                StatusCode::BAD_REQUEST,
            ),
            BridgeError::Transport(transport) => transport.into(),
            BridgeError::Decode { raw, source } => Self::new(
                "MALFORMED_RESPONSE",
                source.to_string(),
                StatusCode::BAD_GATEWAY,
            )
            .with_details(serde_json::json!({
                "method": source.method(),
                "reply_bytes": raw.len(),
                "attempts": source.attempts(),
            })),
        }
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ErrorResponse>;
