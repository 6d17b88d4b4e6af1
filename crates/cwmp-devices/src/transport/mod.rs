//! Request/reply transport between the bridge and the CWMP adapters.
//!
//! The bridge only needs one capability: publish a payload to a topic and
//! wait for the single reply. Implementations own timeouts and
//! cancellation; callers never retry.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use thiserror::Error;

#[cfg(feature = "mqtt")]
pub mod mqtt;

#[cfg(feature = "testing")]
pub mod mock;

#[cfg(feature = "mqtt")]
pub use mqtt::MqttTransport;

#[cfg(feature = "testing")]
pub use mock::{MockTransport, RecordedRequest};

/// Transport failures. The bridge propagates these unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Operation timeout after {0}ms")]
    Timeout(u64),

    /// The adapter answered with an error envelope instead of a reply.
    #[error("Adapter error {code}: {message}")]
    Adapter { code: u16, message: String },

    #[error("Transport not connected")]
    NotConnected,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Publish error: {0}")]
    Publish(String),

    /// The transport was shut down while the request was in flight.
    #[error("Transport closed")]
    Closed,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl TransportError {
    /// Whether the failure says nothing about the device itself.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::NotConnected | Self::Connection(_) | Self::Closed
        )
    }
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// One request/reply exchange over a message broker.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Publish `payload` to `topic` and wait for the reply.
    async fn request(&self, topic: &str, payload: Bytes) -> TransportResult<Bytes>;

    /// Whether requests can currently be issued.
    fn is_connected(&self) -> bool {
        true
    }

    fn name(&self) -> &str;
}

#[derive(Deserialize)]
struct AdapterErrorEnvelope {
    code: u16,
    #[serde(default)]
    msg: String,
}

/// Detect the adapter's error envelope `{"code": <non-2xx>, "msg": "..."}`.
///
/// Anything else, including JSON that happens to carry a 2xx `code`, is a
/// regular reply.
pub fn adapter_error(payload: &[u8]) -> Option<TransportError> {
    let trimmed = payload.trim_ascii_start();
    if !trimmed.starts_with(b"{") {
        return None;
    }
    let envelope: AdapterErrorEnvelope = serde_json::from_slice(trimmed).ok()?;
    if (200..300).contains(&envelope.code) {
        return None;
    }
    Some(TransportError::Adapter {
        code: envelope.code,
        message: envelope.msg,
    })
}
