//! CWMP device interaction crate.
//!
//! Sends CWMP requests to managed devices through a message broker and
//! decodes their replies into typed responses.
//!
//! ## Features
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `mqtt` | ✅ | MQTT v5 request/reply transport |
//! | `testing` | ❌ | In-memory `MockTransport` |
//!
//! ## Architecture
//!
//! - **TopicScheme**: maps a `DeviceSerial` to `<prefix><serial>.api`
//! - **Transport**: one request/reply exchange (`MqttTransport`)
//! - **ResponseDecoder**: XML first, JSON as fallback
//! - **InteractionBridge**: ties the three together per call

pub mod bridge;
pub mod cwmp;
pub mod decoder;
pub mod topic;
pub mod transport;

pub use bridge::{BridgeError, Interaction, InteractionBridge};
pub use cwmp::{
    AddObjectResponse, CwmpResponse, Envelope, GetParameterAttributesResponse,
    GetParameterNamesResponse, GetParameterValuesResponse, ResponseVariant, RpcMethod,
    SetParameterValuesResponse, UnknownMethod,
};
pub use decoder::{DecodeAttempt, DecodeError, Decoded, Encoding, ResponseDecoder};
pub use topic::{DeviceSerial, InvalidSerial, TopicScheme};
pub use transport::{Transport, TransportError, TransportResult};

#[cfg(feature = "mqtt")]
pub use transport::MqttTransport;

#[cfg(feature = "testing")]
pub use transport::{MockTransport, RecordedRequest};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
