//! Interaction bridge: one device request in, one typed response out.
//!
//! The bridge keeps no state between calls. Each interaction validates the
//! serial, builds the device topic, performs exactly one transport request
//! and decodes the reply. Failures are returned as-is; nothing is retried.

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cwmp::{CwmpResponse, ResponseVariant, RpcMethod};
use crate::decoder::{DecodeError, Encoding, ResponseDecoder};
use crate::topic::{DeviceSerial, InvalidSerial, TopicScheme};
use crate::transport::{Transport, TransportError};

/// Why an interaction produced no response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// Rejected before anything was sent.
    #[error("Invalid device id: {0}")]
    InvalidDeviceId(#[from] InvalidSerial),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The device answered but the reply could not be decoded.
    #[error("{source}")]
    Decode {
        raw: Bytes,
        #[source]
        source: DecodeError,
    },
}

impl BridgeError {
    /// Raw reply, when one was received.
    pub fn raw_reply(&self) -> Option<&Bytes> {
        match self {
            Self::Decode { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

/// Outcome of a successful interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction<R> {
    /// Reply exactly as received.
    pub raw: Bytes,
    pub response: R,
    /// Encoding that decoded `raw`.
    pub encoding: Encoding,
}

/// Routes requests to devices and decodes their replies.
#[derive(Clone)]
pub struct InteractionBridge {
    transport: Arc<dyn Transport>,
    topics: TopicScheme,
    decoder: ResponseDecoder,
}

impl InteractionBridge {
    pub fn new(transport: Arc<dyn Transport>, topics: TopicScheme) -> Self {
        Self {
            transport,
            topics,
            decoder: ResponseDecoder::default(),
        }
    }

    pub fn with_decoder(mut self, decoder: ResponseDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn topics(&self) -> &TopicScheme {
        &self.topics
    }

    /// Send `payload` to `serial` and decode the reply as `R`.
    pub async fn interact<R: CwmpResponse>(
        &self,
        serial: &str,
        payload: Bytes,
    ) -> Result<Interaction<R>, BridgeError> {
        let raw = self.exchange(R::METHOD, serial, payload).await?;
        match self.decoder.decode::<R>(&raw) {
            Ok(decoded) => Ok(Interaction {
                raw,
                response: decoded.value,
                encoding: decoded.encoding,
            }),
            Err(source) => {
                warn!("Undecodable {} reply from {}: {}", R::METHOD, serial, source);
                Err(BridgeError::Decode { raw, source })
            }
        }
    }

    /// Like [`interact`](Self::interact) with the variant chosen at run time.
    pub async fn interact_method(
        &self,
        method: RpcMethod,
        serial: &str,
        payload: Bytes,
    ) -> Result<Interaction<ResponseVariant>, BridgeError> {
        let raw = self.exchange(method, serial, payload).await?;
        match self.decoder.decode_variant(method, &raw) {
            Ok(decoded) => Ok(Interaction {
                raw,
                response: decoded.value,
                encoding: decoded.encoding,
            }),
            Err(source) => {
                warn!("Undecodable {} reply from {}: {}", method, serial, source);
                Err(BridgeError::Decode { raw, source })
            }
        }
    }

    async fn exchange(
        &self,
        method: RpcMethod,
        serial: &str,
        payload: Bytes,
    ) -> Result<Bytes, BridgeError> {
        let serial = DeviceSerial::parse(serial)?;
        let topic = self.topics.api_topic(&serial);
        debug!("{} request for {} via {}", method, serial, topic);

        let raw = self.transport.request(&topic, payload).await?;
        debug!("{} reply from {}: {} bytes", method, serial, raw.len());
        Ok(raw)
    }
}
