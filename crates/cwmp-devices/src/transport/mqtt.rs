//! MQTT v5 request/reply transport.
//!
//! Requests are published with a `ResponseTopic` pointing at this client's
//! reply inbox and a fresh `CorrelationData`. A single background task polls
//! the rumqttc event loop and hands each reply to the request waiting on
//! its correlation id. When the broker goes away the task keeps polling with
//! a capped backoff, and rumqttc reconnects on the next successful poll.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use cwmp_core::config::BrokerConfig;
use dashmap::DashMap;
use rumqttc::v5::mqttbytes::v5::{PublishProperties, SubscribeReasonCode};
use rumqttc::v5::mqttbytes::QoS;
use rumqttc::v5::{AsyncClient, Event, EventLoop, Incoming, MqttOptions};
use rumqttc::TlsConfiguration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{adapter_error, Transport, TransportError, TransportResult};

/// Consecutive event loop errors before the link is reported as down.
const MAX_EVENT_LOOP_ERRORS: u32 = 5;

const EVENT_CHANNEL_CAPACITY: usize = 64;

pub(crate) type PendingReplies = DashMap<Bytes, oneshot::Sender<TransportResult<Bytes>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum LinkState {
    Connecting,
    /// Connected and subscribed to the reply inbox.
    Ready,
    /// Broker unreachable; the event loop keeps retrying.
    Down(String),
}

/// Delay between reconnect attempts, doubling up to `max`.
#[derive(Debug, Clone, Copy)]
struct Backoff {
    initial: Duration,
    max: Duration,
}

impl Backoff {
    const DEFAULT: Backoff = Backoff {
        initial: Duration::from_secs(1),
        max: Duration::from_secs(30),
    };

    fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.initial.saturating_mul(factor).min(self.max)
    }
}

struct Shared {
    pending: PendingReplies,
    state: watch::Sender<LinkState>,
    running: AtomicBool,
}

/// Removes a pending entry when the waiting request finishes or is dropped.
struct PendingGuard<'a> {
    pending: &'a PendingReplies,
    key: Bytes,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.key);
    }
}

/// Request/reply transport over an MQTT v5 broker.
pub struct MqttTransport {
    client: AsyncClient,
    shared: Arc<Shared>,
    reply_topic: String,
    qos: QoS,
    request_timeout: Duration,
    event_task: JoinHandle<()>,
}

impl MqttTransport {
    /// Connect to the broker and wait until the reply inbox is subscribed.
    pub async fn connect(config: &BrokerConfig) -> TransportResult<Self> {
        config
            .validate()
            .map_err(|e| TransportError::Configuration(e.to_string()))?;
        let endpoint = config
            .endpoint()
            .map_err(|e| TransportError::Configuration(e.to_string()))?;
        let qos = qos_from_level(config.qos)?;

        let client_id = format!("{}-{}", config.client_id, Uuid::new_v4().simple());
        let reply_topic = format!("{}{}", config.reply_topic_prefix, client_id);

        let mut options = MqttOptions::new(&client_id, &endpoint.host, endpoint.port);
        options.set_keep_alive(config.keep_alive());
        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            options.set_credentials(user, pass);
        }
        if config.uses_tls() {
            options.set_transport(tls_transport(config).await?);
        }

        let (client, eventloop) = AsyncClient::new(options, EVENT_CHANNEL_CAPACITY);
        let (state, mut state_rx) = watch::channel(LinkState::Connecting);
        let shared = Arc::new(Shared {
            pending: DashMap::new(),
            state,
            running: AtomicBool::new(true),
        });

        let event_task = tokio::spawn(run_event_loop(
            eventloop,
            client.clone(),
            shared.clone(),
            reply_topic.clone(),
            qos,
            Backoff::DEFAULT,
        ));

        let transport = Self {
            client,
            shared,
            reply_topic,
            qos,
            request_timeout: config.request_timeout(),
            event_task,
        };

        let settled = tokio::time::timeout(
            config.connect_timeout(),
            state_rx.wait_for(|s| *s != LinkState::Connecting),
        )
        .await
        .map(|waited| waited.map(|state| state.clone()));

        let outcome = match settled {
            Ok(Ok(LinkState::Ready)) => Ok(()),
            Ok(Ok(LinkState::Down(reason))) => Err(TransportError::Connection(reason)),
            Ok(Ok(LinkState::Connecting)) => Err(TransportError::NotConnected),
            Ok(Err(_)) => Err(TransportError::Closed),
            Err(_) => Err(TransportError::Connection(format!(
                "no CONNACK from {}:{} within {}s",
                endpoint.host,
                endpoint.port,
                config.connect_timeout().as_secs()
            ))),
        };

        if let Err(e) = outcome {
            transport.close().await;
            return Err(e);
        }

        info!(
            "MQTT transport connected to {}:{} (reply topic {})",
            endpoint.host, endpoint.port, transport.reply_topic
        );
        Ok(transport)
    }

    pub fn reply_topic(&self) -> &str {
        &self.reply_topic
    }

    /// Number of requests still waiting for a reply.
    pub fn pending_requests(&self) -> usize {
        self.shared.pending.len()
    }

    /// Disconnect from the broker and fail every in-flight request.
    pub async fn close(&self) {
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.client.disconnect().await {
            debug!("MQTT disconnect request failed: {}", e);
        }
        // Give the event loop a moment to flush the DISCONNECT.
        let mut state_rx = self.shared.state.subscribe();
        let _ = tokio::time::timeout(
            Duration::from_secs(2),
            state_rx.wait_for(|s| matches!(s, LinkState::Down(_))),
        )
        .await;
        self.event_task.abort();
        fail_pending(&self.shared.pending, TransportError::Closed);
        info!("MQTT transport closed");
    }
}

#[async_trait]
impl Transport for MqttTransport {
    async fn request(&self, topic: &str, payload: Bytes) -> TransportResult<Bytes> {
        if !self.shared.running.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        let correlation = Bytes::from(Uuid::new_v4().to_string());
        let (tx, rx) = oneshot::channel();
        self.shared.pending.insert(correlation.clone(), tx);
        let _guard = PendingGuard {
            pending: &self.shared.pending,
            key: correlation.clone(),
        };

        let properties = PublishProperties {
            response_topic: Some(self.reply_topic.clone()),
            correlation_data: Some(correlation),
            ..Default::default()
        };

        debug!("Publishing {} byte request to {}", payload.len(), topic);
        self.client
            .publish_with_properties(topic.to_string(), self.qos, false, payload, properties)
            .await
            .map_err(|e| TransportError::Publish(e.to_string()))?;

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(TransportError::Closed),
            Err(_) => {
                debug!("Request to {} timed out", topic);
                Err(TransportError::Timeout(self.request_timeout.as_millis() as u64))
            }
        }
    }

    fn is_connected(&self) -> bool {
        *self.shared.state.borrow() == LinkState::Ready
    }

    fn name(&self) -> &str {
        "mqtt"
    }
}

impl Drop for MqttTransport {
    fn drop(&mut self) {
        self.event_task.abort();
    }
}

async fn run_event_loop(
    mut eventloop: EventLoop,
    client: AsyncClient,
    shared: Arc<Shared>,
    reply_topic: String,
    qos: QoS,
    backoff: Backoff,
) {
    let mut error_count = 0;

    while shared.running.load(Ordering::SeqCst) {
        match eventloop.poll().await {
            Ok(event) => {
                error_count = 0;
                match event {
                    Event::Incoming(Incoming::ConnAck(_)) => {
                        info!("MQTT connection acknowledged, subscribing to {}", reply_topic);
                        // Clean start drops subscriptions, so resubscribe on every CONNACK.
                        if let Err(e) = client.try_subscribe(reply_topic.clone(), qos) {
                            warn!("Failed to subscribe to {}: {}", reply_topic, e);
                        }
                    }
                    Event::Incoming(Incoming::SubAck(ack)) => {
                        if ack
                            .return_codes
                            .iter()
                            .all(|code| matches!(code, SubscribeReasonCode::Success(_)))
                        {
                            shared.state.send_replace(LinkState::Ready);
                        } else {
                            warn!(
                                "Broker rejected reply subscription {}: {:?}",
                                reply_topic, ack.return_codes
                            );
                        }
                    }
                    Event::Incoming(Incoming::Publish(publish)) => {
                        let correlation = publish
                            .properties
                            .as_ref()
                            .and_then(|p| p.correlation_data.as_ref());
                        route_reply(&shared.pending, correlation, publish.payload.clone());
                    }
                    Event::Incoming(Incoming::Disconnect(_)) => {
                        warn!("Broker sent DISCONNECT");
                        shared.state.send_replace(LinkState::Connecting);
                    }
                    _ => {}
                }
            }
            Err(e) => {
                if !shared.running.load(Ordering::SeqCst) {
                    break;
                }
                error_count += 1;
                if error_count == 1 {
                    // The reply subscription went with the session.
                    fail_pending(&shared.pending, TransportError::Connection(e.to_string()));
                }

                let delay = backoff.delay(error_count);
                if error_count >= MAX_EVENT_LOOP_ERRORS {
                    if error_count == MAX_EVENT_LOOP_ERRORS {
                        error!(
                            "MQTT broker unreachable after {} attempts, retrying every {:?}: {}",
                            error_count, backoff.max, e
                        );
                    }
                    shared.state.send_replace(LinkState::Down(e.to_string()));
                } else {
                    warn!(
                        "MQTT event loop error ({}/{}), retrying in {:?}: {}",
                        error_count, MAX_EVENT_LOOP_ERRORS, delay, e
                    );
                    shared.state.send_replace(LinkState::Connecting);
                }
                // rumqttc reconnects on the next poll.
                tokio::time::sleep(delay).await;
            }
        }
    }

    shared
        .state
        .send_replace(LinkState::Down("transport closed".to_string()));
    info!("MQTT event loop stopped");
}

/// Deliver a reply to the request waiting on `correlation`.
///
/// Returns `false` when nobody is waiting any more: the request timed out,
/// the reply is a duplicate, or it carries no correlation data.
pub(crate) fn route_reply(
    pending: &PendingReplies,
    correlation: Option<&Bytes>,
    payload: Bytes,
) -> bool {
    let Some(key) = correlation else {
        warn!("Dropping reply without correlation data");
        return false;
    };
    let Some((_, tx)) = pending.remove(key) else {
        debug!("Dropping reply for unknown or expired request");
        return false;
    };
    let result = match adapter_error(&payload) {
        Some(err) => Err(err),
        None => Ok(payload),
    };
    tx.send(result).is_ok()
}

fn fail_pending(pending: &PendingReplies, err: TransportError) {
    let keys: Vec<Bytes> = pending.iter().map(|entry| entry.key().clone()).collect();
    for key in keys {
        if let Some((_, tx)) = pending.remove(&key) {
            let _ = tx.send(Err(err.clone()));
        }
    }
}

fn qos_from_level(level: u8) -> TransportResult<QoS> {
    match level {
        0 => Ok(QoS::AtMostOnce),
        1 => Ok(QoS::AtLeastOnce),
        2 => Ok(QoS::ExactlyOnce),
        other => Err(TransportError::Configuration(format!(
            "invalid MQTT QoS {}",
            other
        ))),
    }
}

async fn tls_transport(config: &BrokerConfig) -> TransportResult<rumqttc::Transport> {
    let tls = config.tls.clone().unwrap_or_default();
    let read = |path: std::path::PathBuf| async move {
        tokio::fs::read(&path).await.map_err(|e| {
            TransportError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })
    };

    let ca = read(tls.ca_file).await?;
    let cert = read(tls.cert_file).await?;
    let key = read(tls.key_file).await?;

    Ok(rumqttc::Transport::tls_with_config(TlsConfiguration::Simple {
        ca,
        alpn: None,
        client_auth: Some((cert, key)),
    }))
}
