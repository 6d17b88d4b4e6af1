//! In-memory transport for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use super::{Transport, TransportError, TransportResult};

type Handler = Arc<dyn Fn(&str, &Bytes) -> TransportResult<Bytes> + Send + Sync>;

/// A request seen by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub topic: String,
    pub payload: Bytes,
}

/// Scripted transport.
///
/// Queued outcomes are consumed first, one per request; once the queue is
/// empty the handler (if any) answers, otherwise the request fails with
/// `NotConnected`.
#[derive(Clone, Default)]
pub struct MockTransport {
    queue: Arc<Mutex<VecDeque<TransportResult<Bytes>>>>,
    handler: Arc<Mutex<Option<Handler>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    disconnected: Arc<AtomicBool>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request with the same payload.
    pub fn replying(payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();
        Self::with_handler(move |_, _| Ok(payload.clone()))
    }

    /// Fail every request with the same error.
    pub fn failing(err: TransportError) -> Self {
        Self::with_handler(move |_, _| Err(err.clone()))
    }

    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&str, &Bytes) -> TransportResult<Bytes> + Send + Sync + 'static,
    {
        let mock = Self::new();
        *mock.handler.lock() = Some(Arc::new(handler));
        mock
    }

    /// Queue a single reply.
    pub fn push_reply(&self, payload: impl Into<Bytes>) {
        self.queue.lock().push_back(Ok(payload.into()));
    }

    /// Queue a single failure.
    pub fn push_error(&self, err: TransportError) {
        self.queue.lock().push_back(Err(err));
    }

    pub fn set_connected(&self, connected: bool) {
        self.disconnected.store(!connected, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, topic: &str, payload: Bytes) -> TransportResult<Bytes> {
        self.requests.lock().push(RecordedRequest {
            topic: topic.to_string(),
            payload: payload.clone(),
        });

        if let Some(outcome) = self.queue.lock().pop_front() {
            return outcome;
        }
        let handler = self.handler.lock().clone();
        match handler {
            Some(handler) => handler(topic, &payload),
            None => Err(TransportError::NotConnected),
        }
    }

    fn is_connected(&self) -> bool {
        !self.disconnected.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
