//! Server state and types.

use std::sync::Arc;

use cwmp_devices::InteractionBridge;

/// Maximum request body size (1 MiB).
pub const MAX_REQUEST_BODY_SIZE: usize = 1024 * 1024;

/// Server state shared across all handlers.
#[derive(Clone)]
pub struct ServerState {
    /// Device interaction bridge.
    pub bridge: Arc<InteractionBridge>,

    /// Server start timestamp.
    pub started_at: i64,
}

impl ServerState {
    pub fn new(bridge: Arc<InteractionBridge>) -> Self {
        Self {
            bridge,
            started_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Whether the bridge's transport can issue requests.
    pub fn transport_ready(&self) -> bool {
        self.bridge.transport().is_connected()
    }
}
