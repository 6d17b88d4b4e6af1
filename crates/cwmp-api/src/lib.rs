//! HTTP API for the CWMP bridge.
//!
//! Accepts CWMP requests over HTTP, forwards them to the addressed device
//! through the interaction bridge and returns the device's reply.

pub mod handlers;
pub mod models;
pub mod server;
pub mod shutdown;

pub use models::{ApiResponse, ErrorResponse};
pub use server::{create_router_with_state, run, serve, ServerState};

#[cfg(feature = "mqtt")]
pub use server::start_server;
