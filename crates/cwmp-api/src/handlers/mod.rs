//! API handlers organized by domain.

pub mod basic;
pub mod cwmp;

// Re-export ServerState so handlers can use it
pub use crate::server::ServerState;

pub use basic::{health_handler, liveness_handler, readiness_handler};
