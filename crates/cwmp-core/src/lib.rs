//! Core types shared across the cwmp-bridge crates.
//!
//! This crate holds the configuration values handed to the transport, the
//! interaction bridge and the HTTP server, together with the workspace-wide
//! error type.

pub mod config;
pub mod error;

pub use config::{
    BridgeConfig, BrokerConfig, BrokerEndpoint, ServerConfig, TlsConfig, defaults, env_vars,
};
pub use error::{Error, Result};
