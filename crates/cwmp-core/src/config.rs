//! Configuration values for the bridge, the broker connection and the HTTP
//! server.
//!
//! Every value here is immutable once built. The CLI resolves each field
//! with the precedence flag > environment variable > `.env` file > compiled
//! default and hands the result to the components at construction time.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::{config_err, validation_err};

/// Compiled defaults.
pub mod defaults {
    pub const HTTP_HOST: &str = "127.0.0.1";
    pub const HTTP_PORT: u16 = 8000;

    pub const MQTT_URL: &str = "tcp://localhost:1883";
    pub const MQTT_CLIENT_ID: &str = "cwmp-bridge";
    pub const MQTT_QOS: u8 = 1;
    pub const MQTT_KEEP_ALIVE_SECS: u64 = 60;
    pub const MQTT_PLAIN_PORT: u16 = 1883;
    pub const MQTT_TLS_PORT: u16 = 8883;

    pub const CLIENT_CRT: &str = "cert.pem";
    pub const CLIENT_KEY: &str = "key.pem";
    pub const SERVER_CA: &str = "rootCA.pem";

    pub const REQUEST_TIMEOUT_SECS: u64 = 10;
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;

    /// Namespace under which CWMP adapters listen for per-device requests.
    pub const TOPIC_PREFIX: &str = "cwmp-adapter.v1.";
    /// Namespace for the bridge's own reply inbox.
    pub const REPLY_TOPIC_PREFIX: &str = "cwmp-bridge.reply.";
}

/// Environment variable names.
pub mod env_vars {
    pub const HTTP_HOST: &str = "CWMP_HTTP_HOST";
    pub const HTTP_PORT: &str = "CWMP_HTTP_PORT";

    pub const MQTT_URL: &str = "MQTT_URL";
    pub const MQTT_CLIENT_ID: &str = "MQTT_CLIENT_ID";
    pub const MQTT_USERNAME: &str = "MQTT_USERNAME";
    pub const MQTT_PASSWORD: &str = "MQTT_PASSWORD";
    pub const MQTT_QOS: &str = "MQTT_QOS";
    pub const MQTT_ENABLE_TLS: &str = "MQTT_ENABLE_TLS";

    pub const CLIENT_CRT: &str = "CLIENT_CRT";
    pub const CLIENT_KEY: &str = "CLIENT_KEY";
    pub const SERVER_CA: &str = "SERVER_CA";

    pub const REQUEST_TIMEOUT_SECS: &str = "CWMP_REQUEST_TIMEOUT_SECS";
    pub const TOPIC_PREFIX: &str = "CWMP_TOPIC_PREFIX";

    pub const LOG_JSON: &str = "CWMP_LOG_JSON";
}

/// Local override file loaded after `.env`.
pub const LOCAL_ENV_FILE: &str = ".env.local";

/// Characters that may not appear in a topic segment we publish to.
pub const FORBIDDEN_TOPIC_CHARS: [char; 3] = ['+', '#', '\0'];

/// TLS material for the broker connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Client certificate (PEM).
    pub cert_file: PathBuf,
    /// Client private key (PEM).
    pub key_file: PathBuf,
    /// CA bundle used to verify the broker (PEM).
    pub ca_file: PathBuf,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_file: PathBuf::from(defaults::CLIENT_CRT),
            key_file: PathBuf::from(defaults::CLIENT_KEY),
            ca_file: PathBuf::from(defaults::SERVER_CA),
        }
    }
}

/// Host, port and security of a parsed broker URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerEndpoint {
    pub host: String,
    pub port: u16,
    /// The URL scheme itself demands TLS (`ssl://`, `mqtts://`).
    pub secure: bool,
}

/// Broker connection parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Broker URL, e.g. `tcp://localhost:1883` or `mqtts://broker:8883`.
    pub url: String,

    /// Client ID prefix; a random suffix is appended per connection.
    #[serde(default = "default_client_id")]
    pub client_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// QoS used for requests and the reply subscription (0, 1 or 2).
    #[serde(default = "default_qos")]
    pub qos: u8,

    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,

    /// Deadline for one request/reply exchange.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Deadline for the initial CONNACK.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsConfig>,

    #[serde(default = "default_reply_topic_prefix")]
    pub reply_topic_prefix: String,
}

fn default_client_id() -> String {
    defaults::MQTT_CLIENT_ID.to_string()
}
fn default_qos() -> u8 {
    defaults::MQTT_QOS
}
fn default_keep_alive() -> u64 {
    defaults::MQTT_KEEP_ALIVE_SECS
}
fn default_request_timeout() -> u64 {
    defaults::REQUEST_TIMEOUT_SECS
}
fn default_connect_timeout() -> u64 {
    defaults::CONNECT_TIMEOUT_SECS
}
fn default_reply_topic_prefix() -> String {
    defaults::REPLY_TOPIC_PREFIX.to_string()
}

impl BrokerConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client_id: default_client_id(),
            username: None,
            password: None,
            qos: defaults::MQTT_QOS,
            keep_alive_secs: defaults::MQTT_KEEP_ALIVE_SECS,
            request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: defaults::CONNECT_TIMEOUT_SECS,
            tls: None,
            reply_topic_prefix: default_reply_topic_prefix(),
        }
    }

    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn with_qos(mut self, qos: u8) -> Self {
        self.qos = qos;
        self
    }

    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs();
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    /// Whether the connection must be wrapped in TLS.
    pub fn uses_tls(&self) -> bool {
        self.tls.is_some()
            || self
                .endpoint()
                .map(|endpoint| endpoint.secure)
                .unwrap_or(false)
    }

    /// Parse the broker URL into host, port and security.
    pub fn endpoint(&self) -> Result<BrokerEndpoint> {
        let url = Url::parse(&self.url)?;
        let (secure, default_port) = match url.scheme() {
            "tcp" | "mqtt" => (false, defaults::MQTT_PLAIN_PORT),
            "ssl" | "mqtts" | "tls" => (true, defaults::MQTT_TLS_PORT),
            other => return Err(config_err!("unsupported broker scheme '{}'", other)),
        };
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| config_err!("broker URL '{}' has no host", self.url))?;

        Ok(BrokerEndpoint {
            host: host.to_string(),
            port: url.port().unwrap_or(default_port),
            secure,
        })
    }

    /// Validate the whole configuration.
    pub fn validate(&self) -> Result<()> {
        let endpoint = self.endpoint()?;
        if endpoint.secure && self.tls.is_none() {
            return Err(config_err!(
                "broker URL '{}' requires TLS but no TLS material is configured",
                self.url
            ));
        }
        if self.client_id.trim().is_empty() {
            return Err(validation_err!("MQTT client id must not be empty"));
        }
        // The client id is the last level of the reply topic we subscribe to.
        if let Some(c) = self
            .client_id
            .chars()
            .find(|c| *c == '/' || FORBIDDEN_TOPIC_CHARS.contains(c))
        {
            return Err(validation_err!(
                "MQTT client id '{}' contains forbidden character {:?}",
                self.client_id,
                c
            ));
        }
        if self.qos > 2 {
            return Err(validation_err!("MQTT QoS must be 0, 1 or 2, got {}", self.qos));
        }
        if self.request_timeout_secs == 0 {
            return Err(validation_err!("request timeout must be at least one second"));
        }
        if self.username.is_some() != self.password.is_some() {
            return Err(validation_err!(
                "MQTT username and password must be provided together"
            ));
        }
        validate_topic_prefix(&self.reply_topic_prefix)?;
        Ok(())
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self::new(defaults::MQTT_URL)
    }
}

/// Addressing scheme used by the interaction bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Namespace prepended to every device serial.
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,
}

fn default_topic_prefix() -> String {
    defaults::TOPIC_PREFIX.to_string()
}

impl BridgeConfig {
    pub fn with_topic_prefix(prefix: impl Into<String>) -> Self {
        Self {
            topic_prefix: prefix.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_topic_prefix(&self.topic_prefix)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            topic_prefix: default_topic_prefix(),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|e| config_err!("invalid bind host '{}': {}", self.host, e))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(defaults::HTTP_HOST, defaults::HTTP_PORT)
    }
}

fn validate_topic_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(validation_err!("topic prefix must not be empty"));
    }
    if let Some(c) = prefix.chars().find(|c| FORBIDDEN_TOPIC_CHARS.contains(c)) {
        return Err(Error::Validation(format!(
            "topic prefix '{}' contains forbidden character {:?}",
            prefix, c
        )));
    }
    Ok(())
}
