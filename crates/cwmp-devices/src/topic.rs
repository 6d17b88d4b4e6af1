//! Per-device topic addressing.
//!
//! Requests for a device's API channel are published to
//! `<prefix><serial>.api`. Adapters that serve a device subscribe to the same
//! subject, so the scheme is part of the wire contract.

use std::fmt;
use std::str::FromStr;

use cwmp_core::config::{BridgeConfig, FORBIDDEN_TOPIC_CHARS};
use thiserror::Error;

/// Suffix of the API-initiated channel for a device.
pub const API_CHANNEL_SUFFIX: &str = ".api";

/// Reasons a device serial cannot be turned into a topic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidSerial {
    #[error("device serial must not be empty")]
    Empty,

    #[error("device serial must not start or end with whitespace")]
    Whitespace,

    #[error("device serial contains forbidden character {0:?}")]
    ForbiddenChar(char),
}

/// Serial number identifying one managed device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceSerial(String);

impl DeviceSerial {
    pub fn parse(value: &str) -> Result<Self, InvalidSerial> {
        if value.is_empty() {
            return Err(InvalidSerial::Empty);
        }
        if value.trim() != value {
            return Err(InvalidSerial::Whitespace);
        }
        if let Some(c) = value.chars().find(|c| FORBIDDEN_TOPIC_CHARS.contains(c)) {
            return Err(InvalidSerial::ForbiddenChar(c));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceSerial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DeviceSerial {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for DeviceSerial {
    type Err = InvalidSerial;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DeviceSerial {
    type Error = InvalidSerial;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// Fixed topic scheme: a namespace prefix plus per-channel suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicScheme {
    prefix: String,
}

impl TopicScheme {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(config.topic_prefix.clone())
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Topic of the API channel for `serial`.
    pub fn api_topic(&self, serial: &DeviceSerial) -> String {
        format!("{}{}{}", self.prefix, serial, API_CHANNEL_SUFFIX)
    }
}

impl Default for TopicScheme {
    fn default() -> Self {
        Self::from_config(&BridgeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_topic() {
        let scheme = TopicScheme::default();
        let serial = DeviceSerial::parse("ABC123").unwrap();
        assert_eq!(scheme.api_topic(&serial), "cwmp-adapter.v1.ABC123.api");
    }

    #[test]
    fn test_custom_prefix() {
        let scheme = TopicScheme::new("lab.cwmp.");
        let serial: DeviceSerial = "00259E-EG8145V5-48575443".parse().unwrap();
        assert_eq!(
            scheme.api_topic(&serial),
            "lab.cwmp.00259E-EG8145V5-48575443.api"
        );
    }

    #[test]
    fn test_invalid_serials() {
        assert_eq!(DeviceSerial::parse(""), Err(InvalidSerial::Empty));
        assert_eq!(DeviceSerial::parse(" ABC"), Err(InvalidSerial::Whitespace));
        assert_eq!(
            DeviceSerial::parse("dev+1"),
            Err(InvalidSerial::ForbiddenChar('+'))
        );
        assert_eq!(
            DeviceSerial::parse("dev#"),
            Err(InvalidSerial::ForbiddenChar('#'))
        );
    }

    #[test]
    fn test_distinct_serials_give_distinct_topics() {
        let scheme = TopicScheme::default();
        let serials = ["A", "AB", "B", "A.api", "ABC123", "abc123"];
        let mut topics: Vec<String> = serials
            .iter()
            .map(|s| scheme.api_topic(&DeviceSerial::parse(s).unwrap()))
            .collect();
        topics.sort();
        topics.dedup();
        assert_eq!(topics.len(), serials.len());
    }
}
