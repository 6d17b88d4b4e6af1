//! Unified error handling for cwmp-bridge.
//!
//! Library crates with a narrower concern (transport, decoding) define their
//! own error enums; this type covers configuration and bootstrap failures
//! that every crate may surface.

/// Unified error type for cwmp-bridge.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors.
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, Error>;

#[macro_export]
macro_rules! config_err {
    ($msg:expr) => {
        $crate::error::Error::Config($msg.into())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::Error::Config(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! validation_err {
    ($msg:expr) => {
        $crate::error::Error::Validation($msg.into())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::Error::Validation(format!($fmt, $($arg)*))
    };
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::Config(format!("invalid URL: {}", e))
    }
}
