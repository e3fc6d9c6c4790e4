//! Error types for the hostwatch system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for hostwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the hostwatch system
#[derive(Error, Debug)]
pub enum Error {
    /// Interface enumeration errors
    #[error("enumeration error: {0}")]
    Enumeration(String),

    /// External address lookup errors
    #[error("lookup error: {0}")]
    Lookup(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Network-related errors
    #[error("network error: {0}")]
    Network(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport and status errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an enumeration error
    pub fn enumeration(msg: impl Into<String>) -> Self {
        Self::Enumeration(msg.into())
    }

    /// Create a lookup error
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
