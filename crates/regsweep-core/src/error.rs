//! Error types for regsweep-core

use thiserror::Error;

/// Result type alias using regsweep-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for regsweep
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration value
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Content digest not in `algorithm:encoded` form
    #[error("Invalid content digest: {digest}")]
    InvalidDigest { digest: String },
}

impl Error {
    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid digest error
    pub fn invalid_digest(digest: impl Into<String>) -> Self {
        Self::InvalidDigest {
            digest: digest.into(),
        }
    }
}
