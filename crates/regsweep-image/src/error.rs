//! Error types for registry calls
//!
//! These never cross the public [`RegistryClient`](crate::RegistryClient)
//! API: each call logs the error and reports the data as unavailable.

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Error, Debug)]
pub enum RegistryError {
    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Credentials produce an invalid header value
    #[error("Invalid authorization header: {0}")]
    InvalidAuthHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// Network-level failure
    #[error("Failed to connect to registry at {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success response
    #[error("Registry returned {status} for {url}")]
    Status { status: StatusCode, url: String },

    /// Response body was not the expected JSON
    #[error("Failed to parse response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Manifest response without a usable Docker-Content-Digest header
    #[error("No valid Docker-Content-Digest header in response for {url}")]
    MissingDigest { url: String },
}

impl RegistryError {
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }

    pub fn status(status: StatusCode, url: impl Into<String>) -> Self {
        Self::Status {
            status,
            url: url.into(),
        }
    }

    pub fn decode(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }

    pub fn missing_digest(url: impl Into<String>) -> Self {
        Self::MissingDigest { url: url.into() }
    }
}
