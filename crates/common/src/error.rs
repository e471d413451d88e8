//! Error types for the scanning page API client

use thiserror::Error;

/// Result type alias using the API client Error
pub type Result<T> = std::result::Result<T, Error>;

/// API client error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("{method} {path} returned {status}: {body}")]
    UnexpectedStatus {
        method: String,
        path: String,
        status: u16,
        body: serde_json::Value,
    },

    #[error("Could not decode response from {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("Response from {path} is missing field '{field}'")]
    MissingField { path: String, field: String },
}

impl Error {
    /// True for errors raised before the server answered (connection refused, DNS, TLS).
    pub fn is_transport(&self) -> bool {
        match self {
            Error::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }
}
