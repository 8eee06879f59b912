//! Client error handling
//!
//! Typed errors for talking to the recorder, both over REST and over the
//! event connection.

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors that can occur while talking to the recorder
#[derive(Error, Debug)]
pub enum ClientError {
    /// Server URL cannot be used
    #[error("Invalid server URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Request never produced a response (connect refused, timeout, ...)
    #[error("Request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("{endpoint} returned HTTP {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// Response body did not match the expected shape
    #[error("Unexpected response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Event channel payload could not be parsed
    #[error("Malformed event payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// WebSocket transport failure
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
}

impl ClientError {
    /// Whether the server was reached at all
    ///
    /// Status and decode errors mean the recorder is up but unhappy.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ClientError::Http { .. } | ClientError::WebSocket(_))
    }

    /// HTTP status code, when the server answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors from editing a streamer entry field by name
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FieldError {
    #[error("Unknown field '{0}'. Valid fields: platform, id, name, interval, format, output, proxy")]
    Unknown(String),

    #[error("Invalid value for {field}: '{value}'")]
    Invalid { field: String, value: String },
}
