//! Error types for the optimum client.

use thiserror::Error;

/// Errors that can occur when talking to the service or buffering records.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Connection failure, timeout or undecodable response body
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a status other than the expected one
    #[error("Unexpected response: HTTP {status}: {body}")]
    Transport {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Codec or compressor failed on an open stream
    #[error("Encoding failed: {0}")]
    Encoding(#[from] std::io::Error),

    /// The caller's cancellation token fired
    #[error("Operation cancelled")]
    Cancelled,

    /// A previous flush failed and its segment is still held
    #[error("Undelivered segment of {0} bytes must be synced or discarded before writing")]
    UndeliveredSegment(usize),

    /// Unique key exceeds the limit under the reject policy
    #[error("Unique key of {len} bytes exceeds limit of {limit} bytes")]
    KeyTooLong { len: usize, limit: usize },

    /// Job handle cannot be turned into a status URL
    #[error("Invalid job handle: {0}")]
    InvalidJob(String),

    /// Text could not be embedded
    #[error("Embedding failed: {0}")]
    Embedding(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// HTTP status of a rejected request, if any.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            ClientError::Transport { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
            _ => None,
        }
    }
}
