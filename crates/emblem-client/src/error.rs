//! Error types for the platform clients.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The HTTP response had a non-2xx status code.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// An error from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// An error from the WebSocket layer.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// A JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A generic error string.
    #[error("{0}")]
    Other(String),
}

impl ClientError {
    /// The HTTP status, for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the platform answered that the resource is gone or walled
    /// off, the two ways "you are not in that server anymore" shows up.
    pub fn is_gone(&self) -> bool {
        matches!(self.status(), Some(403 | 404))
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
