//! Error types for backend calls

use eduvid_core::ValidationError;
use reqwest::StatusCode;

/// Result type for client operations
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Errors surfaced by the client; none of them are retried
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("HTTP {status}: {message}")]
    Http { status: StatusCode, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("A request is already in flight")]
    Busy,
}

impl ClientError {
    /// Build an HTTP error from a failed response body, preferring the
    /// backend's `detail` field over the raw text
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| match value.get("detail") {
                Some(serde_json::Value::String(detail)) => Some(detail.clone()),
                Some(other) => Some(other.to_string()),
                None => None,
            })
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                } else {
                    body.trim().to_string()
                }
            });

        ClientError::Http { status, message }
    }

    /// HTTP status of a backend rejection
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Network(e) => e.status(),
            _ => None,
        }
    }

    /// Message suitable for a one-shot user notification
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Http { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
