//! Error types for the session layer.

use thiserror::Error;

/// Errors that can occur while decoding or encoding session messages.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Malformed request or unserializable response.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
