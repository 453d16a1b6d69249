//! Error types for document host operations.

use thiserror::Error;

/// Errors that can occur when interacting with the document host.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Collection does not exist (or no longer exists).
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// Variable does not exist (or no longer exists).
    #[error("variable not found: {0}")]
    VariableNotFound(String),

    /// Node does not exist (or no longer exists).
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// Page does not exist.
    #[error("page not found: {0}")]
    PageNotFound(String),

    /// A mode id is not part of the target collection.
    #[error("mode not found: {mode} in collection {collection}")]
    ModeNotFound { collection: String, mode: String },

    /// The host rejected a variable creation.
    #[error("variable creation rejected: {0}")]
    CreationRejected(String),

    /// The host rejected a write.
    #[error("write rejected: {0}")]
    WriteRejected(String),
}
