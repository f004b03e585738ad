//! Experiment-specific error types.

use thiserror::Error;

use crate::core::store::StoreError;

/// Result type for experiment operations.
pub type ExperimentResult<T> = Result<T, ExperimentError>;

/// Errors that abort an experiment request.
///
/// Failed tool calls are not errors at this level; they are recorded inside
/// the experiment record.
#[derive(Debug, Error)]
pub enum ExperimentError {
    /// No experiment is stored under the given id.
    #[error("Experiment not found: {0}")]
    NotFound(String),

    /// The experiment names a server that is not registered.
    #[error("Server not found: {0}")]
    ServerNotFound(String),

    /// The record could not be persisted or loaded.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExperimentError {
    /// Create a new "not found" error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    /// Create a new "server not found" error.
    pub fn server_not_found(id: impl Into<String>) -> Self {
        Self::ServerNotFound(id.into())
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
