//! Session-specific error types.

use thiserror::Error;

use crate::core::store::StoreError;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can occur while managing or using remote sessions.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No session is registered under the given id.
    #[error("Server not found: {0}")]
    NotFound(String),

    /// The supplied address cannot be registered.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// The remote server could not be reached or the handshake failed.
    #[error("Failed to connect to {address}: {reason}")]
    Connection { address: String, reason: String },

    /// Listing the remote server's tools failed.
    #[error("Tool discovery failed: {0}")]
    Discovery(String),

    /// A single tool call failed or returned an error result.
    #[error("Tool call failed: {0}")]
    Invocation(String),

    /// The session was already closed.
    #[error("Session closed")]
    Closed,

    /// Persisting the registration failed.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl SessionError {
    /// Create a new "not found" error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    /// Create a new "invalid address" error.
    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::InvalidAddress(msg.into())
    }

    /// Create a new connection error.
    pub fn connection(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Connection {
            address: address.into(),
            reason: reason.into(),
        }
    }

    /// Create a new discovery error.
    pub fn discovery(msg: impl Into<String>) -> Self {
        Self::Discovery(msg.into())
    }

    /// Create a new invocation error.
    pub fn invocation(msg: impl Into<String>) -> Self {
        Self::Invocation(msg.into())
    }
}
