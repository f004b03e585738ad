//! Store error types.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the durable store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite reported an error.
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    /// A JSON column could not be encoded or decoded.
    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// A stored row could not be turned back into a record.
    #[error("Corrupt row {id}: {reason}")]
    Corrupt { id: String, reason: String },

    /// The connection mutex was poisoned by a panicking writer.
    #[error("Database connection poisoned")]
    Poisoned,

    /// The blocking task running the query failed.
    #[error("Store task failed: {0}")]
    Task(String),
}

impl StoreError {
    /// Create a corrupt-row error.
    pub fn corrupt(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            id: id.into(),
            reason: reason.into(),
        }
    }
}
