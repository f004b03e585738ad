//! Durable storage for registrations and experiment records.
//!
//! Rows are insert-only. The SQLite connection is blocking, so every call is
//! moved onto the blocking thread pool.

mod error;
mod sqlite;

pub use error::{StoreError, StoreResult};
pub use sqlite::SqliteStore;
