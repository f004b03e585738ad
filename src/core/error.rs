//! Error types and handling for the experiment server.
//!
//! This module defines a unified error type that can represent errors from
//! all domains and external dependencies, providing consistent error handling
//! across the entire application.

use thiserror::Error;

/// A specialized Result type for experiment server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the experiment server.
///
/// This enum captures all possible error conditions that can occur during
/// server operation, including domain-specific errors and external failures.
#[derive(Debug, Error)]
pub enum Error {
    /// Error originating from the sessions domain.
    #[error("Session error: {0}")]
    Session(#[from] crate::domains::sessions::SessionError),

    /// Error originating from the experiments domain.
    #[error("Experiment error: {0}")]
    Experiment(#[from] crate::domains::experiments::ExperimentError),

    /// Error originating from the durable store.
    #[error("Storage error: {0}")]
    Store(#[from] super::store::StoreError),

    /// Error originating from the HTTP transport.
    #[error("Transport error: {0}")]
    Transport(#[from] super::transport::TransportError),
}
