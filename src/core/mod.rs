//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks for the experiment
//! server: error handling, configuration, durable storage, server lifecycle
//! management and the HTTP transport.

pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use server::ExperimentServer;
pub use store::{SqliteStore, StoreError};
pub use transport::{HttpConfig, HttpTransport};
