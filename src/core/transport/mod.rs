//! Transport layer for the experiment server.
//!
//! The experiment API is served over HTTP with axum. The same listener
//! configuration is reused by the echo test server.

mod config;
mod error;
pub mod http;

pub use config::HttpConfig;
pub use error::{TransportError, TransportResult};
pub use http::HttpTransport;
