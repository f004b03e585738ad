//! MCP Experiment Server Library
//!
//! Registers remote MCP servers, discovers their tools and runs timed,
//! repeated tool calls ("experiments") whose results are persisted in SQLite.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, storage, lifecycle and the HTTP API
//! - **domains**: business logic organized by bounded contexts
//!   - **sessions**: registered servers and their live MCP client sessions
//!   - **experiments**: the sequential timed-call runner and its records
//!   - **echo**: a one-tool MCP server used as a test fixture
//!
//! # Example
//!
//! ```rust,no_run
//! use mcp_experiment_server::core::{Config, ExperimentServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = ExperimentServer::start(Config::from_env()).await?;
//!     let registration = server.registry().register("http://127.0.0.1:8001/mcp").await?;
//!     println!("registered {}", registration.id);
//!     server.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, ExperimentServer, Result};
