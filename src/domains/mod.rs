//! Domains module containing business logic organized by bounded contexts.
//!
//! - **sessions**: registered servers and their live MCP client sessions
//! - **experiments**: timed, persisted tool-call experiments
//! - **echo**: the echo MCP server used as a test fixture

pub mod echo;
pub mod experiments;
pub mod sessions;
