//! Sessions domain module.
//!
//! Owns the registered MCP servers and the long-lived client sessions the
//! experiment runner drives.
//!
//! ## Architecture
//!
//! - `session.rs` - `ToolSession` / `Connector` traits
//! - `mcp.rs` - rmcp streamable HTTP implementation
//! - `registry.rs` - `SessionRegistry`: register, list, recover, shut down
//! - `error.rs` - Session-specific error types

mod error;
mod mcp;
mod registry;
mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{SessionError, SessionResult};
pub use mcp::{McpConnector, McpSession};
pub use registry::{RecoveryReport, ServerRegistration, SessionRegistry};
pub use session::{Connector, ToolSession};
