//! Session abstractions.
//!
//! The registry and the experiment runner only see these traits. The rmcp
//! client in `mcp.rs` is the production implementation.

use std::sync::Arc;

use rmcp::model::{JsonObject, Tool};
use serde_json::Value;

use super::error::SessionResult;

/// A live, stateful connection to one registered address.
///
/// Implementations must tolerate interleaved calls from concurrent
/// experiments sharing the same handle.
#[async_trait::async_trait]
pub trait ToolSession: Send + Sync {
    /// The address this session is connected to.
    fn address(&self) -> &str;

    /// Ask the remote server for its declared tools.
    async fn list_tools(&self) -> SessionResult<Vec<Tool>>;

    /// Call a tool and return its result as JSON.
    ///
    /// Transport failures and results flagged as errors both come back as
    /// `Err`.
    async fn call_tool(&self, name: &str, arguments: &JsonObject) -> SessionResult<Value>;

    /// Close the session. Closing twice is not an error.
    async fn close(&self) -> SessionResult<()>;
}

/// Opens sessions to addresses.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    /// Connect to `address` and complete the protocol handshake.
    async fn connect(&self, address: &str) -> SessionResult<Arc<dyn ToolSession>>;
}
