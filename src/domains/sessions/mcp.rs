//! rmcp client sessions over streamable HTTP.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rmcp::{
    ServiceExt,
    model::{CallToolRequestParam, CallToolResult, JsonObject, RawContent, Tool},
    service::{Peer, RoleClient, RunningService},
    transport::StreamableHttpClientTransport,
};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use super::error::{SessionError, SessionResult};
use super::session::{Connector, ToolSession};

/// Connects to MCP servers speaking streamable HTTP.
#[derive(Debug, Clone, Default)]
pub struct McpConnector;

impl McpConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Connector for McpConnector {
    #[instrument(skip(self))]
    async fn connect(&self, address: &str) -> SessionResult<Arc<dyn ToolSession>> {
        let transport = StreamableHttpClientTransport::from_uri(address.to_string());
        let service = ()
            .serve(transport)
            .await
            .map_err(|e| SessionError::connection(address, e.to_string()))?;

        info!("Connected to {}", address);

        Ok(Arc::new(McpSession::new(address, service)))
    }
}

/// One client session to an MCP server.
///
/// Requests go through a cloned [`Peer`], which multiplexes concurrent calls;
/// the running service is only kept around so it can be cancelled on close.
/// Once closed, every request fails with [`SessionError::Closed`].
pub struct McpSession {
    address: String,
    peer: Peer<RoleClient>,
    closed: AtomicBool,
    service: Mutex<Option<RunningService<RoleClient, ()>>>,
}

impl McpSession {
    fn ensure_open(&self) -> SessionResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SessionError::Closed);
        }
        Ok(())
    }

    fn new(address: &str, service: RunningService<RoleClient, ()>) -> Self {
        Self {
            address: address.to_string(),
            peer: service.peer().clone(),
            closed: AtomicBool::new(false),
            service: Mutex::new(Some(service)),
        }
    }
}

#[async_trait::async_trait]
impl ToolSession for McpSession {
    fn address(&self) -> &str {
        &self.address
    }

    async fn list_tools(&self) -> SessionResult<Vec<Tool>> {
        self.ensure_open()?;
        self.peer
            .list_all_tools()
            .await
            .map_err(|e| SessionError::discovery(e.to_string()))
    }

    async fn call_tool(&self, name: &str, arguments: &JsonObject) -> SessionResult<Value> {
        self.ensure_open()?;
        let params: CallToolRequestParam = serde_json::from_value(serde_json::json!({
            "name": name,
            "arguments": arguments,
        }))
        .map_err(|e| SessionError::invocation(e.to_string()))?;

        let result = self
            .peer
            .call_tool(params)
            .await
            .map_err(|e| SessionError::invocation(e.to_string()))?;

        if result.is_error.unwrap_or(false) {
            return Err(SessionError::invocation(error_text(&result)));
        }

        serde_json::to_value(&result).map_err(|e| SessionError::invocation(e.to_string()))
    }

    async fn close(&self) -> SessionResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        let Some(service) = self.service.lock().await.take() else {
            debug!("Session to {} already closed", self.address);
            return Ok(());
        };

        service
            .cancel()
            .await
            .map(|_| debug!("Session to {} closed", self.address))
            .map_err(|e| SessionError::connection(&self.address, e.to_string()))
    }
}

/// Collapse the text blocks of an error result into one message.
fn error_text(result: &CallToolResult) -> String {
    let text: Vec<&str> = result
        .content
        .iter()
        .filter_map(|content| match &content.raw {
            RawContent::Text(text) => Some(text.text.as_str()),
            _ => None,
        })
        .collect();

    if text.is_empty() {
        "tool returned an error result".to_string()
    } else {
        text.join("\n")
    }
}
