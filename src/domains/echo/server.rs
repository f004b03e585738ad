//! Echo MCP server.
//!
//! A minimal tool-providing server used as the remote end of experiments in
//! tests and local runs. It serves streamable HTTP through axum.

use rmcp::{
    ServerHandler,
    handler::server::tool::ToolRouter,
    model::*,
    tool_handler,
    transport::streamable_http_server::{
        StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
    },
};
use tokio::net::TcpListener;
use tracing::info;

use super::tool::EchoTool;
use crate::core::transport::{TransportError, TransportResult};

/// Path the MCP endpoint is mounted on.
pub const ECHO_MCP_PATH: &str = "/mcp";

/// Server handler exposing the echo tool.
#[derive(Clone)]
pub struct EchoServer {
    tool_router: ToolRouter<Self>,
}

impl Default for EchoServer {
    fn default() -> Self {
        Self::new()
    }
}

impl EchoServer {
    pub fn new() -> Self {
        Self {
            tool_router: ToolRouter::new().with_route(EchoTool::create_route()),
        }
    }

    /// An axum router with the MCP endpoint mounted at [`ECHO_MCP_PATH`].
    pub fn router() -> axum::Router {
        let service = StreamableHttpService::new(
            || Ok(EchoServer::new()),
            LocalSessionManager::default().into(),
            StreamableHttpServerConfig::default(),
        );
        axum::Router::new().nest_service(ECHO_MCP_PATH, service)
    }

    /// Serve on an already bound listener until the task is dropped.
    pub async fn serve(listener: TcpListener) -> TransportResult<()> {
        let addr = listener.local_addr()?;
        info!("Echo server ready - MCP endpoint http://{}{}", addr, ECHO_MCP_PATH);

        axum::serve(listener, Self::router())
            .await
            .map_err(|e| TransportError::serve(e.to_string()))
    }
}

#[tool_handler]
impl ServerHandler for EchoServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("Test server with a single `echo` tool.".to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
