//! Echo MCP server.
//!
//! Serves the single `echo` tool over streamable HTTP so experiments have a
//! predictable target. Listens on `ECHO_HTTP_HOST`:`ECHO_HTTP_PORT`
//! (default `127.0.0.1:8001`).

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use mcp_experiment_server::core::HttpConfig;
use mcp_experiment_server::core::transport::TransportError;
use mcp_experiment_server::domains::echo::EchoServer;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = HttpConfig::from_env("ECHO", 8001);
    let addr = config.address();
    info!("Starting echo server ({})", config.description());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| TransportError::bind(&addr, e))?;

    EchoServer::serve(listener).await?;

    Ok(())
}
