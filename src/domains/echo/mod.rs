//! Echo domain module.
//!
//! A self-contained MCP server with one `echo` tool. It is the remote fixture
//! for end-to-end experiment tests and backs the `echo-server` binary.

mod server;
mod tool;

pub use server::{ECHO_MCP_PATH, EchoServer};
pub use tool::{EchoParams, EchoTool};
