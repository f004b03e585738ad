//! Scripted in-process sessions for tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rmcp::model::{JsonObject, Tool};
use serde_json::{Value, json};

use super::error::{SessionError, SessionResult};
use super::session::{Connector, ToolSession};

/// Connector handing out [`FakeSession`]s.
///
/// Clones share the sessions they created, so a test can keep a clone and
/// inspect what the registry did with them.
#[derive(Clone, Default)]
pub(crate) struct FakeConnector {
    unreachable: HashSet<String>,
    stalled: HashSet<String>,
    failing_discovery: bool,
    stalled_discovery: bool,
    fail_calls: HashSet<usize>,
    sessions: Arc<Mutex<HashMap<String, Arc<FakeSession>>>>,
}

impl FakeConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Connecting to `address` fails.
    pub(crate) fn with_unreachable(mut self, address: &str) -> Self {
        self.unreachable.insert(address.to_string());
        self
    }

    /// Connecting to `address` never completes, like a server that accepts
    /// the socket and then stays silent.
    pub(crate) fn with_stalled(mut self, address: &str) -> Self {
        self.stalled.insert(address.to_string());
        self
    }

    /// Every tool listing hangs.
    pub(crate) fn with_stalled_discovery(mut self) -> Self {
        self.stalled_discovery = true;
        self
    }

    /// Every tool listing fails.
    pub(crate) fn with_failing_discovery(mut self) -> Self {
        self.failing_discovery = true;
        self
    }

    /// The zero-based calls listed fail on every session.
    pub(crate) fn with_failing_calls(mut self, calls: &[usize]) -> Self {
        self.fail_calls.extend(calls.iter().copied());
        self
    }

    /// The most recent session opened to `address`.
    pub(crate) fn session(&self, address: &str) -> Option<Arc<FakeSession>> {
        self.sessions.lock().unwrap().get(address).cloned()
    }
}

#[async_trait::async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, address: &str) -> SessionResult<Arc<dyn ToolSession>> {
        if self.unreachable.contains(address) {
            return Err(SessionError::connection(address, "connection refused"));
        }
        if self.stalled.contains(address) {
            std::future::pending::<()>().await;
        }

        let session = Arc::new(FakeSession {
            address: address.to_string(),
            failing_discovery: self.failing_discovery,
            stalled_discovery: self.stalled_discovery,
            fail_calls: self.fail_calls.clone(),
            calls: AtomicUsize::new(0),
            discoveries: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            fail_next_close: AtomicBool::new(false),
        });
        self.sessions
            .lock()
            .unwrap()
            .insert(address.to_string(), session.clone());
        Ok(session)
    }
}

/// A session exposing a single `echo` tool.
pub(crate) struct FakeSession {
    address: String,
    failing_discovery: bool,
    stalled_discovery: bool,
    fail_calls: HashSet<usize>,
    calls: AtomicUsize,
    discoveries: AtomicUsize,
    closed: AtomicBool,
    fail_next_close: AtomicBool,
}

impl FakeSession {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn discoveries(&self) -> usize {
        self.discoveries.load(Ordering::SeqCst)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_next_close(&self) {
        self.fail_next_close.store(true, Ordering::SeqCst);
    }
}

fn echo_tool() -> Tool {
    Tool {
        name: "echo".into(),
        description: Some("Echo a message".into()),
        input_schema: Arc::new(JsonObject::new()),
        annotations: None,
        output_schema: None,
        icons: None,
        meta: None,
        title: None,
    }
}

#[async_trait::async_trait]
impl ToolSession for FakeSession {
    fn address(&self) -> &str {
        &self.address
    }

    async fn list_tools(&self) -> SessionResult<Vec<Tool>> {
        self.discoveries.fetch_add(1, Ordering::SeqCst);
        if self.stalled_discovery {
            std::future::pending::<()>().await;
        }
        if self.failing_discovery {
            return Err(SessionError::discovery("tools/list timed out"));
        }
        Ok(vec![echo_tool()])
    }

    async fn call_tool(&self, name: &str, arguments: &JsonObject) -> SessionResult<Value> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }

        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_calls.contains(&call) {
            return Err(SessionError::invocation(format!("scripted failure on call {call}")));
        }
        if name != "echo" {
            return Err(SessionError::invocation(format!("Unknown tool: {name}")));
        }

        let message = arguments
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        Ok(json!({
            "content": [{ "type": "text", "text": format!("Echo: {message}") }],
            "isError": false
        }))
    }

    async fn close(&self) -> SessionResult<()> {
        if self.fail_next_close.swap(false, Ordering::SeqCst) {
            return Err(SessionError::connection(&self.address, "transport already gone"));
        }
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
