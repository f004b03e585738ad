//! Timing of a single tool call.

use std::time::Instant;

use rmcp::model::JsonObject;
use serde_json::{Value, json};

use crate::domains::sessions::ToolSession;

/// One measured call: its outcome and how long it took.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationSample {
    /// Serialized success payload, or the failure message.
    pub outcome: Result<Value, String>,
    pub duration_ms: f64,
}

impl IterationSample {
    pub fn is_error(&self) -> bool {
        self.outcome.is_err()
    }

    /// The value stored in the record's `responses`.
    pub fn into_response(self) -> Value {
        match self.outcome {
            Ok(value) => value,
            Err(message) => json!({ "error": message }),
        }
    }
}

/// Call `tool` once and time it. The clock covers the failure path too.
pub async fn measure(session: &dyn ToolSession, tool: &str, arguments: &JsonObject) -> IterationSample {
    let start = Instant::now();
    let outcome = session
        .call_tool(tool, arguments)
        .await
        .map_err(|e| e.to_string());
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

    IterationSample {
        outcome,
        duration_ms,
    }
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
