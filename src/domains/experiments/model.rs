//! Experiment request, record and rejection types.

use chrono::{DateTime, Utc};
use rmcp::model::JsonObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A request to run one experiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentRequest {
    /// Registration id of the server to call.
    pub server_id: String,

    /// Name of the tool to invoke.
    pub tool: String,

    /// Arguments passed unchanged to every call.
    #[serde(default)]
    pub arguments: JsonObject,

    /// Requested number of calls. Signed so that out-of-range values reach
    /// validation instead of failing deserialization.
    pub iterations: i64,
}

/// A completed, persisted experiment.
///
/// `durations_ms[i]` and `responses[i]` always describe the same call, and
/// both have exactly `iterations` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    pub id: String,
    pub server_id: String,
    pub tool: String,
    pub arguments: JsonObject,
    pub iterations: u32,
    /// Wall-clock duration of each call, in call order.
    pub durations_ms: Vec<f64>,
    /// The serialized result of each call, or `{"error": message}`.
    pub responses: Vec<Value>,
    pub error_count: u32,
    pub avg_duration_ms: f64,
    /// When the run finished.
    pub created_at: DateTime<Utc>,
}

impl ExperimentRecord {
    /// Number of calls that succeeded.
    pub fn success_count(&self) -> u32 {
        self.iterations - self.error_count
    }
}

/// Listing view of an experiment, without per-call data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSummary {
    pub id: String,
    pub server_id: String,
    pub tool: String,
    pub iterations: u32,
    pub error_count: u32,
    pub avg_duration_ms: f64,
    pub created_at: DateTime<Utc>,
}

impl From<&ExperimentRecord> for ExperimentSummary {
    fn from(record: &ExperimentRecord) -> Self {
        Self {
            id: record.id.clone(),
            server_id: record.server_id.clone(),
            tool: record.tool.clone(),
            iterations: record.iterations,
            error_count: record.error_count,
            avg_duration_ms: record.avg_duration_ms,
            created_at: record.created_at,
        }
    }
}

/// Why an experiment request was refused before running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRejection {
    /// Human-readable description of the allowed range.
    pub error: String,
    pub min: u32,
    pub max: u32,
    pub requested: i64,
}

impl IterationRejection {
    pub fn new(requested: i64, max: u32) -> Self {
        Self {
            error: format!("iterations must be between 1 and {max}, got {requested}"),
            min: 1,
            max,
            requested,
        }
    }
}

/// Result of an experiment request that reached the runner.
#[derive(Debug, Clone, PartialEq)]
pub enum ExperimentOutcome {
    /// The experiment ran and was persisted.
    Completed(ExperimentRecord),
    /// The request was refused; nothing ran and nothing was stored.
    Rejected(IterationRejection),
}

impl ExperimentOutcome {
    /// The record, if the experiment ran.
    pub fn record(&self) -> Option<&ExperimentRecord> {
        match self {
            Self::Completed(record) => Some(record),
            Self::Rejected(_) => None,
        }
    }
}
