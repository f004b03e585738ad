//! Experiment Runner - sequential timed tool calls and their persisted record.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::error::{ExperimentError, ExperimentResult};
use super::iteration::{mean, measure};
use super::model::{
    ExperimentOutcome, ExperimentRecord, ExperimentRequest, ExperimentSummary, IterationRejection,
};
use crate::core::config::ExperimentsConfig;
use crate::core::store::SqliteStore;
use crate::domains::sessions::SessionRegistry;

/// Default page size for [`ExperimentRunner::list`].
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Runs experiments against registered servers and stores the results.
pub struct ExperimentRunner {
    registry: Arc<SessionRegistry>,
    store: SqliteStore,
    max_iterations: u32,
}

impl ExperimentRunner {
    pub fn new(registry: Arc<SessionRegistry>, store: SqliteStore, config: &ExperimentsConfig) -> Self {
        Self {
            registry,
            store,
            max_iterations: config.max_iterations,
        }
    }

    /// Largest iteration count accepted.
    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Check a requested iteration count against `1..=max_iterations`.
    pub fn validate(&self, iterations: i64) -> Result<u32, IterationRejection> {
        u32::try_from(iterations)
            .ok()
            .filter(|n| (1..=self.max_iterations).contains(n))
            .ok_or_else(|| IterationRejection::new(iterations, self.max_iterations))
    }

    /// Run one experiment.
    ///
    /// Calls are made strictly one after another. A failed call is recorded
    /// and counted; it never stops the run. The record is persisted before it
    /// is returned, and a failed write fails the whole request.
    #[instrument(
        skip(self, request),
        fields(server_id = %request.server_id, tool = %request.tool, iterations = request.iterations)
    )]
    pub async fn run(&self, request: ExperimentRequest) -> ExperimentResult<ExperimentOutcome> {
        let iterations = match self.validate(request.iterations) {
            Ok(n) => n,
            Err(rejection) => {
                warn!("Rejected experiment: {}", rejection.error);
                return Ok(ExperimentOutcome::Rejected(rejection));
            }
        };

        let session = self
            .registry
            .session(&request.server_id)
            .await
            .ok_or_else(|| ExperimentError::server_not_found(&request.server_id))?;

        let capacity = iterations as usize;
        let mut durations_ms = Vec::with_capacity(capacity);
        let mut responses = Vec::with_capacity(capacity);
        let mut error_count = 0u32;

        for i in 0..iterations {
            let sample = measure(session.as_ref(), &request.tool, &request.arguments).await;
            debug!(
                iteration = i,
                duration_ms = sample.duration_ms,
                error = sample.is_error(),
                "Call finished"
            );

            if sample.is_error() {
                error_count += 1;
            }
            durations_ms.push(sample.duration_ms);
            responses.push(sample.into_response());
        }

        let avg_duration_ms = mean(&durations_ms)
            .ok_or_else(|| ExperimentError::internal("experiment produced no durations"))?;

        let record = ExperimentRecord {
            id: Uuid::new_v4().to_string(),
            server_id: request.server_id,
            tool: request.tool,
            arguments: request.arguments,
            iterations,
            durations_ms,
            responses,
            error_count,
            avg_duration_ms,
            created_at: Utc::now(),
        };

        self.store.insert_experiment(&record).await?;

        info!(
            "Experiment {} finished: {} ok, {} failed, avg {:.3} ms",
            record.id,
            record.success_count(),
            record.error_count,
            record.avg_duration_ms
        );
        Ok(ExperimentOutcome::Completed(record))
    }

    /// Load a stored experiment.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> ExperimentResult<ExperimentRecord> {
        self.store
            .get_experiment(id)
            .await?
            .ok_or_else(|| ExperimentError::not_found(id))
    }

    /// Most recent experiments first.
    pub async fn list(&self, limit: usize) -> ExperimentResult<Vec<ExperimentSummary>> {
        Ok(self.store.list_experiments(limit).await?)
    }
}
