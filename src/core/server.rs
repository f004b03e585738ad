//! Experiment server wiring and lifecycle.
//!
//! `ExperimentServer` owns the store, the session registry and the runner.
//! It is built once at startup, recovered from storage, shared with the HTTP
//! handlers and shut down when the process exits.

use std::sync::Arc;

use tracing::{info, instrument};

use super::config::Config;
use super::error::Result;
use super::store::SqliteStore;
use crate::domains::experiments::ExperimentRunner;
use crate::domains::sessions::{Connector, McpConnector, RecoveryReport, SessionRegistry};

/// Shared application state.
#[derive(Clone)]
pub struct ExperimentServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Registered servers and their sessions.
    registry: Arc<SessionRegistry>,

    /// Runs and fetches experiments.
    runner: Arc<ExperimentRunner>,
}

impl ExperimentServer {
    /// Wire the components around an existing store and connector.
    pub fn new(config: Config, store: SqliteStore, connector: Arc<dyn Connector>) -> Self {
        let config = Arc::new(config);
        let registry = Arc::new(
            SessionRegistry::new(connector, store.clone())
                .with_connect_timeout(config.sessions.connect_timeout()),
        );
        let runner = Arc::new(ExperimentRunner::new(
            registry.clone(),
            store,
            &config.experiments,
        ));

        Self {
            config,
            registry,
            runner,
        }
    }

    /// Open the configured database, connect with rmcp and recover every
    /// stored registration. Ready to serve when this returns.
    #[instrument(skip_all)]
    pub async fn start(config: Config) -> Result<Self> {
        let store = SqliteStore::open(&config.storage.db_path)?;
        let server = Self::new(config, store, Arc::new(McpConnector::new()));
        server.recover().await?;
        Ok(server)
    }

    /// Reconnect every stored registration.
    pub async fn recover(&self) -> Result<RecoveryReport> {
        Ok(self.registry.recover_all().await?)
    }

    /// Close every session.
    pub async fn shutdown(&self) {
        info!("Shutting down {}", self.name());
        self.registry.shutdown().await;
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the session registry.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Get the experiment runner.
    pub fn runner(&self) -> &Arc<ExperimentRunner> {
        &self.runner
    }
}
