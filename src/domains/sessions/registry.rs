//! Session Registry - owns registered addresses and their live sessions.
//!
//! The registry is the only writer of the id -> address and id -> session
//! maps. Experiments borrow a session by id for the length of one run.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use rmcp::model::Tool;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::error::{SessionError, SessionResult};
use super::session::{Connector, ToolSession};
use crate::core::config::DEFAULT_CONNECT_TIMEOUT_SECS;
use crate::core::store::SqliteStore;

/// A durable binding of an id to a remote address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerRegistration {
    /// Opaque identifier generated at registration time.
    pub id: String,

    /// Connection target supplied by the caller.
    pub address: String,

    /// When the registration was created.
    pub created_at: DateTime<Utc>,
}

/// Outcome of a startup recovery pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecoveryReport {
    /// Registrations whose session was re-established.
    pub recovered: usize,

    /// Ids of registrations that could not be reconnected.
    pub failed: Vec<String>,
}

#[derive(Default)]
struct RegistryState {
    addresses: BTreeMap<String, String>,
    sessions: HashMap<String, Arc<dyn ToolSession>>,
}

/// Registry of remote servers and their warmed sessions.
pub struct SessionRegistry {
    connector: Arc<dyn Connector>,
    store: SqliteStore,
    connect_timeout: Duration,
    state: RwLock<RegistryState>,
}

impl SessionRegistry {
    /// Create an empty registry. Call [`recover_all`](Self::recover_all)
    /// before serving requests to reload stored registrations.
    pub fn new(connector: Arc<dyn Connector>, store: SqliteStore) -> Self {
        Self {
            connector,
            store,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Bound connecting to one server, and separately its warm-up.
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Register a new server address.
    ///
    /// Connects, warms the session up, persists the registration and only
    /// then makes it visible. A failed connect or write leaves nothing behind.
    #[instrument(skip(self))]
    pub async fn register(&self, address: &str) -> SessionResult<ServerRegistration> {
        let address = address.trim();
        if address.is_empty() {
            return Err(SessionError::invalid_address("address must not be empty"));
        }

        let session = self.open_session(address).await?;

        let registration = ServerRegistration {
            id: Uuid::new_v4().to_string(),
            address: address.to_string(),
            created_at: Utc::now(),
        };

        if let Err(e) = self.store.insert_server(&registration).await {
            if let Err(close_err) = session.close().await {
                warn!("Failed to close unsaved session to {}: {}", address, close_err);
            }
            return Err(e.into());
        }

        let mut state = self.state.write().await;
        state
            .addresses
            .insert(registration.id.clone(), registration.address.clone());
        state.sessions.insert(registration.id.clone(), session);

        info!("Registered server {} at {}", registration.id, registration.address);
        Ok(registration)
    }

    /// All known registrations, id -> address.
    pub async fn list_registrations(&self) -> BTreeMap<String, String> {
        self.state.read().await.addresses.clone()
    }

    /// Borrow the live session for `id`.
    pub async fn session(&self, id: &str) -> Option<Arc<dyn ToolSession>> {
        self.state.read().await.sessions.get(id).cloned()
    }

    /// Ask the server registered under `id` for its tools.
    #[instrument(skip(self))]
    pub async fn list_tools(&self, id: &str) -> SessionResult<Vec<Tool>> {
        let session = self
            .session(id)
            .await
            .ok_or_else(|| SessionError::not_found(id))?;
        session.list_tools().await
    }

    /// Rebuild sessions for every stored registration.
    ///
    /// Rows are reconnected independently; a row that fails is logged and
    /// reported, and does not stop the others.
    #[instrument(skip(self))]
    pub async fn recover_all(&self) -> SessionResult<RecoveryReport> {
        let registrations = self.store.list_servers().await?;
        info!("Recovering {} registered server(s)", registrations.len());

        let attempts = registrations.into_iter().map(|registration| async move {
            let result = self.open_session(&registration.address).await;
            (registration, result)
        });
        let results = join_all(attempts).await;

        let mut report = RecoveryReport::default();
        let mut replaced = Vec::new();
        let mut state = self.state.write().await;
        for (registration, result) in results {
            match result {
                Ok(session) => {
                    state
                        .addresses
                        .insert(registration.id.clone(), registration.address.clone());
                    if let Some(stale) = state.sessions.insert(registration.id.clone(), session) {
                        replaced.push((registration.id, stale));
                    }
                    report.recovered += 1;
                }
                Err(e) => {
                    warn!(
                        "Could not recover server {} at {}: {}",
                        registration.id, registration.address, e
                    );
                    report.failed.push(registration.id);
                }
            }
        }
        drop(state);

        for (id, stale) in replaced {
            if let Err(e) = stale.close().await {
                debug!("Failed to close replaced session {}: {}", id, e);
            }
        }

        info!(
            "Recovery finished: {} recovered, {} failed",
            report.recovered,
            report.failed.len()
        );
        Ok(report)
    }

    /// Close every live session. Close failures are logged, never raised.
    pub async fn shutdown(&self) {
        let state = std::mem::take(&mut *self.state.write().await);
        info!("Closing {} session(s)", state.sessions.len());

        for (id, session) in state.sessions {
            if let Err(e) = session.close().await {
                warn!("Error closing session {} ({}): {}", id, session.address(), e);
            }
        }
    }

    /// Connect to `address` and warm the session up, each step bounded by
    /// the connect timeout. Only a failed or stalled connect is an error.
    async fn open_session(&self, address: &str) -> SessionResult<Arc<dyn ToolSession>> {
        let session = timeout(self.connect_timeout, self.connector.connect(address))
            .await
            .map_err(|_| {
                SessionError::connection(
                    address,
                    format!("no response within {:?}", self.connect_timeout),
                )
            })??;

        warm_up(session.as_ref(), self.connect_timeout).await;
        Ok(session)
    }
}

/// Best-effort tool discovery right after connecting, so the first real call
/// does not pay for it. Returns the number of tools seen, if any.
async fn warm_up(session: &dyn ToolSession, limit: Duration) -> Option<usize> {
    match timeout(limit, session.list_tools()).await {
        Ok(Ok(tools)) => {
            debug!("Warm-up discovered {} tool(s) at {}", tools.len(), session.address());
            Some(tools.len())
        }
        Ok(Err(e)) => {
            warn!("Warm-up discovery failed for {}: {}", session.address(), e);
            None
        }
        Err(_) => {
            warn!("Warm-up discovery timed out for {} after {:?}", session.address(), limit);
            None
        }
    }
}
