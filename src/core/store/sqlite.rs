//! SQLite-backed store.
//!
//! Two insert-only tables: `servers` holds registrations and `experiments`
//! holds completed runs. Arguments, durations and responses are JSON text
//! columns; timestamps are RFC 3339 with nanosecond precision so that a
//! record read back compares equal to the one written.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use super::error::{StoreError, StoreResult};
use crate::domains::experiments::{ExperimentRecord, ExperimentSummary};
use crate::domains::sessions::ServerRegistration;

/// Schema version written to `store_meta`.
const SCHEMA_VERSION: i64 = 1;

/// Durable store for registrations and experiment records.
///
/// Cloning is cheap; clones share one connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

/// Raw experiment columns, decoded outside the SQLite callback.
struct ExperimentRow {
    id: String,
    server_id: String,
    tool: String,
    arguments: String,
    iterations: u32,
    avg_duration_ms: f64,
    error_count: u32,
    durations_ms: String,
    responses: String,
    created_at: String,
}

impl SqliteStore {
    /// Open (creating if needed) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        info!("Opening SQLite store at {:?}", path);
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = wal; PRAGMA synchronous = full;")?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> StoreResult<Self> {
        initialize_schema(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    /// Persist a new registration.
    pub async fn insert_server(&self, registration: &ServerRegistration) -> StoreResult<()> {
        let registration = registration.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO servers (id, address, created_at) VALUES (?1, ?2, ?3)",
                params![
                    registration.id,
                    registration.address,
                    encode_timestamp(&registration.created_at)
                ],
            )?;
            debug!("Stored server {}", registration.id);
            Ok(())
        })
        .await
    }

    /// Scan every stored registration, oldest first.
    pub async fn list_servers(&self) -> StoreResult<Vec<ServerRegistration>> {
        let rows = self
            .with_conn(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, address, created_at FROM servers ORDER BY created_at, rowid",
                )?;
                let rows = stmt
                    .query_map(params![], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        rows.into_iter()
            .map(|(id, address, created_at)| {
                let created_at = decode_timestamp(&id, &created_at)?;
                Ok(ServerRegistration {
                    id,
                    address,
                    created_at,
                })
            })
            .collect()
    }

    /// Persist a completed experiment as a single row.
    pub async fn insert_experiment(&self, record: &ExperimentRecord) -> StoreResult<()> {
        let row = ExperimentRow {
            id: record.id.clone(),
            server_id: record.server_id.clone(),
            tool: record.tool.clone(),
            arguments: serde_json::to_string(&record.arguments)?,
            iterations: record.iterations,
            avg_duration_ms: record.avg_duration_ms,
            error_count: record.error_count,
            durations_ms: serde_json::to_string(&record.durations_ms)?,
            responses: serde_json::to_string(&record.responses)?,
            created_at: encode_timestamp(&record.created_at),
        };

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO experiments (
                    id, server_id, tool, arguments, iterations, avg_duration_ms,
                    error_count, durations_ms, responses, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    row.id,
                    row.server_id,
                    row.tool,
                    row.arguments,
                    row.iterations,
                    row.avg_duration_ms,
                    row.error_count,
                    row.durations_ms,
                    row.responses,
                    row.created_at,
                ],
            )?;
            debug!("Stored experiment {}", row.id);
            Ok(())
        })
        .await
    }

    /// Load one experiment by id.
    pub async fn get_experiment(&self, id: &str) -> StoreResult<Option<ExperimentRecord>> {
        let id = id.to_string();
        let row = self
            .with_conn(move |conn| {
                let row = conn
                    .query_row(
                        "SELECT id, server_id, tool, arguments, iterations, avg_duration_ms,
                                error_count, durations_ms, responses, created_at
                         FROM experiments WHERE id = ?1",
                        params![id],
                        |row| {
                            Ok(ExperimentRow {
                                id: row.get(0)?,
                                server_id: row.get(1)?,
                                tool: row.get(2)?,
                                arguments: row.get(3)?,
                                iterations: row.get(4)?,
                                avg_duration_ms: row.get(5)?,
                                error_count: row.get(6)?,
                                durations_ms: row.get(7)?,
                                responses: row.get(8)?,
                                created_at: row.get(9)?,
                            })
                        },
                    )
                    .optional()?;
                Ok(row)
            })
            .await?;

        row.map(decode_experiment).transpose()
    }

    /// Most recent experiments first, at most `limit` of them.
    pub async fn list_experiments(&self, limit: usize) -> StoreResult<Vec<ExperimentSummary>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = self
            .with_conn(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, server_id, tool, iterations, avg_duration_ms, error_count, created_at
                     FROM experiments ORDER BY created_at DESC, rowid DESC LIMIT ?1",
                )?;
                let rows = stmt
                    .query_map(params![limit], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, u32>(3)?,
                            row.get::<_, f64>(4)?,
                            row.get::<_, u32>(5)?,
                            row.get::<_, String>(6)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        rows.into_iter()
            .map(
                |(id, server_id, tool, iterations, avg_duration_ms, error_count, created_at)| {
                    let created_at = decode_timestamp(&id, &created_at)?;
                    Ok(ExperimentSummary {
                        id,
                        server_id,
                        tool,
                        iterations,
                        error_count,
                        avg_duration_ms,
                        created_at,
                    })
                },
            )
            .collect()
    }

    /// Number of stored experiments.
    #[cfg(test)]
    pub(crate) async fn count_experiments(&self) -> StoreResult<u64> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM experiments", params![], |row| row.get(0))?;
            Ok(u64::try_from(count).unwrap_or_default())
        })
        .await
    }

    /// Drop the experiments table so that the next insert fails.
    #[cfg(test)]
    pub(crate) async fn break_experiments_table(&self) {
        self.with_conn(|conn| {
            conn.execute_batch("DROP TABLE experiments;")?;
            Ok(())
        })
        .await
        .unwrap();
    }
}

fn initialize_schema(conn: &mut Connection) -> StoreResult<()> {
    let tx = conn.transaction()?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()?;

    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS servers (
                    id TEXT PRIMARY KEY,
                    address TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS experiments (
                    id TEXT PRIMARY KEY,
                    server_id TEXT NOT NULL,
                    tool TEXT NOT NULL,
                    arguments TEXT NOT NULL,
                    iterations INTEGER NOT NULL,
                    avg_duration_ms REAL NOT NULL,
                    error_count INTEGER NOT NULL,
                    durations_ms TEXT NOT NULL,
                    responses TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_experiments_created_at
                    ON experiments (created_at);",
            )?;
        }
        Some(SCHEMA_VERSION) => {}
        Some(other) => {
            return Err(StoreError::corrupt(
                "store_meta",
                format!("unsupported schema version {other}"),
            ));
        }
    }

    tx.commit()?;
    Ok(())
}

fn encode_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn decode_timestamp(id: &str, raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| StoreError::corrupt(id, format!("bad timestamp {raw:?}: {e}")))
}

fn decode_experiment(row: ExperimentRow) -> StoreResult<ExperimentRecord> {
    let created_at = decode_timestamp(&row.id, &row.created_at)?;
    Ok(ExperimentRecord {
        arguments: serde_json::from_str(&row.arguments)?,
        durations_ms: serde_json::from_str(&row.durations_ms)?,
        responses: serde_json::from_str(&row.responses)?,
        id: row.id,
        server_id: row.server_id,
        tool: row.tool,
        iterations: row.iterations,
        avg_duration_ms: row.avg_duration_ms,
        error_count: row.error_count,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_record(id: &str, created_at: DateTime<Utc>) -> ExperimentRecord {
        ExperimentRecord {
            id: id.to_string(),
            server_id: "server-1".to_string(),
            tool: "echo".to_string(),
            arguments: json!({ "message": "hello", "nested": { "n": 3 } })
                .as_object()
                .cloned()
                .unwrap(),
            iterations: 3,
            durations_ms: vec![1.25, 0.1 + 0.2, 17.000_001],
            responses: vec![
                json!({ "content": [{ "type": "text", "text": "Echo: hello" }] }),
                json!({ "error": "boom" }),
                json!({ "content": [] }),
            ],
            error_count: 1,
            avg_duration_ms: (1.25 + (0.1 + 0.2) + 17.000_001) / 3.0,
            created_at,
        }
    }

    #[tokio::test]
    async fn test_experiment_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let record = sample_record("exp-1", Utc::now());

        store.insert_experiment(&record).await.unwrap();
        let loaded = store.get_experiment("exp-1").await.unwrap().unwrap();

        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn test_missing_experiment() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.get_experiment("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_experiment_id_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        let record = sample_record("exp-1", Utc::now());
        store.insert_experiment(&record).await.unwrap();

        let result = store.insert_experiment(&record).await;
        assert!(matches!(result, Err(StoreError::Db(_))));
        assert_eq!(store.count_experiments().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_experiments_newest_first() {
        let store = SqliteStore::open_in_memory().unwrap();
        let base = Utc::now();
        for (i, id) in ["a", "b", "c"].iter().enumerate() {
            let at = base + chrono::Duration::seconds(i as i64);
            store.insert_experiment(&sample_record(id, at)).await.unwrap();
        }

        let summaries = store.list_experiments(2).await.unwrap();
        let ids: Vec<_> = summaries.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
        assert_eq!(summaries[0].error_count, 1);
        assert_eq!(summaries[0].iterations, 3);
    }

    #[tokio::test]
    async fn test_servers_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("servers.db");

        let registration = ServerRegistration {
            id: "srv-1".to_string(),
            address: "http://127.0.0.1:8001/mcp".to_string(),
            created_at: Utc::now(),
        };

        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert_server(&registration).await.unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        let servers = reopened.list_servers().await.unwrap();
        assert_eq!(servers, vec![registration]);
    }

    #[tokio::test]
    async fn test_insert_fails_without_table() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.break_experiments_table().await;

        let result = store.insert_experiment(&sample_record("x", Utc::now())).await;
        assert!(result.is_err());
    }
}
