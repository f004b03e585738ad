//! Configuration management for the experiment server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables (optionally via a `.env` file) or
//! defaults.

use super::transport::HttpConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Default ceiling on the number of iterations a single experiment may request.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// Default bound, in seconds, on connecting to and warming up one server.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default port of the experiment API.
pub const DEFAULT_HTTP_PORT: u16 = 8000;

/// Main configuration structure for the experiment server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// HTTP API configuration.
    pub http: HttpConfig,

    /// Durable storage configuration.
    pub storage: StorageConfig,

    /// Remote session configuration.
    pub sessions: SessionsConfig,

    /// Experiment runner configuration.
    pub experiments: ExperimentsConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Durable storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
}

/// Remote session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Seconds allowed for connecting to a server, and again for its warm-up.
    pub connect_timeout_secs: u64,
}

impl SessionsConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Experiment runner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentsConfig {
    /// Largest iteration count a single experiment may request.
    pub max_iterations: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data.db"),
        }
    }
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl Default for ExperimentsConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "mcp-experiment-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            http: HttpConfig::with_port(DEFAULT_HTTP_PORT),
            storage: StorageConfig::default(),
            sessions: SessionsConfig::default(),
            experiments: ExperimentsConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Server-level variables are prefixed with `MCP_` (`MCP_SERVER_NAME`,
    /// `MCP_LOG_LEVEL`, `MCP_HTTP_*`). Storage, the connect timeout and the
    /// iteration ceiling use `DB_PATH`, `CONNECT_TIMEOUT_SECS` and
    /// `MAX_EXPERIMENT_ITERATIONS`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.http = HttpConfig::from_env("MCP", DEFAULT_HTTP_PORT);

        if let Ok(path) = std::env::var("DB_PATH") {
            config.storage.db_path = PathBuf::from(path);
        }
        info!("Using database at {:?}", config.storage.db_path);

        if let Ok(raw) = std::env::var("CONNECT_TIMEOUT_SECS") {
            match parse_positive(&raw) {
                Some(secs) => config.sessions.connect_timeout_secs = secs,
                None => warn!(
                    "Ignoring CONNECT_TIMEOUT_SECS={:?}: expected a positive integer, keeping {}",
                    raw, config.sessions.connect_timeout_secs
                ),
            }
        }

        if let Ok(raw) = std::env::var("MAX_EXPERIMENT_ITERATIONS") {
            match parse_positive(&raw) {
                Some(max) => {
                    config.experiments.max_iterations = max;
                    info!("Experiment iteration ceiling set to {}", max);
                }
                None => warn!(
                    "Ignoring MAX_EXPERIMENT_ITERATIONS={:?}: expected a positive integer, \
                     keeping {}",
                    raw, config.experiments.max_iterations
                ),
            }
        }

        config
    }
}

/// Parse a strictly positive integer setting. Zero is rejected: a zero
/// ceiling admits no experiment and a zero timeout admits no connection.
fn parse_positive<T>(raw: &str) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + From<u8>,
{
    raw.trim().parse::<T>().ok().filter(|n| *n >= T::from(1))
}
