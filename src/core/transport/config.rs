//! HTTP transport configuration.

use serde::{Deserialize, Serialize};

/// HTTP listener configuration.
///
/// Shared by the experiment API and the echo test server; each reads its own
/// environment prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Enable CORS for browser clients.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_cors() -> bool {
    true
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::with_port(8000)
    }
}

impl HttpConfig {
    /// Create a config for the given port with default host and CORS.
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            host: default_host(),
            enable_cors: default_cors(),
        }
    }

    /// Load the config from `{PREFIX}_HTTP_HOST`, `{PREFIX}_HTTP_PORT` and
    /// `{PREFIX}_HTTP_CORS`.
    pub fn from_env(prefix: &str, default_port: u16) -> Self {
        let port = std::env::var(format!("{prefix}_HTTP_PORT"))
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(default_port);
        let host = std::env::var(format!("{prefix}_HTTP_HOST")).unwrap_or_else(|_| default_host());
        let enable_cors = std::env::var(format!("{prefix}_HTTP_CORS"))
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true);

        Self {
            port,
            host,
            enable_cors,
        }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get a description of this listener for logging.
    pub fn description(&self) -> String {
        format!("HTTP on {}", self.address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_port() {
        let config = HttpConfig::with_port(8001);
        assert_eq!(config.address(), "127.0.0.1:8001");
        assert!(config.enable_cors);
    }

    #[test]
    fn test_from_env_uses_prefix() {
        unsafe {
            std::env::set_var("CFGTEST_HTTP_PORT", "9123");
            std::env::set_var("CFGTEST_HTTP_CORS", "false");
        }
        let config = HttpConfig::from_env("CFGTEST", 1);
        assert_eq!(config.port, 9123);
        assert!(!config.enable_cors);
        unsafe {
            std::env::remove_var("CFGTEST_HTTP_PORT");
            std::env::remove_var("CFGTEST_HTTP_CORS");
        }
    }

    #[test]
    fn test_from_env_falls_back_to_default_port() {
        let config = HttpConfig::from_env("CFGTEST_UNSET", 4321);
        assert_eq!(config.port, 4321);
        assert_eq!(config.host, "127.0.0.1");
    }
}
