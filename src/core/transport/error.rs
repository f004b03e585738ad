//! Errors raised while binding or serving the HTTP listeners.

use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Failures of the experiment API or echo server listener.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The configured host and port could not be bound.
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The listener's local address could not be read.
    #[error("Listener error: {0}")]
    Listener(#[from] std::io::Error),

    /// axum stopped serving with an error.
    #[error("Server stopped: {0}")]
    Serve(String),
}

impl TransportError {
    pub fn bind(address: impl Into<String>, source: std::io::Error) -> Self {
        Self::Bind {
            address: address.into(),
            source,
        }
    }

    pub fn serve(msg: impl Into<String>) -> Self {
        Self::Serve(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_names_address() {
        let err = TransportError::bind(
            "127.0.0.1:8000",
            std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use"),
        );
        assert_eq!(err.to_string(), "Failed to bind to 127.0.0.1:8000: address in use");
    }
}
