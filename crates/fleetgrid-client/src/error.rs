//! Client error types.

use fleet_core::QueryError;
use thiserror::Error;

/// Errors raised by [`crate::ClusterClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid service url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(#[from] fleet_core::ConfigError),

    #[error("no password configured for user {0}")]
    MissingPassword(String),

    #[error("tls setup failed: {0}")]
    Tls(String),

    #[error("failed to start client runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("http error: {0}")]
    Http(#[from] hyper::Error),

    #[error("failed to build request: {0}")]
    Request(#[from] http::Error),

    #[error("request to {0} timed out")]
    Timeout(String),

    /// The service answered with a non-2xx status. `body` is the raw
    /// response text, which carries the service's error message.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to read {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    /// Whether retrying the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Connect { .. } | ClientError::Http(_) | ClientError::Timeout(_) => true,
            ClientError::Status { status, .. } => {
                *status == 408 || *status == 429 || *status >= 500
            }
            _ => false,
        }
    }
}

impl From<ClientError> for QueryError {
    fn from(err: ClientError) -> Self {
        if err.is_transient() {
            QueryError::Transient(err.to_string())
        } else {
            QueryError::Fatal(err.to_string())
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
