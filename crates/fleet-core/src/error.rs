//! Error types shared across fleetgrid crates.

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid duration '{0}' (expected e.g. \"500ms\", \"10s\", \"2m\")")]
    Duration(String),

    #[error("max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("missing required setting: {0}")]
    Missing(&'static str),
}

/// Failure of a single fleet status query.
///
/// The poller retries `Transient` failures within its attempt budget and
/// aborts immediately on `Fatal` ones.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Recoverable network or service error.
    #[error("transient query error: {0}")]
    Transient(String),

    /// Unrecoverable error, e.g. the cluster does not exist.
    #[error("fatal query error: {0}")]
    Fatal(String),
}

impl QueryError {
    pub fn is_transient(&self) -> bool {
        matches!(self, QueryError::Transient(_))
    }
}
