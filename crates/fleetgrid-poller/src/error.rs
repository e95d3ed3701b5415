//! Poller and termination error types.

use fleet_core::{FleetScope, NodeId, QueryError};
use thiserror::Error;

/// Errors that end a poll without the fleet settling.
#[derive(Debug, Error)]
pub enum PollError {
    /// At least one node reached a terminal failure status.
    #[error("nodes failed in {scope}: {}", .node_ids.join(", "))]
    FleetFailure {
        scope: FleetScope,
        node_ids: Vec<NodeId>,
    },

    /// The attempt budget ran out while nodes were still in progress.
    #[error("timed out waiting for {scope} after {attempts} attempts{}", last_error_suffix(.last_error))]
    Timeout {
        scope: FleetScope,
        attempts: u32,
        /// Message of the most recent transient query failure, if any.
        last_error: Option<String>,
    },

    /// The status query failed in a way retrying cannot fix.
    #[error(transparent)]
    Query(QueryError),
}

fn last_error_suffix(last_error: &Option<String>) -> String {
    match last_error {
        Some(e) => format!(" (last error: {e})"),
        None => String::new(),
    }
}

impl PollError {
    /// Node ids that failed, when this is a fleet failure.
    pub fn failed_nodes(&self) -> Option<&[NodeId]> {
        match self {
            PollError::FleetFailure { node_ids, .. } => Some(node_ids),
            _ => None,
        }
    }
}

pub type PollResult<T> = Result<T, PollError>;

/// A terminate request was rejected for a reason other than "nothing matched".
#[derive(Debug, Error)]
pub enum TerminationError {
    #[error("terminate request for cluster {cluster} failed: {message}")]
    Rejected { cluster: String, message: String },
}
