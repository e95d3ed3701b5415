//! Node termination requests.
//!
//! Terminating by node id is the supported path. Hostnames are only
//! accepted through [`terminate_hostnames`], which always warns: the cloud
//! can hand a released hostname to a brand new node, and a terminate by
//! hostname would then take that node down instead.

use tracing::{debug, info, warn};

use fleet_core::{NodeId, NodeTerminator, TerminationResponse};

use crate::error::TerminationError;

/// Error text the service returns when no node matched the request.
pub const NO_MATCHING_INSTANCES: &str = "No instances were found matching your query";

/// Result of a termination request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationOutcome {
    /// Nothing to do: the set was empty or nothing matched remotely.
    NoOp,
    /// The service accepted the request.
    Submitted(TerminationResponse),
}

impl TerminationOutcome {
    pub fn is_noop(&self) -> bool {
        matches!(self, TerminationOutcome::NoOp)
    }

    pub fn response(&self) -> Option<&TerminationResponse> {
        match self {
            TerminationOutcome::Submitted(resp) => Some(resp),
            TerminationOutcome::NoOp => None,
        }
    }
}

/// Terminate nodes by id.
///
/// An empty set never reaches the service. Repeated ids are sent once.
pub fn terminate_nodes<T>(
    terminator: &T,
    cluster: &str,
    ids: &[NodeId],
) -> Result<TerminationOutcome, TerminationError>
where
    T: NodeTerminator + ?Sized,
{
    let ids = dedup(ids);
    if ids.is_empty() {
        debug!(%cluster, "no node ids to terminate");
        return Ok(TerminationOutcome::NoOp);
    }

    warn!(%cluster, ids = ?ids, "terminating nodes by id");
    let result = terminator.terminate_ids(cluster, &ids);
    settle(cluster, result)
}

/// Terminate nodes by hostname. Prefer [`terminate_nodes`].
pub fn terminate_hostnames<T>(
    terminator: &T,
    cluster: &str,
    hostnames: &[String],
) -> Result<TerminationOutcome, TerminationError>
where
    T: NodeTerminator + ?Sized,
{
    let hostnames = dedup(hostnames);
    if hostnames.is_empty() {
        debug!(%cluster, "no hostnames to terminate");
        return Ok(TerminationOutcome::NoOp);
    }

    warn!(
        %cluster,
        hostnames = ?hostnames,
        "terminating nodes by hostname; hostnames may be reused and hit the wrong node"
    );
    let result = terminator.terminate_hostnames(cluster, &hostnames);
    settle(cluster, result)
}

fn settle<E: std::fmt::Display>(
    cluster: &str,
    result: Result<TerminationResponse, E>,
) -> Result<TerminationOutcome, TerminationError> {
    match result {
        Ok(resp) => {
            info!(
                %cluster,
                operation = resp.operation_id().unwrap_or("-"),
                nodes = resp.nodes.len(),
                "terminate request accepted"
            );
            Ok(TerminationOutcome::Submitted(resp))
        }
        Err(e) => {
            let message = e.to_string();
            if message.contains(NO_MATCHING_INSTANCES) {
                info!(%cluster, "no matching instances to terminate");
                Ok(TerminationOutcome::NoOp)
            } else {
                Err(TerminationError::Rejected {
                    cluster: cluster.to_string(),
                    message,
                })
            }
        }
    }
}

fn dedup(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for v in values {
        if !out.contains(v) {
            out.push(v.clone());
        }
    }
    out
}
