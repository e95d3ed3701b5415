//! Collaborator boundaries.
//!
//! The poller and the termination helper only ever see these traits. The
//! REST client in `fleetgrid-client` implements them; tests use closures
//! and in-memory fakes.

use std::fmt::Display;

use crate::error::QueryError;
use crate::types::{Fleet, NodeId, TerminationResponse};

/// Fetches a fresh fleet snapshot.
pub trait FleetQuery {
    fn query(&mut self) -> Result<Fleet, QueryError>;
}

impl<F> FleetQuery for F
where
    F: FnMut() -> Result<Fleet, QueryError>,
{
    fn query(&mut self) -> Result<Fleet, QueryError> {
        self()
    }
}

/// Issues raw terminate requests against the cluster service.
///
/// Implementations send exactly what they are given; empty-set handling and
/// "no matching instances" tolerance live in `fleetgrid_poller::terminate`.
pub trait NodeTerminator {
    type Error: Display;

    /// Terminate nodes by their stable id.
    fn terminate_ids(
        &self,
        cluster: &str,
        ids: &[NodeId],
    ) -> Result<TerminationResponse, Self::Error>;

    /// Terminate nodes by hostname. Hostnames can be reused by the cloud
    /// provider, so this may hit a node that replaced the intended one.
    fn terminate_hostnames(
        &self,
        cluster: &str,
        hostnames: &[String],
    ) -> Result<TerminationResponse, Self::Error>;
}
