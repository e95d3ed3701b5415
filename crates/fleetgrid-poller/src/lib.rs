//! fleetgrid-poller: waiting on and cleaning up fleets of remote nodes.
//!
//! Everything here is synchronous: one query in flight at a time and a
//! plain timed sleep between attempts.
//!
//! # Architecture
//!
//! ```text
//! FleetPoller
//!   ├── FleetQuery (fresh Fleet per attempt, injected)
//!   ├── StatusTable → PollOutcome per snapshot
//!   ├── Sleeper (thread sleep, or recorded in tests)
//!   └── Settled | FleetFailure | Timeout | fatal QueryError
//!
//! terminate_nodes / terminate_hostnames
//!   ├── empty set → NoOp, nothing sent
//!   ├── NodeTerminator (injected)
//!   └── "no instances matching" → NoOp
//!
//! cleanup::failed_nodes → ids to hand to terminate_nodes
//! ```

pub mod cleanup;
pub mod error;
pub mod poller;
pub mod terminate;

pub use cleanup::{failed_ids, failed_nodes, FailedNode};
pub use error::{PollError, PollResult, TerminationError};
pub use poller::{FleetPoller, Settled, Sleeper, ThreadSleeper};
pub use terminate::{terminate_hostnames, terminate_nodes, TerminationOutcome};
