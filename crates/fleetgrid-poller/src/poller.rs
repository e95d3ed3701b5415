//! Bounded fleet status polling.
//!
//! Repeatedly queries a fleet until every node has stopped, any node has
//! failed, or the attempt budget runs out. Sleeps a fixed interval between
//! attempts and never after the last one.

use std::time::Duration;

use tracing::{debug, info, warn};

use fleet_core::{Fleet, FleetQuery, FleetScope, PollOutcome, PollPolicy, QueryError, StatusTable};

use crate::error::{PollError, PollResult};

/// Blocks the caller between attempts.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// A fleet that reached all-terminal-success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled {
    /// 1-based attempt on which the fleet settled.
    pub attempts: u32,
    /// The snapshot that settled.
    pub fleet: Fleet,
}

/// Waits for a fleet to reach a decidable terminal condition.
///
/// Holds no state between calls to [`FleetPoller::wait`].
#[derive(Debug, Clone)]
pub struct FleetPoller<S = ThreadSleeper> {
    policy: PollPolicy,
    table: StatusTable,
    sleeper: S,
}

impl FleetPoller<ThreadSleeper> {
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            table: StatusTable::default(),
            sleeper: ThreadSleeper,
        }
    }
}

impl<S: Sleeper> FleetPoller<S> {
    /// Replace the sleeper (tests record sleeps instead of waiting).
    pub fn with_sleeper<T: Sleeper>(self, sleeper: T) -> FleetPoller<T> {
        FleetPoller {
            policy: self.policy,
            table: self.table,
            sleeper,
        }
    }

    pub fn with_status_table(mut self, table: StatusTable) -> Self {
        self.table = table;
        self
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Poll `query` until the fleet in `scope` settles.
    ///
    /// `scope` only labels logs and errors; `query` decides what is fetched.
    pub fn wait<Q: FleetQuery>(&mut self, scope: &FleetScope, mut query: Q) -> PollResult<Settled> {
        let max_attempts = self.policy.max_attempts();
        let interval = self.policy.interval();
        let mut last_error: Option<String> = None;

        debug!(%scope, max_attempts, ?interval, "waiting for fleet to settle");

        for attempt in 1..=max_attempts {
            match query.query() {
                Ok(fleet) => match fleet.outcome(&self.table) {
                    PollOutcome::AllTerminalSuccess => {
                        info!(%scope, attempt, nodes = fleet.len(), "fleet settled");
                        return Ok(Settled {
                            attempts: attempt,
                            fleet,
                        });
                    }
                    PollOutcome::AnyTerminalFailure(node_ids) => {
                        warn!(%scope, attempt, failed = ?node_ids, "nodes reached terminal failure");
                        return Err(PollError::FleetFailure {
                            scope: scope.clone(),
                            node_ids,
                        });
                    }
                    PollOutcome::StillPending => {
                        let (done, _, pending) = fleet.tally(&self.table);
                        debug!(%scope, attempt, done, pending, "fleet still pending");
                    }
                },
                Err(QueryError::Transient(message)) => {
                    debug!(%scope, attempt, error = %message, "transient query error, will retry");
                    last_error = Some(message);
                }
                Err(fatal @ QueryError::Fatal(_)) => {
                    warn!(%scope, attempt, error = %fatal, "fatal query error");
                    return Err(PollError::Query(fatal));
                }
            }

            if attempt < max_attempts {
                self.sleeper.sleep(interval);
            }
        }

        warn!(%scope, attempts = max_attempts, "gave up waiting for fleet");
        Err(PollError::Timeout {
            scope: scope.clone(),
            attempts: max_attempts,
            last_error,
        })
    }
}
