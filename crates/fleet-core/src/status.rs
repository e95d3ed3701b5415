//! Node status classification.
//!
//! Status strings reported by the cluster service form an open set: new
//! transient states appear over time. Only statuses listed in the table may
//! end a poll; everything else classifies as [`StatusClass::Pending`].

use serde::{Deserialize, Serialize};

/// Statuses that mean a node has stopped cleanly.
pub const DEFAULT_SUCCESS_STATUSES: &[&str] = &["Off", "Terminated"];

/// Statuses that mean a node has stopped and will not recover on its own.
pub const DEFAULT_FAILURE_STATUSES: &[&str] = &["Failed", "Unavailable"];

/// Classification of a node status string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    /// Powered off or terminated.
    TerminalSuccess,
    /// Failed or unavailable.
    TerminalFailure,
    /// Anything else, including statuses never seen before.
    Pending,
}

/// Lookup table from status string to [`StatusClass`].
///
/// Matching ignores ASCII case. A status listed as both success and failure
/// classifies as failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTable {
    success: Vec<String>,
    failure: Vec<String>,
}

impl Default for StatusTable {
    fn default() -> Self {
        Self {
            success: DEFAULT_SUCCESS_STATUSES.iter().map(|s| s.to_string()).collect(),
            failure: DEFAULT_FAILURE_STATUSES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl StatusTable {
    /// Add extra terminal-success statuses on top of the current table.
    pub fn with_success<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for status in statuses {
            push_unique(&mut self.success, status.into());
        }
        self
    }

    /// Add extra terminal-failure statuses on top of the current table.
    pub fn with_failure<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for status in statuses {
            push_unique(&mut self.failure, status.into());
        }
        self
    }

    /// Classify a raw status string.
    pub fn classify(&self, status: &str) -> StatusClass {
        let status = status.trim();
        if contains(&self.failure, status) {
            StatusClass::TerminalFailure
        } else if contains(&self.success, status) {
            StatusClass::TerminalSuccess
        } else {
            StatusClass::Pending
        }
    }
}

fn contains(list: &[String], status: &str) -> bool {
    list.iter().any(|s| s.eq_ignore_ascii_case(status))
}

fn push_unique(list: &mut Vec<String>, status: String) {
    if !contains(list, &status) {
        list.push(status);
    }
}
