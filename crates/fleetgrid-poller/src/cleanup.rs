//! Failed-node discovery.
//!
//! Finds nodes stuck in a terminal failure status so the caller can confirm
//! and terminate them by id. Confirmation is the caller's job.

use fleet_core::{Fleet, NodeId, StatusClass, StatusTable};
use serde_json::json;

/// A node that reached terminal failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedNode {
    pub id: NodeId,
    pub name: String,
    pub hostname: Option<String>,
    pub status: String,
    pub status_message: Option<String>,
}

impl FailedNode {
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "name": self.name,
            "hostname": self.hostname,
            "status": self.status,
            "status_message": self.status_message,
        })
    }
}

/// Nodes in `fleet` classified as terminal failure, in fleet order.
pub fn failed_nodes(fleet: &Fleet, table: &StatusTable) -> Vec<FailedNode> {
    fleet
        .with_class(table, StatusClass::TerminalFailure)
        .map(|n| FailedNode {
            id: n.id.clone(),
            name: n.name.clone(),
            hostname: n.hostname.clone(),
            status: n.status.clone(),
            status_message: n.status_message.clone(),
        })
        .collect()
}

/// Ids of the given failed nodes, ready for `terminate_nodes`.
pub fn failed_ids(failed: &[FailedNode]) -> Vec<NodeId> {
    failed.iter().map(|n| n.id.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::Node;

    #[test]
    fn picks_failed_and_unavailable() {
        let fleet = Fleet::from_nodes([
            Node::new("n1", "Running").with_hostname("ip-1"),
            Node::new("n2", "Failed").with_hostname("ip-2"),
            Node::new("n3", "Unavailable"),
            Node::new("n4", "Off"),
        ]);
        let failed = failed_nodes(&fleet, &StatusTable::default());
        assert_eq!(failed_ids(&failed), vec!["n2".to_string(), "n3".to_string()]);
        assert_eq!(failed[0].hostname.as_deref(), Some("ip-2"));
    }

    #[test]
    fn healthy_fleet_has_nothing_to_clean() {
        let fleet = Fleet::from_nodes([Node::new("n1", "Running"), Node::new("n2", "Off")]);
        assert!(failed_nodes(&fleet, &StatusTable::default()).is_empty());
    }

    #[test]
    fn json_uses_id_not_hostname_as_key() {
        let node = FailedNode {
            id: "n9".into(),
            name: "execute-9".into(),
            hostname: None,
            status: "Failed".into(),
            status_message: Some("provisioning timed out".into()),
        };
        let v = node.to_json();
        assert_eq!(v["id"], "n9");
        assert!(v["hostname"].is_null());
    }
}
