//! Domain types for fleet monitoring.
//!
//! A [`Fleet`] is a snapshot of the nodes in one [`FleetScope`], rebuilt from
//! the latest service response on every poll cycle and never cached.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::status::{StatusClass, StatusTable};

/// Stable identifier of a node; the only safe key for termination.
pub type NodeId = String;

// ── Node ───────────────────────────────────────────────────────────

/// One remote compute instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Display name within the cluster (e.g. "execute-1").
    pub name: String,
    /// Hostname as last reported. The cloud may reuse it for an unrelated
    /// node after deallocation, so it is never used as a key.
    pub hostname: Option<String>,
    /// Raw status string from the service.
    pub status: String,
    /// Node array this node belongs to.
    pub node_array: Option<String>,
    /// Free-form detail, usually set when the node failed.
    pub status_message: Option<String>,
}

impl Node {
    /// Minimal node with just an id and status.
    pub fn new(id: impl Into<NodeId>, status: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            hostname: None,
            status: status.into(),
            node_array: None,
            status_message: None,
        }
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn with_node_array(mut self, node_array: impl Into<String>) -> Self {
        self.node_array = Some(node_array.into());
        self
    }
}

// ── Scope ──────────────────────────────────────────────────────────

/// Narrows a node listing to the nodes created by one request or operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ScopeFilter {
    RequestId(String),
    OperationId(String),
}

/// Which nodes a fleet snapshot covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetScope {
    pub cluster: String,
    pub node_array: Option<String>,
    pub filter: Option<ScopeFilter>,
}

impl FleetScope {
    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            cluster: name.into(),
            node_array: None,
            filter: None,
        }
    }

    pub fn with_node_array(mut self, node_array: impl Into<String>) -> Self {
        self.node_array = Some(node_array.into());
        self
    }

    pub fn with_filter(mut self, filter: ScopeFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Whether a node falls inside this scope's node-array filter.
    pub fn admits(&self, node: &Node) -> bool {
        match &self.node_array {
            Some(array) => node.node_array.as_deref() == Some(array.as_str()),
            None => true,
        }
    }
}

impl fmt::Display for FleetScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cluster)?;
        if let Some(array) = &self.node_array {
            write!(f, "/{array}")?;
        }
        match &self.filter {
            Some(ScopeFilter::RequestId(id)) => write!(f, "[request={id}]"),
            Some(ScopeFilter::OperationId(id)) => write!(f, "[operation={id}]"),
            None => Ok(()),
        }
    }
}

// ── Fleet ──────────────────────────────────────────────────────────

/// Outcome of classifying one fleet snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Every node stopped cleanly (or there are no nodes).
    AllTerminalSuccess,
    /// These nodes reached a terminal failure status.
    AnyTerminalFailure(Vec<NodeId>),
    /// At least one node is still in progress.
    StillPending,
}

/// Snapshot of the nodes in a scope, unique by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fleet {
    nodes: Vec<Node>,
}

impl Fleet {
    /// Build a fleet, collapsing repeated ids. The last record for an id
    /// wins; it keeps the position of the first.
    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let mut index: HashMap<NodeId, usize> = HashMap::new();
        let mut unique: Vec<Node> = Vec::new();
        for node in nodes {
            match index.get(&node.id) {
                Some(&pos) => unique[pos] = node,
                None => {
                    index.insert(node.id.clone(), unique.len());
                    unique.push(node);
                }
            }
        }
        Self { nodes: unique }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Nodes whose status falls in the given class.
    pub fn with_class<'a>(
        &'a self,
        table: &'a StatusTable,
        class: StatusClass,
    ) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes
            .iter()
            .filter(move |n| table.classify(&n.status) == class)
    }

    /// Count of nodes per status class: (success, failure, pending).
    pub fn tally(&self, table: &StatusTable) -> (usize, usize, usize) {
        self.nodes
            .iter()
            .fold((0, 0, 0), |(s, f, p), n| match table.classify(&n.status) {
                StatusClass::TerminalSuccess => (s + 1, f, p),
                StatusClass::TerminalFailure => (s, f + 1, p),
                StatusClass::Pending => (s, f, p + 1),
            })
    }

    /// Classify the snapshot. Failures take precedence over everything else.
    pub fn outcome(&self, table: &StatusTable) -> PollOutcome {
        let failed: Vec<NodeId> = self
            .with_class(table, StatusClass::TerminalFailure)
            .map(|n| n.id.clone())
            .collect();
        if !failed.is_empty() {
            return PollOutcome::AnyTerminalFailure(failed);
        }

        let all_done = self
            .nodes
            .iter()
            .all(|n| table.classify(&n.status) == StatusClass::TerminalSuccess);
        if all_done {
            PollOutcome::AllTerminalSuccess
        } else {
            PollOutcome::StillPending
        }
    }
}

impl FromIterator<Node> for Fleet {
    fn from_iter<T: IntoIterator<Item = Node>>(iter: T) -> Self {
        Fleet::from_nodes(iter)
    }
}

// ── Termination ────────────────────────────────────────────────────

/// Reference to an asynchronous operation started by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
}

/// Per-node result of a node management request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeActionResult {
    #[serde(default)]
    pub id: Option<NodeId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Structured response to a terminate (or other node management) request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationResponse {
    #[serde(default)]
    pub operation: Option<OperationRef>,
    #[serde(default)]
    pub nodes: Vec<NodeActionResult>,
}

impl TerminationResponse {
    /// Operation id, if the service started one.
    pub fn operation_id(&self) -> Option<&str> {
        self.operation.as_ref().and_then(|op| op.id.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fleet_is_success() {
        let fleet = Fleet::default();
        assert!(fleet.is_empty());
        assert_eq!(
            fleet.outcome(&StatusTable::default()),
            PollOutcome::AllTerminalSuccess
        );
    }

    #[test]
    fn failure_takes_precedence() {
        let fleet = Fleet::from_nodes([
            Node::new("n1", "Off"),
            Node::new("n2", "Failed"),
            Node::new("n3", "Running"),
            Node::new("n4", "Unavailable"),
        ]);
        assert_eq!(
            fleet.outcome(&StatusTable::default()),
            PollOutcome::AnyTerminalFailure(vec!["n2".into(), "n4".into()])
        );
    }

    #[test]
    fn pending_when_any_node_in_progress() {
        let fleet = Fleet::from_nodes([Node::new("n1", "Off"), Node::new("n2", "Stopping")]);
        assert_eq!(
            fleet.outcome(&StatusTable::default()),
            PollOutcome::StillPending
        );
    }

    #[test]
    fn duplicate_ids_collapse_to_latest_record() {
        let fleet = Fleet::from_nodes([
            Node::new("n1", "Running"),
            Node::new("n2", "Running"),
            Node::new("n1", "Off"),
        ]);
        assert_eq!(fleet.len(), 2);
        assert_eq!(fleet.nodes()[0].id, "n1");
        assert_eq!(fleet.get("n1").unwrap().status, "Off");
    }

    #[test]
    fn tally_counts_each_class() {
        let fleet: Fleet = [
            Node::new("a", "Off"),
            Node::new("b", "Terminated"),
            Node::new("c", "Failed"),
            Node::new("d", "Acquiring"),
        ]
        .into_iter()
        .collect();
        assert_eq!(fleet.tally(&StatusTable::default()), (2, 1, 1));
    }

    #[test]
    fn scope_display() {
        assert_eq!(FleetScope::cluster("c1").to_string(), "c1");
        assert_eq!(
            FleetScope::cluster("c1").with_node_array("execute").to_string(),
            "c1/execute"
        );
        assert_eq!(
            FleetScope::cluster("c1")
                .with_filter(ScopeFilter::OperationId("op-9".into()))
                .to_string(),
            "c1[operation=op-9]"
        );
    }

    #[test]
    fn scope_admits_by_node_array() {
        let scope = FleetScope::cluster("c1").with_node_array("execute");
        assert!(scope.admits(&Node::new("n1", "Off").with_node_array("execute")));
        assert!(!scope.admits(&Node::new("n2", "Off").with_node_array("gpu")));
        assert!(!scope.admits(&Node::new("n3", "Off")));
        assert!(FleetScope::cluster("c1").admits(&Node::new("n3", "Off")));
    }

    #[test]
    fn termination_response_decodes_partial_json() {
        let resp: TerminationResponse = serde_json::from_str(
            r#"{"operation": {"id": "op-1", "href": "/operations/op-1"},
                "nodes": [{"id": "n1", "name": "execute-1", "status": "OK"}]}"#,
        )
        .unwrap();
        assert_eq!(resp.operation_id(), Some("op-1"));
        assert_eq!(resp.nodes.len(), 1);
        assert_eq!(resp.nodes[0].error, None);

        let empty: TerminationResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.operation_id().is_none());
    }
}
