//! Wire records returned by the cluster-management service.
//!
//! Only the attributes fleetgrid reads are modelled; everything else in the
//! service's JSON is ignored. Node records use the service's PascalCase
//! attribute names, cluster-level documents use camelCase.

use serde::{Deserialize, Serialize};
use tracing::warn;

use fleet_core::{Node, OperationRef};

/// One node as reported by `/clusters/{cluster}/nodes` or cluster status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeRecord {
    #[serde(default)]
    pub node_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Node array the node was created from.
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub machine_type: Option<String>,
    #[serde(default)]
    pub private_ip: Option<String>,
}

impl NodeRecord {
    /// Convert to a domain node. Records without a `NodeId` cannot be
    /// terminated safely and are dropped.
    pub fn into_node(self) -> Option<Node> {
        let Some(id) = self.node_id.filter(|id| !id.is_empty()) else {
            warn!(name = ?self.name, "skipping node record without NodeId");
            return None;
        };
        Some(Node {
            name: self.name.unwrap_or_else(|| id.clone()),
            id,
            hostname: self.hostname.filter(|h| !h.is_empty()),
            status: self.status.unwrap_or_default(),
            node_array: self.template,
            status_message: self.status_message,
        })
    }
}

/// Response of `GET /clusters/{cluster}/nodes`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeList {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub operation: Option<OperationRef>,
}

/// Capacity summary for one node array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeArrayStatus {
    pub name: String,
    #[serde(default)]
    pub max_count: Option<u32>,
    #[serde(default)]
    pub max_core_count: Option<u32>,
    /// Per machine type capacity buckets, passed through untouched.
    #[serde(default)]
    pub buckets: Vec<serde_json::Value>,
}

/// Response of `GET /clusters/{cluster}/status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatus {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub target_state: Option<String>,
    #[serde(default)]
    pub max_count: Option<u32>,
    #[serde(default)]
    pub max_core_count: Option<u32>,
    #[serde(default)]
    pub nodearrays: Vec<NodeArrayStatus>,
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
}

/// One set of nodes created by a scale request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSetResult {
    #[serde(default)]
    pub added: u32,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `POST /clusters/{cluster}/nodes/scale/{array}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleResult {
    #[serde(default)]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub sets: Vec<NodeSetResult>,
}

impl ScaleResult {
    pub fn added(&self) -> u32 {
        self.sets.iter().map(|s| s.added).sum()
    }
}

/// Decode a response body as JSON, falling back to a JSON string when the
/// legacy action endpoints answer with plain text.
pub fn loose_json(body: &[u8]) -> serde_json::Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        return serde_json::Value::Null;
    }
    serde_json::from_slice(body).unwrap_or_else(|_| {
        serde_json::Value::String(String::from_utf8_lossy(body).trim().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_list_decodes_service_attributes() {
        let list: NodeList = serde_json::from_str(
            r#"{
                "nodes": [
                    {"Name": "execute-1", "NodeId": "a1b2", "Hostname": "ip-0A000004",
                     "Status": "Ready", "Template": "execute", "MachineType": "Standard_F2s_v2",
                     "Extra": {"ignored": true}},
                    {"Name": "execute-2", "NodeId": "c3d4", "Status": "Failed",
                     "Template": "execute", "StatusMessage": "allocation failed"}
                ],
                "operation": {"id": "op-7", "href": "/operations/op-7"}
            }"#,
        )
        .unwrap();
        assert_eq!(list.nodes.len(), 2);
        assert_eq!(list.operation.unwrap().id.as_deref(), Some("op-7"));

        let node = list.nodes[1].clone().into_node().unwrap();
        assert_eq!(node.id, "c3d4");
        assert_eq!(node.name, "execute-2");
        assert_eq!(node.hostname, None);
        assert_eq!(node.node_array.as_deref(), Some("execute"));
        assert_eq!(node.status_message.as_deref(), Some("allocation failed"));
    }

    #[test]
    fn record_without_node_id_is_dropped() {
        let record = NodeRecord {
            name: Some("scheduler".into()),
            status: Some("Ready".into()),
            ..Default::default()
        };
        assert!(record.into_node().is_none());
    }

    #[test]
    fn missing_status_becomes_empty() {
        let record = NodeRecord {
            node_id: Some("n1".into()),
            ..Default::default()
        };
        let node = record.into_node().unwrap();
        assert_eq!(node.status, "");
        assert_eq!(node.name, "n1");
    }

    #[test]
    fn cluster_status_decodes() {
        let status: ClusterStatus = serde_json::from_str(
            r#"{"state": "Started", "targetState": "Started", "maxCoreCount": 512,
                "nodearrays": [{"name": "execute", "maxCount": 100, "buckets": [{"definition": {}}]}],
                "nodes": []}"#,
        )
        .unwrap();
        assert_eq!(status.state.as_deref(), Some("Started"));
        assert_eq!(status.max_core_count, Some(512));
        assert_eq!(status.nodearrays[0].max_count, Some(100));
        assert_eq!(status.nodearrays[0].buckets.len(), 1);
    }

    #[test]
    fn scale_result_sums_added() {
        let result: ScaleResult = serde_json::from_str(
            r#"{"operationId": "op-3", "sets": [{"added": 2}, {"added": 3, "message": "ok"}]}"#,
        )
        .unwrap();
        assert_eq!(result.operation_id.as_deref(), Some("op-3"));
        assert_eq!(result.added(), 5);
    }

    #[test]
    fn loose_json_handles_text_and_empty() {
        assert_eq!(loose_json(b""), serde_json::Value::Null);
        assert_eq!(loose_json(b"{\"ok\": true}")["ok"], true);
        assert_eq!(loose_json(b"Cluster started\n"), "Cluster started");
    }
}
