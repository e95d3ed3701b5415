//! Cluster-management REST operations.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info};

use fleet_core::{
    Fleet, FleetScope, NodeId, NodeTerminator, QueryError, ScopeFilter, ServiceConfig,
    TerminationResponse,
};

use crate::error::{ClientError, ClientResult};
use crate::model::{loose_json, ClusterStatus, NodeList, ScaleResult};
use crate::transport::{encode_component, RequestBody, Transport};

/// Seconds the legacy terminate/remove actions wait for cluster state to
/// update before answering.
const ACTION_WAIT_SECS: u32 = 30;

/// Target size for a node array scale request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleTarget {
    /// Total cores across the array.
    Cores(u32),
    /// Total nodes in the array.
    Nodes(u32),
}

/// A cluster template to import or update.
#[derive(Debug, Clone)]
pub struct ClusterImport {
    /// Cluster template text.
    pub template_text: String,
    /// Name of the cluster section inside the template text.
    pub template_name: String,
    /// Template parameters.
    pub parameters: serde_json::Value,
}

impl ClusterImport {
    pub fn from_file(
        path: &Path,
        template_name: impl Into<String>,
        parameters: serde_json::Value,
    ) -> ClientResult<Self> {
        let template_text = std::fs::read_to_string(path).map_err(|source| ClientError::File {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self {
            template_text,
            template_name: template_name.into(),
            parameters,
        })
    }
}

/// Blocking client for one cluster-management service.
#[derive(Debug)]
pub struct ClusterClient {
    transport: Transport,
}

impl ClusterClient {
    pub fn new(config: &ServiceConfig) -> ClientResult<Self> {
        Ok(Self {
            transport: Transport::new(config)?,
        })
    }

    /// Cluster state, node arrays and nodes.
    pub fn cluster_status(&self, cluster: &str) -> ClientResult<ClusterStatus> {
        let path = format!("/clusters/{}/status", encode_component(cluster));
        let body = self.transport.get(&path, &[("nodes", "true".to_string())])?;
        decode(&body)
    }

    /// Raw node listing for a scope. The node-array filter is not applied.
    pub fn node_records(&self, scope: &FleetScope) -> ClientResult<NodeList> {
        let path = format!("/clusters/{}/nodes", encode_component(&scope.cluster));
        let query = match &scope.filter {
            Some(ScopeFilter::RequestId(id)) => vec![("request_id", id.clone())],
            Some(ScopeFilter::OperationId(id)) => vec![("operation", id.clone())],
            None => Vec::new(),
        };
        let body = self.transport.get(&path, &query)?;
        decode(&body)
    }

    /// Current fleet for a scope.
    pub fn list_nodes(&self, scope: &FleetScope) -> ClientResult<Fleet> {
        let list = self.node_records(scope)?;
        let fleet: Fleet = list
            .nodes
            .into_iter()
            .filter_map(|r| r.into_node())
            .filter(|n| scope.admits(n))
            .collect();
        debug!(%scope, nodes = fleet.len(), "listed nodes");
        Ok(fleet)
    }

    /// A status query for the poller, fetching a fresh fleet on every call.
    pub fn fleet_query<'a>(
        &'a self,
        scope: &'a FleetScope,
    ) -> impl FnMut() -> Result<Fleet, QueryError> + 'a {
        move || self.list_nodes(scope).map_err(QueryError::from)
    }

    /// Scale a node array to a total core or node count.
    pub fn scale_node_array(
        &self,
        cluster: &str,
        node_array: &str,
        target: ScaleTarget,
    ) -> ClientResult<ScaleResult> {
        let path = format!(
            "/clusters/{}/nodes/scale/{}",
            encode_component(cluster),
            encode_component(node_array)
        );
        let query = match target {
            ScaleTarget::Cores(n) => [("totalCoreCount", n.to_string())],
            ScaleTarget::Nodes(n) => [("totalNodeCount", n.to_string())],
        };
        let body = self.transport.post(&path, &query, RequestBody::Empty)?;
        let result: ScaleResult = decode_or_default(&body)?;
        info!(%cluster, %node_array, ?target, added = result.added(), "scale request accepted");
        Ok(result)
    }

    pub fn start_cluster(&self, cluster: &str) -> ClientResult<serde_json::Value> {
        self.cluster_action("startcluster", cluster, &[])
    }

    pub fn retry_cluster(&self, cluster: &str) -> ClientResult<serde_json::Value> {
        self.cluster_action("retry", cluster, &[])
    }

    /// Terminate every node in the cluster. Pair with the poller to wait
    /// for the nodes to stop.
    pub fn terminate_cluster(&self, cluster: &str) -> ClientResult<serde_json::Value> {
        self.cluster_action(
            "terminatecluster",
            cluster,
            &[("wait_time", ACTION_WAIT_SECS.to_string())],
        )
    }

    /// Delete a terminated cluster.
    pub fn remove_cluster(&self, cluster: &str) -> ClientResult<serde_json::Value> {
        self.cluster_action(
            "removecluster",
            cluster,
            &[("wait_time", ACTION_WAIT_SECS.to_string())],
        )
    }

    /// Create or update a cluster from a template.
    pub fn import_cluster(
        &self,
        cluster: &str,
        import: &ClusterImport,
    ) -> ClientResult<serde_json::Value> {
        let path = format!("/cloud/api/import_cluster/{}", encode_component(cluster));
        let form = vec![
            ("source".to_string(), "standard".to_string()),
            ("cluster".to_string(), import.template_text.clone()),
            ("force".to_string(), "true".to_string()),
            ("template".to_string(), import.template_name.clone()),
            ("parameters".to_string(), import.parameters.to_string()),
            ("parameters_format".to_string(), "json".to_string()),
        ];
        let body = self.transport.post(&path, &[], RequestBody::Form(form))?;
        info!(%cluster, template = %import.template_name, "cluster imported");
        Ok(loose_json(&body))
    }

    fn cluster_action(
        &self,
        action: &str,
        cluster: &str,
        query: &[(&str, String)],
    ) -> ClientResult<serde_json::Value> {
        let path = format!("/cloud/actions/{action}/{}", encode_component(cluster));
        let body = self.transport.post(&path, query, RequestBody::Empty)?;
        info!(%cluster, %action, "cluster action submitted");
        Ok(loose_json(&body))
    }
}

impl NodeTerminator for ClusterClient {
    type Error = ClientError;

    fn terminate_ids(&self, cluster: &str, ids: &[NodeId]) -> ClientResult<TerminationResponse> {
        let path = format!("/clusters/{}/nodes/terminate", encode_component(cluster));
        let payload = serde_json::to_vec(&json!({ "ids": ids }))?;
        let body = self.transport.post(&path, &[], RequestBody::Json(payload))?;
        decode_or_default(&body)
    }

    fn terminate_hostnames(
        &self,
        cluster: &str,
        hostnames: &[String],
    ) -> ClientResult<TerminationResponse> {
        let path = format!("/cloud/actions/terminate_node/{}", encode_component(cluster));
        let body = self.transport.post(
            &path,
            &[("instance-filter", hostname_filter(hostnames))],
            RequestBody::Empty,
        )?;
        decode_or_default(&body)
    }
}

/// Instance filter expression matching any of the given hostnames.
fn hostname_filter(hostnames: &[String]) -> String {
    let quoted: Vec<String> = hostnames.iter().map(|h| format!("\"{h}\"")).collect();
    format!("HostName in {{{}}}", quoted.join(","))
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> ClientResult<T> {
    Ok(serde_json::from_slice(body)?)
}

fn decode_or_default<T: DeserializeOwned + Default>(body: &[u8]) -> ClientResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    decode(body)
}
