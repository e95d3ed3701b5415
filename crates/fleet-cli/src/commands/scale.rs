use fleetgrid_client::ScaleTarget;

use crate::settings::Settings;

pub fn scale(
    settings: &Settings,
    node_array: &str,
    cores: Option<u32>,
    nodes: Option<u32>,
) -> anyhow::Result<()> {
    let target = match (cores, nodes) {
        (Some(n), _) => ScaleTarget::Cores(n),
        (None, Some(n)) => ScaleTarget::Nodes(n),
        (None, None) => anyhow::bail!("pass --cores or --nodes"),
    };
    let client = settings.client()?;
    let result = client.scale_node_array(&settings.cluster, node_array, target)?;
    println!("✓ Scale requested for {node_array}: {} nodes added", result.added());
    if let Some(op) = &result.operation_id {
        println!("  Operation: {op}");
        println!("  Wait with: fleet wait --node-array {node_array} --operation-id {op}");
    }
    Ok(())
}
