use fleetgrid_poller::{terminate_hostnames, terminate_nodes, TerminationOutcome};

use crate::settings::Settings;

pub fn terminate(settings: &Settings, ids: &[String], hostnames: &[String]) -> anyhow::Result<()> {
    let client = settings.client()?;
    let outcome = if ids.is_empty() {
        terminate_hostnames(&client, &settings.cluster, hostnames)?
    } else {
        terminate_nodes(&client, &settings.cluster, ids)?
    };

    match outcome {
        TerminationOutcome::NoOp => println!("No matching nodes, nothing to terminate"),
        TerminationOutcome::Submitted(resp) => {
            println!("✓ Terminate requested");
            for node in &resp.nodes {
                println!(
                    "  {} {}{}",
                    node.id.as_deref().or(node.name.as_deref()).unwrap_or("?"),
                    node.status.as_deref().unwrap_or(""),
                    node.error.as_deref().map(|e| format!(" ({e})")).unwrap_or_default()
                );
            }
            if let Some(op) = resp.operation_id() {
                println!("  Operation: {op}");
            }
        }
    }
    Ok(())
}
