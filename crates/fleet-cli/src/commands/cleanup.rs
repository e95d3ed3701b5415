use std::io::{BufRead, Write};

use fleet_core::FleetScope;
use fleetgrid_poller::{failed_ids, failed_nodes, terminate_nodes, TerminationOutcome};

use crate::settings::Settings;

pub fn cleanup(settings: &Settings, node_array: Option<&str>, yes: bool) -> anyhow::Result<()> {
    let client = settings.client()?;
    let mut scope = FleetScope::cluster(&settings.cluster);
    if let Some(array) = node_array.or(settings.node_array.as_deref()) {
        scope = scope.with_node_array(array);
    }

    let fleet = client.list_nodes(&scope)?;
    let failed = failed_nodes(&fleet, &settings.table);
    if failed.is_empty() {
        println!("No failed nodes in {scope}");
        return Ok(());
    }

    let listing: Vec<_> = failed.iter().map(|n| n.to_json()).collect();
    println!("Failed nodes in {scope}:");
    println!("{}", serde_json::to_string_pretty(&listing)?);

    if !yes {
        let stdin = std::io::stdin();
        let prompt = format!("Terminate {} failed nodes? [y/N] ", failed.len());
        if !confirm(&mut stdin.lock(), &mut std::io::stderr(), &prompt)? {
            println!("Aborted, nothing terminated");
            return Ok(());
        }
    }

    match terminate_nodes(&client, &settings.cluster, &failed_ids(&failed))? {
        TerminationOutcome::NoOp => println!("Nodes were already gone"),
        TerminationOutcome::Submitted(resp) => {
            println!("✓ Terminate requested for {} nodes", failed.len());
            if let Some(op) = resp.operation_id() {
                println!("  Operation: {op}");
            }
        }
    }
    Ok(())
}

/// Ask a yes/no question. Anything but "y" or "yes" means no.
fn confirm(input: &mut impl BufRead, out: &mut impl Write, prompt: &str) -> std::io::Result<bool> {
    write!(out, "{prompt}")?;
    out.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask(answer: &str) -> bool {
        let mut out = Vec::new();
        let result = confirm(&mut answer.as_bytes(), &mut out, "go? ").unwrap();
        assert_eq!(out, b"go? ");
        result
    }

    #[test]
    fn only_yes_confirms() {
        assert!(ask("y\n"));
        assert!(ask("YES\n"));
        assert!(!ask("\n"));
        assert!(!ask("n\n"));
        assert!(!ask(""));
    }
}
