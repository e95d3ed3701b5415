use fleet_core::Fleet;

use crate::ScopeArgs;
use crate::settings::Settings;

pub fn list(settings: &Settings, args: &ScopeArgs, format: &str) -> anyhow::Result<()> {
    let client = settings.client()?;
    let scope = settings.scope(args);
    let fleet = client.list_nodes(&scope)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(fleet.nodes())?);
        }
        _ => print!("{}", format_table(&fleet)),
    }
    Ok(())
}

pub fn status(settings: &Settings) -> anyhow::Result<()> {
    let client = settings.client()?;
    let status = client.cluster_status(&settings.cluster)?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

fn format_table(fleet: &Fleet) -> String {
    if fleet.is_empty() {
        return "no nodes\n".to_string();
    }
    let mut out = format!("{:<24} {:<14} {:<16} {}\n", "NAME", "STATUS", "HOSTNAME", "ID");
    for node in fleet.nodes() {
        out.push_str(&format!(
            "{:<24} {:<14} {:<16} {}\n",
            node.name,
            node.status,
            node.hostname.as_deref().unwrap_or("-"),
            node.id
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::Node;

    #[test]
    fn table_lists_each_node() {
        let fleet = Fleet::from_nodes([
            Node::new("a1", "Ready").with_hostname("ip-1"),
            Node::new("b2", "Failed"),
        ]);
        let table = format_table(&fleet);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("NAME"));
        assert!(lines[1].contains("ip-1") && lines[1].ends_with("a1"));
        assert!(lines[2].contains(" - ") && lines[2].contains("Failed"));
    }

    #[test]
    fn empty_fleet_says_so() {
        assert_eq!(format_table(&Fleet::default()), "no nodes\n");
    }
}
