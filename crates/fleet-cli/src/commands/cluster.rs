use std::path::Path;

use anyhow::Context;
use fleet_core::FleetScope;
use fleetgrid_client::ClusterImport;

use super::wait::run_poller;
use crate::settings::Settings;

pub fn start(settings: &Settings) -> anyhow::Result<()> {
    let answer = settings.client()?.start_cluster(&settings.cluster)?;
    report("start", &settings.cluster, &answer);
    Ok(())
}

pub fn retry(settings: &Settings) -> anyhow::Result<()> {
    let answer = settings.client()?.retry_cluster(&settings.cluster)?;
    report("retry", &settings.cluster, &answer);
    Ok(())
}

/// Terminate every node, optionally blocking until the whole cluster has
/// stopped.
pub fn terminate(settings: &Settings, wait: bool) -> anyhow::Result<()> {
    let client = settings.client()?;
    let answer = client.terminate_cluster(&settings.cluster)?;
    report("terminate", &settings.cluster, &answer);

    if wait {
        let scope = FleetScope::cluster(&settings.cluster);
        run_poller(settings, &client, &scope, settings.policy)?;
    }
    Ok(())
}

pub fn remove(settings: &Settings) -> anyhow::Result<()> {
    let answer = settings.client()?.remove_cluster(&settings.cluster)?;
    report("remove", &settings.cluster, &answer);
    Ok(())
}

pub fn import(
    settings: &Settings,
    template_file: &Path,
    template: &str,
    params: Option<&Path>,
) -> anyhow::Result<()> {
    let parameters = match params {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("{} is not valid JSON", path.display()))?
        }
        None => serde_json::json!({}),
    };
    let import = ClusterImport::from_file(template_file, template, parameters)?;
    let answer = settings.client()?.import_cluster(&settings.cluster, &import)?;
    report("import", &settings.cluster, &answer);
    Ok(())
}

fn report(action: &str, cluster: &str, answer: &serde_json::Value) {
    match answer {
        serde_json::Value::Null => println!("✓ {action} submitted for {cluster}"),
        serde_json::Value::String(text) => println!("✓ {action} submitted for {cluster}: {text}"),
        other => println!("✓ {action} submitted for {cluster}: {other}"),
    }
}
