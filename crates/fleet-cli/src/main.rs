use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

mod commands;
mod settings;

#[derive(Parser)]
#[command(
    name = "fleet",
    about = "fleetgrid: inspect, wait on and clean up cluster nodes",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Connection flags shared by every command. Each one overrides fleet.toml.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Configuration file (default: ./fleet.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Service base URL, e.g. https://localhost:8443
    #[arg(long, global = true)]
    pub url: Option<String>,
    #[arg(long, global = true)]
    pub username: Option<String>,
    /// Cluster name
    #[arg(long, global = true)]
    pub cluster: Option<String>,
    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    pub insecure: bool,
}

/// Narrows a command to part of the cluster.
#[derive(Args, Debug, Default)]
pub struct ScopeArgs {
    /// Only nodes from this node array
    #[arg(long)]
    pub node_array: Option<String>,
    /// Only nodes created by this request
    #[arg(long, conflicts_with = "operation_id")]
    pub request_id: Option<String>,
    /// Only nodes touched by this operation
    #[arg(long)]
    pub operation_id: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List nodes and their status
    Nodes {
        #[command(flatten)]
        scope: ScopeArgs,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Print cluster status as JSON
    Status,
    /// Wait until every node in scope reaches a terminal state.
    ///
    /// Exits non-zero if any node fails or the attempt budget runs out.
    Wait {
        #[command(flatten)]
        scope: ScopeArgs,
        /// Maximum number of status queries
        #[arg(long)]
        max_attempts: Option<u32>,
        /// Delay between queries, e.g. 10s or 500ms
        #[arg(long, value_parser = parse_interval)]
        interval: Option<Duration>,
    },
    /// Terminate every node in a failed state
    Cleanup {
        #[arg(long)]
        node_array: Option<String>,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Terminate specific nodes
    #[command(group = clap::ArgGroup::new("target").required(true).args(["ids", "hostnames"]))]
    Terminate {
        /// Node id (repeatable)
        #[arg(long = "id")]
        ids: Vec<String>,
        /// Hostname (repeatable). Hostnames can be reused; prefer --id.
        #[arg(long = "hostname")]
        hostnames: Vec<String>,
    },
    /// Scale a node array to a total core or node count
    #[command(group = clap::ArgGroup::new("size").required(true).args(["cores", "nodes"]))]
    Scale {
        #[arg(long)]
        node_array: String,
        #[arg(long)]
        cores: Option<u32>,
        #[arg(long)]
        nodes: Option<u32>,
    },
    /// Cluster lifecycle actions
    Cluster {
        #[command(subcommand)]
        action: ClusterAction,
    },
}

#[derive(Subcommand)]
enum ClusterAction {
    /// Start the cluster
    Start,
    /// Retry failed operations
    Retry,
    /// Terminate all nodes in the cluster
    Terminate {
        /// Block until every node has stopped
        #[arg(long)]
        wait: bool,
    },
    /// Delete a terminated cluster
    Remove,
    /// Create or update the cluster from a template
    Import {
        #[arg(long)]
        template_file: PathBuf,
        /// Cluster section name inside the template
        #[arg(long)]
        template: String,
        /// JSON file with template parameters
        #[arg(long)]
        params: Option<PathBuf>,
    },
}

fn parse_interval(s: &str) -> Result<Duration, String> {
    fleet_core::config::parse_duration(s).ok_or_else(|| format!("invalid duration '{s}'"))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fleet_cli=info".parse()?)
                .add_directive("fleetgrid_poller=info".parse()?)
                .add_directive("fleetgrid_client=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let settings = settings::Settings::resolve(&cli.global)?;

    match cli.command {
        Commands::Nodes { scope, format } => commands::nodes::list(&settings, &scope, &format),
        Commands::Status => commands::nodes::status(&settings),
        Commands::Wait {
            scope,
            max_attempts,
            interval,
        } => commands::wait::wait(&settings, &scope, max_attempts, interval),
        Commands::Cleanup { node_array, yes } => {
            commands::cleanup::cleanup(&settings, node_array.as_deref(), yes)
        }
        Commands::Terminate { ids, hostnames } => {
            commands::terminate::terminate(&settings, &ids, &hostnames)
        }
        Commands::Scale {
            node_array,
            cores,
            nodes,
        } => commands::scale::scale(&settings, &node_array, cores, nodes),
        Commands::Cluster { action } => match action {
            ClusterAction::Start => commands::cluster::start(&settings),
            ClusterAction::Retry => commands::cluster::retry(&settings),
            ClusterAction::Terminate { wait } => commands::cluster::terminate(&settings, wait),
            ClusterAction::Remove => commands::cluster::remove(&settings),
            ClusterAction::Import {
                template_file,
                template,
                params,
            } => commands::cluster::import(&settings, &template_file, &template, params.as_deref()),
        },
    }
}
