//! Resolves flags, fleet.toml and the environment into one immutable
//! settings value shared by every command.

use std::path::{Path, PathBuf};

use anyhow::Context;
use fleet_core::{
    ConfigError, FleetConfig, FleetScope, PollPolicy, ScopeFilter, ServiceConfig, StatusTable,
};
use fleetgrid_client::ClusterClient;
use tracing::debug;

use crate::{GlobalArgs, ScopeArgs};

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "fleet.toml";
/// Environment variable holding the service password.
pub const PASSWORD_ENV: &str = "FLEET_PASSWORD";

#[derive(Debug)]
pub struct Settings {
    pub service: ServiceConfig,
    pub cluster: String,
    /// Default node-array filter from `[cluster] node_array`.
    pub node_array: Option<String>,
    pub policy: PollPolicy,
    pub table: StatusTable,
}

impl Settings {
    pub fn resolve(global: &GlobalArgs) -> anyhow::Result<Self> {
        let config = load_config(global.config.as_deref())?;
        let env_password = std::env::var(PASSWORD_ENV).ok().filter(|p| !p.is_empty());
        Self::from_config(global, config, env_password, |prompt| {
            rpassword::prompt_password_stderr(prompt)
        })
    }

    /// Precedence: flags, then the password environment variable, then the
    /// file, then an interactive prompt for the password.
    fn from_config<P>(
        global: &GlobalArgs,
        config: FleetConfig,
        env_password: Option<String>,
        prompt: P,
    ) -> anyhow::Result<Self>
    where
        P: FnOnce(&str) -> std::io::Result<String>,
    {
        let policy = config.poll_policy()?;
        let table = config.status_table();

        let file_service = config.service;
        let url = global
            .url
            .clone()
            .or_else(|| file_service.as_ref().map(|s| s.url.clone()))
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::Missing("service url (--url or [service] url)"))?;
        let username = global
            .username
            .clone()
            .or_else(|| file_service.as_ref().map(|s| s.username.clone()))
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::Missing("service username (--username or [service] username)"))?;

        let mut service = match file_service {
            Some(mut s) => {
                s.url = url;
                s.username = username;
                s
            }
            None => ServiceConfig::new(url, username),
        };
        if global.insecure {
            service.verify_certificates = false;
        }
        if let Some(password) = env_password {
            service.password = Some(password);
        }
        if service.password.is_none() {
            let password = prompt(&format!("Password for {}@{}: ", service.username, service.url))
                .context("failed to read password")?;
            service.password = Some(password);
        }
        // Fail early on a bad timeout rather than on the first request.
        service.request_timeout()?;

        let cluster_file = config.cluster;
        let cluster = global
            .cluster
            .clone()
            .or_else(|| cluster_file.as_ref().map(|c| c.name.clone()))
            .filter(|c| !c.is_empty())
            .ok_or(ConfigError::Missing("cluster name (--cluster or [cluster] name)"))?;
        let node_array = cluster_file.and_then(|c| c.node_array);

        Ok(Self {
            service,
            cluster,
            node_array,
            policy,
            table,
        })
    }

    pub fn client(&self) -> anyhow::Result<ClusterClient> {
        Ok(ClusterClient::new(&self.service)?)
    }

    /// Scope for a command. A `--node-array` flag replaces the configured
    /// default array.
    pub fn scope(&self, args: &ScopeArgs) -> FleetScope {
        let mut scope = FleetScope::cluster(&self.cluster);
        if let Some(array) = args.node_array.as_ref().or(self.node_array.as_ref()) {
            scope = scope.with_node_array(array);
        }
        if let Some(id) = &args.request_id {
            scope = scope.with_filter(ScopeFilter::RequestId(id.clone()));
        } else if let Some(id) = &args.operation_id {
            scope = scope.with_filter(ScopeFilter::OperationId(id.clone()));
        }
        scope
    }
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<FleetConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                debug!("no {DEFAULT_CONFIG_FILE} found, using flags only");
                return Ok(FleetConfig::default());
            }
            default
        }
    };
    let config = FleetConfig::from_file(&path)?;
    debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: &str = r#"
        [service]
        url = "https://cc.example.com"
        username = "admin"
        password = "from-file"

        [cluster]
        name = "apiTest"
        node_array = "execute"

        [poll]
        max_attempts = 5
        interval = "2s"
    "#;

    fn no_prompt(_: &str) -> std::io::Result<String> {
        panic!("prompt should not be used")
    }

    #[test]
    fn file_values_are_used() {
        let config = FleetConfig::parse(FILE).unwrap();
        let settings =
            Settings::from_config(&GlobalArgs::default(), config, None, no_prompt).unwrap();
        assert_eq!(settings.service.url, "https://cc.example.com");
        assert_eq!(settings.service.password.as_deref(), Some("from-file"));
        assert_eq!(settings.cluster, "apiTest");
        assert_eq!(settings.policy.max_attempts(), 5);
        assert_eq!(settings.scope(&ScopeArgs::default()).to_string(), "apiTest/execute");
    }

    #[test]
    fn flags_and_env_override_file() {
        let config = FleetConfig::parse(FILE).unwrap();
        let global = GlobalArgs {
            url: Some("https://other:9443".into()),
            cluster: Some("prod".into()),
            insecure: true,
            ..Default::default()
        };
        let settings =
            Settings::from_config(&global, config, Some("from-env".into()), no_prompt).unwrap();
        assert_eq!(settings.service.url, "https://other:9443");
        assert_eq!(settings.service.username, "admin");
        assert_eq!(settings.service.password.as_deref(), Some("from-env"));
        assert!(!settings.service.verify_certificates);
        assert_eq!(settings.cluster, "prod");
    }

    #[test]
    fn missing_password_prompts() {
        let global = GlobalArgs {
            url: Some("https://cc".into()),
            username: Some("ops".into()),
            cluster: Some("c1".into()),
            ..Default::default()
        };
        let settings = Settings::from_config(&global, FleetConfig::default(), None, |prompt| {
            assert!(prompt.contains("ops@https://cc"));
            Ok("typed".into())
        })
        .unwrap();
        assert_eq!(settings.service.password.as_deref(), Some("typed"));
        assert!(settings.service.verify_certificates);
        assert_eq!(settings.policy.max_attempts(), fleet_core::config::DEFAULT_MAX_ATTEMPTS);
    }

    #[test]
    fn missing_url_or_cluster_is_an_error() {
        let err = Settings::from_config(&GlobalArgs::default(), FleetConfig::default(), None, no_prompt)
            .unwrap_err();
        assert!(err.to_string().contains("service url"));

        let global = GlobalArgs {
            url: Some("https://cc".into()),
            username: Some("ops".into()),
            ..Default::default()
        };
        let err = Settings::from_config(&global, FleetConfig::default(), Some("pw".into()), no_prompt)
            .unwrap_err();
        assert!(err.to_string().contains("cluster name"));
    }

    #[test]
    fn scope_flags_replace_defaults() {
        let config = FleetConfig::parse(FILE).unwrap();
        let settings =
            Settings::from_config(&GlobalArgs::default(), config, None, no_prompt).unwrap();
        let args = ScopeArgs {
            node_array: Some("gpu".into()),
            operation_id: Some("op-9".into()),
            ..Default::default()
        };
        assert_eq!(settings.scope(&args).to_string(), "apiTest/gpu[operation=op-9]");
    }

    #[test]
    fn explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("missing.toml"))).is_err());

        let path = dir.path().join("fleet.toml");
        std::fs::write(&path, FILE).unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.cluster.unwrap().name, "apiTest");
    }
}
