//! fleet.toml configuration parser.
//!
//! Configuration is read once, resolved into immutable values and handed
//! to each collaborator at construction time.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::status::StatusTable;

/// Attempts used when `[poll] max_attempts` is not set.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 600;
/// Delay used when `[poll] interval` is not set.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);
/// Per-request timeout used when `[service] timeout` is not set.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetConfig {
    pub service: Option<ServiceConfig>,
    pub cluster: Option<ClusterConfig>,
    pub poll: Option<PollConfig>,
}

/// Connection settings for the cluster-management service.
#[derive(Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL, e.g. "https://localhost:8443".
    pub url: String,
    pub username: String,
    /// Usually left out of the file and supplied at runtime.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default = "default_true")]
    pub verify_certificates: bool,
    /// Extra PEM bundle trusted in addition to the Mozilla roots.
    pub ca_cert: Option<PathBuf>,
    /// Per-request timeout, e.g. "30s".
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub name: String,
    pub node_array: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollConfig {
    pub max_attempts: Option<u32>,
    pub interval: Option<String>,
    #[serde(default)]
    pub success_statuses: Vec<String>,
    #[serde(default)]
    pub failure_statuses: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("verify_certificates", &self.verify_certificates)
            .field("ca_cert", &self.ca_cert)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ServiceConfig {
    pub fn new(url: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: None,
            verify_certificates: true,
            ca_cert: None,
            timeout: None,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Resolved per-request timeout.
    pub fn request_timeout(&self) -> Result<Duration, ConfigError> {
        match &self.timeout {
            Some(s) => parse_duration(s).ok_or_else(|| ConfigError::Duration(s.clone())),
            None => Ok(DEFAULT_REQUEST_TIMEOUT),
        }
    }
}

impl FleetConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Attempt budget and interval for the poller.
    pub fn poll_policy(&self) -> Result<PollPolicy, ConfigError> {
        let poll = self.poll.clone().unwrap_or_default();
        let interval = match &poll.interval {
            Some(s) => parse_duration(s).ok_or_else(|| ConfigError::Duration(s.clone()))?,
            None => DEFAULT_INTERVAL,
        };
        PollPolicy::new(poll.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS), interval)
    }

    /// Default status table extended with the configured statuses.
    pub fn status_table(&self) -> StatusTable {
        match &self.poll {
            Some(poll) => StatusTable::default()
                .with_success(poll.success_statuses.iter().cloned())
                .with_failure(poll.failure_statuses.iter().cloned()),
            None => StatusTable::default(),
        }
    }
}

/// How long and how often the poller keeps trying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    max_attempts: u32,
    interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl PollPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        Ok(Self {
            max_attempts,
            interval,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Upper bound on time spent sleeping if every attempt stays pending.
    pub fn max_wait(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts - 1)
    }
}

/// Parse a duration string like "5s", "500ms", "1m". Bare numbers are seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusClass;

    #[test]
    fn parse_full_config() {
        let config = FleetConfig::parse(
            r#"
[service]
url = "https://cc.example.com:8443"
username = "admin"
verify_certificates = false
timeout = "45s"

[cluster]
name = "apiTest"
node_array = "execute"

[poll]
max_attempts = 30
interval = "2s"
success_statuses = ["Deallocated"]
"#,
        )
        .unwrap();

        let service = config.service.as_ref().unwrap();
        assert_eq!(service.url, "https://cc.example.com:8443");
        assert!(!service.verify_certificates);
        assert!(service.password.is_none());
        assert_eq!(service.request_timeout().unwrap(), Duration::from_secs(45));

        let cluster = config.cluster.as_ref().unwrap();
        assert_eq!(cluster.name, "apiTest");
        assert_eq!(cluster.node_array.as_deref(), Some("execute"));

        let policy = config.poll_policy().unwrap();
        assert_eq!(policy.max_attempts(), 30);
        assert_eq!(policy.interval(), Duration::from_secs(2));

        let table = config.status_table();
        assert_eq!(table.classify("Deallocated"), StatusClass::TerminalSuccess);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = FleetConfig::parse("").unwrap();
        assert!(config.service.is_none());
        let policy = config.poll_policy().unwrap();
        assert_eq!(policy.max_attempts(), DEFAULT_MAX_ATTEMPTS);
        assert_eq!(policy.interval(), DEFAULT_INTERVAL);
        assert_eq!(config.status_table(), StatusTable::default());
    }

    #[test]
    fn verify_certificates_defaults_on() {
        let config = FleetConfig::parse(
            r#"
[service]
url = "https://localhost:8443"
username = "admin"
"#,
        )
        .unwrap();
        let service = config.service.unwrap();
        assert!(service.verify_certificates);
        assert_eq!(service.request_timeout().unwrap(), DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn zero_attempts_rejected() {
        let config = FleetConfig::parse("[poll]\nmax_attempts = 0\n").unwrap();
        assert!(matches!(config.poll_policy(), Err(ConfigError::ZeroAttempts)));
        assert!(PollPolicy::new(0, Duration::ZERO).is_err());
        assert!(PollPolicy::new(1, Duration::ZERO).is_ok());
    }

    #[test]
    fn bad_interval_rejected() {
        let config = FleetConfig::parse("[poll]\ninterval = \"soon\"\n").unwrap();
        assert!(matches!(config.poll_policy(), Err(ConfigError::Duration(_))));
    }

    #[test]
    fn password_is_redacted_in_debug() {
        let service = ServiceConfig::new("http://localhost:8080", "admin").with_password("hunter2");
        let rendered = format!("{service:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleet.toml");
        std::fs::write(&path, "[cluster]\nname = \"c1\"\n").unwrap();
        let config = FleetConfig::from_file(&path).unwrap();
        assert_eq!(config.cluster.unwrap().name, "c1");

        let missing = FleetConfig::from_file(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn max_wait_is_sleeps_between_attempts() {
        let policy = PollPolicy::new(600, Duration::from_secs(10)).unwrap();
        assert_eq!(policy.max_wait(), Duration::from_secs(5990));

        let huge = PollPolicy::new(u32::MAX, Duration::MAX).unwrap();
        assert_eq!(huge.max_wait(), Duration::MAX);
    }

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("5s"), Some(Duration::from_secs(5)));
        assert_eq!(parse_duration("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration("10"), Some(Duration::from_secs(10)));
        assert_eq!(parse_duration("0s"), Some(Duration::ZERO));
        assert_eq!(parse_duration("ten"), None);
    }

    #[test]
    fn oversized_minutes_are_rejected() {
        assert_eq!(parse_duration("999999999999999999m"), None);
        assert_eq!(
            parse_duration(&format!("{}m", u64::MAX / 60)),
            Some(Duration::from_secs(u64::MAX / 60 * 60))
        );

        let config = FleetConfig::parse("[poll]\ninterval = \"999999999999999999m\"").unwrap();
        assert!(matches!(config.poll_policy(), Err(ConfigError::Duration(_))));
    }
}
