use std::time::Duration;

use fleet_core::{FleetScope, PollPolicy};
use fleetgrid_client::ClusterClient;
use fleetgrid_poller::{FleetPoller, PollError};

use crate::ScopeArgs;
use crate::settings::Settings;

pub fn wait(
    settings: &Settings,
    args: &ScopeArgs,
    max_attempts: Option<u32>,
    interval: Option<Duration>,
) -> anyhow::Result<()> {
    let policy = override_policy(settings.policy, max_attempts, interval)?;
    let client = settings.client()?;
    let scope = settings.scope(args);
    run_poller(settings, &client, &scope, policy)
}

/// Poll `scope` until it settles, reporting the result on stdout.
pub(crate) fn run_poller(
    settings: &Settings,
    client: &ClusterClient,
    scope: &FleetScope,
    policy: PollPolicy,
) -> anyhow::Result<()> {
    println!("{}", banner(scope, &policy));
    let mut poller = FleetPoller::new(policy).with_status_table(settings.table.clone());
    match poller.wait(scope, client.fleet_query(scope)) {
        Ok(settled) => {
            println!(
                "✓ {} nodes settled after {} attempts",
                settled.fleet.len(),
                settled.attempts
            );
            Ok(())
        }
        Err(e @ PollError::FleetFailure { .. }) => {
            eprintln!("Run `fleet cleanup` to terminate the failed nodes.");
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

fn banner(scope: &FleetScope, policy: &PollPolicy) -> String {
    format!(
        "Waiting for {scope} (up to {} attempts, every {:?}, at most {:?})",
        policy.max_attempts(),
        policy.interval(),
        policy.max_wait()
    )
}

fn override_policy(
    base: PollPolicy,
    max_attempts: Option<u32>,
    interval: Option<Duration>,
) -> anyhow::Result<PollPolicy> {
    Ok(PollPolicy::new(
        max_attempts.unwrap_or(base.max_attempts()),
        interval.unwrap_or(base.interval()),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_configured_policy() {
        let base = PollPolicy::new(600, Duration::from_secs(10)).unwrap();
        let policy = override_policy(base, Some(3), None).unwrap();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.interval(), Duration::from_secs(10));

        let policy = override_policy(base, None, Some(Duration::from_millis(250))).unwrap();
        assert_eq!(policy.max_attempts(), 600);
        assert_eq!(policy.interval(), Duration::from_millis(250));
    }

    #[test]
    fn banner_shows_budget_and_longest_wait() {
        let policy = PollPolicy::new(3, Duration::from_secs(10)).unwrap();
        let scope = FleetScope::cluster("apiTest").with_node_array("execute");
        assert_eq!(
            banner(&scope, &policy),
            "Waiting for apiTest/execute (up to 3 attempts, every 10s, at most 20s)"
        );
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let base = PollPolicy::new(600, Duration::from_secs(10)).unwrap();
        assert!(override_policy(base, Some(0), None).is_err());
    }
}
