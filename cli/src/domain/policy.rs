//! Timing and budget policy for the waiting stages.

use std::time::Duration;

use crate::domain::config::PollingConfig;

/// Immutable intervals and budgets handed to the services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Sleep between two task status reads.
    pub task_interval: Duration,
    /// Maximum number of address fetches.
    pub address_attempts: u32,
    /// Sleep between two address fetches.
    pub address_interval: Duration,
    /// Upper bound on a single TCP connect.
    pub probe_connect_timeout: Duration,
    /// Sleep after a transient probe failure.
    pub probe_retry_delay: Duration,
    /// Pause between a successful probe and the bootstrap hand-off.
    pub ready_settle: Duration,
    pub ssh_port: u16,
    /// `None` keeps probing until ready or canceled.
    pub max_probe_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&PollingConfig::default())
    }
}

impl From<&PollingConfig> for PollPolicy {
    fn from(cfg: &PollingConfig) -> Self {
        Self {
            task_interval: Duration::from_secs(cfg.task_interval_secs),
            address_attempts: cfg.address_attempts,
            address_interval: Duration::from_secs(cfg.address_interval_secs),
            probe_connect_timeout: Duration::from_secs(cfg.probe_connect_timeout_secs),
            probe_retry_delay: Duration::from_secs(cfg.probe_retry_delay_secs),
            ready_settle: Duration::from_secs(cfg.ready_settle_secs),
            ssh_port: cfg.ssh_port,
            max_probe_attempts: cfg.max_probe_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_uses_documented_timings() {
        let p = PollPolicy::default();
        assert_eq!(p.address_attempts, 200);
        assert_eq!(p.address_interval, Duration::from_secs(2));
        assert_eq!(p.probe_connect_timeout, Duration::from_secs(5));
        assert_eq!(p.probe_retry_delay, Duration::from_secs(2));
        assert_eq!(p.ssh_port, 22);
        assert!(p.max_probe_attempts.is_none());
    }

    #[test]
    fn policy_follows_config() {
        let cfg = PollingConfig {
            address_attempts: 5,
            ssh_port: 2222,
            max_probe_attempts: Some(3),
            ..PollingConfig::default()
        };
        let p = PollPolicy::from(&cfg);
        assert_eq!(p.address_attempts, 5);
        assert_eq!(p.ssh_port, 2222);
        assert_eq!(p.max_probe_attempts, Some(3));
    }
}
