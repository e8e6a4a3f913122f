//! Domain types and validators for vcprov configuration.
//!
//! Pure functions only, no filesystem access.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "connection.url",
    "connection.org",
    "connection.username",
    "connection.api_version",
    "connection.insecure",
    "connection.request_timeout_secs",
    "polling.task_interval_secs",
    "polling.address_attempts",
    "polling.address_interval_secs",
    "polling.probe_connect_timeout_secs",
    "polling.probe_retry_delay_secs",
    "polling.ready_settle_secs",
    "polling.ssh_port",
    "polling.max_probe_attempts",
    "bootstrap.knife_path",
    "bootstrap.distro",
    "bootstrap.ssh_user",
];

pub const DEFAULT_API_VERSION: &str = "5.5";
pub const DEFAULT_DISTRO: &str = "ubuntu10.04-gems";

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.vcprov/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct VcprovConfig {
    pub connection: ConnectionConfig,
    pub polling: PollingConfig,
    pub bootstrap: BootstrapConfig,
}

/// Control plane endpoint and credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConnectionConfig {
    pub url: Option<String>,
    pub org: Option<String>,
    pub username: Option<String>,
    /// Prefer `VCPROV_PASSWORD` over storing this on disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub api_version: String,
    /// Accept self-signed control plane certificates.
    pub insecure: bool,
    pub request_timeout_secs: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: None,
            org: None,
            username: None,
            password: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            insecure: false,
            request_timeout_secs: 60,
        }
    }
}

/// Intervals and budgets for the waiting stages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PollingConfig {
    pub task_interval_secs: u64,
    pub address_attempts: u32,
    pub address_interval_secs: u64,
    pub probe_connect_timeout_secs: u64,
    pub probe_retry_delay_secs: u64,
    pub ready_settle_secs: u64,
    pub ssh_port: u16,
    /// Unbounded when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_probe_attempts: Option<u32>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            task_interval_secs: 3,
            address_attempts: 200,
            address_interval_secs: 2,
            probe_connect_timeout_secs: 5,
            probe_retry_delay_secs: 2,
            ready_settle_secs: 10,
            ssh_port: 22,
            max_probe_attempts: None,
        }
    }
}

/// Defaults for the bootstrap hand-off.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BootstrapConfig {
    pub knife_path: String,
    pub distro: String,
    pub ssh_user: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            knife_path: "knife".to_string(),
            distro: DEFAULT_DISTRO.to_string(),
            ssh_user: "root".to_string(),
        }
    }
}

impl VcprovConfig {
    /// Copy with the password blanked out, for display.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.connection.password.is_some() {
            copy.connection.password = Some("********".to_string());
        }
        copy
    }

    /// Apply one whitelisted `key = value` pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not parse
    /// for that key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_config_key(key)?;
        validate_config_value(key, value)?;
        let c = &mut self.connection;
        let p = &mut self.polling;
        let b = &mut self.bootstrap;
        match key {
            "connection.url" => c.url = Some(value.trim_end_matches('/').to_string()),
            "connection.org" => c.org = Some(value.to_string()),
            "connection.username" => c.username = Some(value.to_string()),
            "connection.api_version" => c.api_version = value.to_string(),
            "connection.insecure" => c.insecure = parse(key, value, "true or false")?,
            "connection.request_timeout_secs" => {
                c.request_timeout_secs = parse(key, value, "seconds")?;
            }
            "polling.task_interval_secs" => p.task_interval_secs = parse(key, value, "seconds")?,
            "polling.address_attempts" => p.address_attempts = parse(key, value, "a count")?,
            "polling.address_interval_secs" => {
                p.address_interval_secs = parse(key, value, "seconds")?;
            }
            "polling.probe_connect_timeout_secs" => {
                p.probe_connect_timeout_secs = parse(key, value, "seconds")?;
            }
            "polling.probe_retry_delay_secs" => {
                p.probe_retry_delay_secs = parse(key, value, "seconds")?;
            }
            "polling.ready_settle_secs" => p.ready_settle_secs = parse(key, value, "seconds")?,
            "polling.ssh_port" => p.ssh_port = parse(key, value, "a TCP port")?,
            "polling.max_probe_attempts" => {
                p.max_probe_attempts = if value == "unbounded" {
                    None
                } else {
                    Some(parse(key, value, "a count or 'unbounded'")?)
                };
            }
            "bootstrap.knife_path" => b.knife_path = value.to_string(),
            "bootstrap.distro" => b.distro = value.to_string(),
            "bootstrap.ssh_user" => b.ssh_user = value.to_string(),
            _ => {
                return Err(ConfigError::UnknownKey {
                    key: key.to_string(),
                    valid: VALID_CONFIG_KEYS.join(", "),
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Connection values taken from `VCPROV_*` environment variables.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct EnvOverrides {
    pub url: Option<String>,
    pub org: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl EnvOverrides {
    /// Overlay the set variables onto `config`.
    #[must_use]
    pub fn apply(&self, mut config: VcprovConfig) -> VcprovConfig {
        let c = &mut config.connection;
        for (slot, value) in [
            (&mut c.url, &self.url),
            (&mut c.org, &self.org),
            (&mut c.username, &self.username),
            (&mut c.password, &self.password),
        ] {
            if let Some(v) = value.as_ref().filter(|v| !v.is_empty()) {
                *slot = Some(v.clone());
            }
        }
        config
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str, expected: &str) -> Result<T> {
    value.parse().map_err(|_| {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            expected: expected.to_string(),
        }
        .into()
    })
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    let invalid = |expected: &str| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected: expected.to_string(),
    };
    match key {
        "connection.url" if !(value.starts_with("https://") || value.starts_with("http://")) => {
            Err(invalid("an http(s) URL").into())
        }
        "polling.address_attempts" | "polling.task_interval_secs" if value == "0" => {
            Err(invalid("a value greater than zero").into())
        }
        "polling.max_probe_attempts" if value == "0" => {
            Err(invalid("a count greater than zero or 'unbounded'").into())
        }
        _ if value.trim().is_empty() => Err(invalid("a non-empty value").into()),
        _ => Ok(()),
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
