//! Immutable request structs built once at the command boundary.
//!
//! Pure data and validation, no I/O.

use std::net::IpAddr;
use std::path::PathBuf;

use vcprov_common::{AllocationMode, FenceMode};

use crate::domain::error::ProvisionError;

// ── VM-level NIC configuration ───────────────────────────────────────────────

/// Settings for one VM network interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NicSettings {
    /// Org/vApp network the NIC attaches to. A NIC without a network is
    /// left untouched.
    pub network_name: Option<String>,
    /// Interface index inside the VM.
    pub index: Option<u32>,
    /// Static address, required when `allocation` is `Static`.
    pub ip: Option<IpAddr>,
    pub connected: bool,
    pub allocation: AllocationMode,
}

impl Default for NicSettings {
    fn default() -> Self {
        Self {
            network_name: None,
            index: None,
            ip: None,
            connected: true,
            allocation: AllocationMode::Pool,
        }
    }
}

impl NicSettings {
    /// NIC attached to `network` with pool allocation.
    #[must_use]
    pub fn on(network: &str) -> Self {
        Self {
            network_name: Some(network.to_string()),
            ..Self::default()
        }
    }

    fn validate(&self, slot: &str) -> Result<(), ProvisionError> {
        if self.allocation.requires_address() && self.ip.is_none() {
            return Err(ProvisionError::InvalidRequest(format!(
                "{slot} uses STATIC allocation but no address was given"
            )));
        }
        Ok(())
    }
}

/// Per-VM network configuration covering up to two NICs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VmNetworkConfig {
    /// Index of the interface used as the VM's primary connection.
    pub primary_index: Option<u32>,
    pub nic1: NicSettings,
    pub nic2: Option<NicSettings>,
}

impl VmNetworkConfig {
    /// Check NIC-1 is usable and drop a NIC-2 slot that names no network.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if NIC-1 has no network, or if either NIC
    /// asks for static allocation without an address.
    pub fn normalized(&self) -> Result<Self, ProvisionError> {
        if self
            .nic1
            .network_name
            .as_deref()
            .is_none_or(|n| n.trim().is_empty())
        {
            return Err(ProvisionError::InvalidRequest(
                "NIC-1 requires a network name".to_string(),
            ));
        }
        self.nic1.validate("NIC-1")?;

        let nic2 = match &self.nic2 {
            Some(nic) if nic.network_name.as_deref().is_some_and(|n| !n.trim().is_empty()) => {
                nic.validate("NIC-2")?;
                Some(nic.clone())
            }
            _ => None,
        };

        Ok(Self {
            primary_index: self.primary_index,
            nic1: self.nic1.clone(),
            nic2,
        })
    }

    #[must_use]
    pub fn primary_network(&self) -> Option<&str> {
        self.nic1.network_name.as_deref()
    }

    #[must_use]
    pub fn secondary_network(&self) -> Option<&str> {
        self.nic2.as_ref().and_then(|n| n.network_name.as_deref())
    }
}

// ── vApp-level network configuration ─────────────────────────────────────────

/// vApp network settings for one parent network. Each NIC slot has its own
/// fence mode and retain flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VappNetworkSettings {
    pub network_name: Option<String>,
    pub fence_mode: FenceMode,
    /// Keep the network allocated across deployments.
    pub retain: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VappNetworkConfig {
    pub primary: VappNetworkSettings,
    pub secondary: VappNetworkSettings,
}

// ── Bootstrap settings ───────────────────────────────────────────────────────

/// Everything the bootstrap step needs besides the host address.
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapSettings {
    /// Node name registered with the configuration server; defaults to the
    /// vApp name.
    pub node_name: Option<String>,
    pub run_list: Vec<String>,
    pub ssh_user: String,
    pub ssh_password: Option<String>,
    pub identity_file: Option<PathBuf>,
    pub distro: String,
    pub template_file: Option<PathBuf>,
    pub bootstrap_version: Option<String>,
    pub environment: Option<String>,
    pub no_host_key_verify: bool,
    pub protocol: Option<String>,
    pub proxy: Option<String>,
    /// Opaque JSON handed to the first configuration run.
    pub first_boot_attributes: serde_json::Value,
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self {
            node_name: None,
            run_list: Vec::new(),
            ssh_user: "root".to_string(),
            ssh_password: None,
            identity_file: None,
            distro: "ubuntu10.04-gems".to_string(),
            template_file: None,
            bootstrap_version: None,
            environment: None,
            no_host_key_verify: false,
            protocol: None,
            proxy: None,
            first_boot_attributes: serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}

/// Split a run list given as one string on commas and whitespace.
#[must_use]
pub fn parse_run_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ── Provisioning request ─────────────────────────────────────────────────────

/// A fully resolved request to provision one vApp.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisioningRequest {
    /// Target VDC (resource pool) id.
    pub vdc_id: String,
    pub name: String,
    pub description: String,
    pub template_id: String,
    pub cpus: Option<u32>,
    pub memory_mb: Option<u32>,
    pub vapp_network: VappNetworkConfig,
    pub vm_network: VmNetworkConfig,
    pub guest_customization: bool,
    /// `None` stops the run once an address is known.
    pub bootstrap: Option<BootstrapSettings>,
}

impl ProvisioningRequest {
    /// Request with no resizing, no NICs, guest customization on and
    /// bootstrap off.
    #[must_use]
    pub fn new(vdc_id: &str, name: &str, template_id: &str) -> Self {
        Self {
            vdc_id: vdc_id.to_string(),
            name: name.to_string(),
            description: String::new(),
            template_id: template_id.to_string(),
            cpus: None,
            memory_mb: None,
            vapp_network: VappNetworkConfig::default(),
            vm_network: VmNetworkConfig::default(),
            guest_customization: true,
            bootstrap: None,
        }
    }

    /// Check the identifiers and sizes before any remote call is made.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` naming the first offending field.
    pub fn validate(&self) -> Result<(), ProvisionError> {
        for (field, value) in [
            ("VDC id", &self.vdc_id),
            ("name", &self.name),
            ("template id", &self.template_id),
        ] {
            if value.trim().is_empty() {
                return Err(ProvisionError::InvalidRequest(format!("{field} is required")));
            }
        }
        if self.cpus == Some(0) {
            return Err(ProvisionError::InvalidRequest(
                "CPU count must be at least 1".to_string(),
            ));
        }
        if self.memory_mb == Some(0) {
            return Err(ProvisionError::InvalidRequest(
                "memory must be at least 1 MB".to_string(),
            ));
        }
        self.vm_network.normalized().map(|_| ())
    }

    #[must_use]
    pub fn bootstrap_enabled(&self) -> bool {
        self.bootstrap.is_some()
    }
}
