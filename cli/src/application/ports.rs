//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and `vcprov_common`, never
//! from `crate::infra`, `crate::commands`, or `crate::output`.

use std::path::PathBuf;
use std::process::ExitStatus;

use anyhow::Result;
use vcprov_common::{TaskSnapshot, VApp, VdcSummary};

use crate::domain::{BootstrapParams, VappNetworkConfig, VcprovConfig, VmNetworkConfig};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Identifiers returned by the template instantiation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedVapp {
    pub vapp_id: String,
    pub task_id: String,
}

// ── Infrastructure API Ports ──────────────────────────────────────────────────

/// Session bracket with the control plane.
#[allow(async_fn_in_trait)]
pub trait Session {
    async fn login(&self) -> Result<()>;
    async fn logout(&self) -> Result<()>;
}

/// vApp create, power and delete operations. Each returns a task id.
#[allow(async_fn_in_trait)]
pub trait VappLifecycle {
    /// Instantiate `template_id` into VDC `vdc_id` as a new vApp.
    async fn create_vapp_from_template(
        &self,
        vdc_id: &str,
        name: &str,
        description: &str,
        template_id: &str,
        network: &VappNetworkConfig,
    ) -> Result<CreatedVapp>;
    async fn power_off_vapp(&self, vapp_id: &str) -> Result<String>;
    async fn power_on_vapp(&self, vapp_id: &str) -> Result<String>;
    async fn delete_vapp(&self, vapp_id: &str) -> Result<String>;
    /// vApp-level network settings (parent network, fence mode, retain).
    async fn set_vapp_network_config(
        &self,
        vapp_id: &str,
        network: &VappNetworkConfig,
    ) -> Result<String>;
}

/// Read-only snapshots of vApps and VDCs.
#[allow(async_fn_in_trait)]
pub trait VappInspector {
    /// Full snapshot: power state, VM map, assigned addresses.
    async fn get_vapp(&self, vapp_id: &str) -> Result<VApp>;
    /// Resolve a vApp by id, or by name inside `vdc_id` when given.
    async fn find_vapp(&self, reference: &str, vdc_id: Option<&str>) -> Result<Option<VApp>>;
    async fn get_vdc(&self, vdc_id: &str) -> Result<VdcSummary>;
}

/// Per-VM reconfiguration. Each call returns a task id.
#[allow(async_fn_in_trait)]
pub trait VmConfigurator {
    /// One reconfiguration request covering every NIC in `config`.
    async fn set_vm_network_config(&self, vm_id: &str, config: &VmNetworkConfig)
    -> Result<String>;
    async fn set_vm_guest_customization(
        &self,
        vm_id: &str,
        computer_name: &str,
        enabled: bool,
    ) -> Result<String>;
    async fn set_vm_cpus(&self, vm_id: &str, count: u32) -> Result<String>;
    async fn set_vm_ram(&self, vm_id: &str, megabytes: u32) -> Result<String>;
}

/// Task status reads.
#[allow(async_fn_in_trait)]
pub trait TaskTracker {
    async fn task_status(&self, task_id: &str) -> Result<TaskSnapshot>;
}

/// Composite trait: any type implementing all five sub-traits is an
/// `InfrastructureApi`.
pub trait InfrastructureApi:
    Session + VappLifecycle + VappInspector + VmConfigurator + TaskTracker
{
}

impl<T> InfrastructureApi for T where
    T: Session + VappLifecycle + VappInspector + VmConfigurator + TaskTracker
{
}

// ── Readiness Probe Ports ─────────────────────────────────────────────────────

/// An open TCP connection that can wait for a server banner.
///
/// Dropping the value closes the connection.
#[allow(async_fn_in_trait)]
pub trait BannerStream {
    /// Read whatever the server sends first. `Ok(0)` means the peer closed.
    async fn read_banner(&mut self) -> std::io::Result<usize>;
}

/// Opens TCP connections for the readiness probe.
#[allow(async_fn_in_trait)]
pub trait PortDialer {
    type Conn: BannerStream;
    async fn connect(&self, host: &str, port: u16) -> std::io::Result<Self::Conn>;
}

// ── Bootstrap Port ────────────────────────────────────────────────────────────

/// Hands a reachable machine to configuration management.
#[allow(async_fn_in_trait)]
pub trait Bootstrapper {
    async fn bootstrap(&self, params: &BootstrapParams) -> Result<()>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program with inherited stdio and return only its exit status.
    async fn run_status(&self, program: &str, args: &[&str]) -> Result<ExitStatus>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Configuration Port ────────────────────────────────────────────────────────

/// Loads and persists `VcprovConfig`.
pub trait ConfigStore {
    /// Load the configuration, falling back to defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    fn load(&self) -> Result<VcprovConfig>;
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn save(&self, config: &VcprovConfig) -> Result<()>;
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    fn path(&self) -> Result<PathBuf>;
}
