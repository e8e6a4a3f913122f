//! `vcprov vm`: per-VM configuration.

use std::net::IpAddr;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Subcommand};
use vcprov_common::AllocationMode;

use crate::app::AppContext;
use crate::application::ports::ProgressReporter;
use crate::application::services::task_poller::await_task;
use crate::application::services::{network, session};
use crate::domain::{NicSettings, PollPolicy, VmNetworkConfig};

/// VM subcommands.
#[derive(Subcommand)]
pub enum VmCommand {
    /// Attach the VM's NICs to one or two networks
    ConfigNetwork(VmNetworkArgs),
}

/// Arguments for `vm config-network`.
#[derive(Args, Debug)]
pub struct VmNetworkArgs {
    /// VM id
    pub vm_id: String,

    /// Network for the first NIC
    pub network: String,

    /// Network for the second NIC
    pub network2: Option<String>,

    /// Index of the primary NIC
    #[arg(long = "primary-index")]
    pub primary_index: Option<u32>,

    /// Interface index of the first NIC
    #[arg(long = "network-index")]
    pub network_index: Option<u32>,

    /// Interface index of the second NIC
    #[arg(long = "network2-index")]
    pub network2_index: Option<u32>,

    /// Static address of the first NIC
    #[arg(long)]
    pub ip: Option<IpAddr>,

    /// Static address of the second NIC
    #[arg(long)]
    pub ip2: Option<IpAddr>,

    /// Leave the first NIC disconnected
    #[arg(long = "network-disconnected")]
    pub network_disconnected: bool,

    /// Leave the second NIC disconnected
    #[arg(long = "network2-disconnected")]
    pub network2_disconnected: bool,

    /// Address allocation of the first NIC
    #[arg(long = "allocation-mode", value_enum, default_value_t = AllocationMode::Pool)]
    pub allocation_mode: AllocationMode,

    /// Address allocation of the second NIC
    #[arg(long = "allocation2-mode", value_enum, default_value_t = AllocationMode::Pool)]
    pub allocation2_mode: AllocationMode,
}

impl VmNetworkArgs {
    #[must_use]
    pub fn to_config(&self) -> VmNetworkConfig {
        VmNetworkConfig {
            primary_index: self.primary_index,
            nic1: NicSettings {
                index: self.network_index,
                ip: self.ip,
                connected: !self.network_disconnected,
                allocation: self.allocation_mode,
                ..NicSettings::on(&self.network)
            },
            nic2: self.network2.as_deref().map(|name| NicSettings {
                index: self.network2_index,
                ip: self.ip2,
                connected: !self.network2_disconnected,
                allocation: self.allocation2_mode,
                ..NicSettings::on(name)
            }),
        }
    }
}

/// Run the vm command.
///
/// # Errors
///
/// Returns an error if the NIC settings are invalid or the remote task fails.
pub async fn run(app: &AppContext, cmd: VmCommand) -> Result<ExitCode> {
    let VmCommand::ConfigNetwork(args) = cmd;
    let config = app.config()?;
    let client = app.vcloud(&config)?;
    let policy = PollPolicy::from(&config.polling);
    let reporter = app.reporter();
    let nics = args.to_config();

    session::scoped(&client, async {
        reporter.step(&format!("Configuring NICs of VM {}...", args.vm_id));
        let task = network::configure_vm_network(&client, &args.vm_id, &nics).await?;
        await_task(&client, &task, policy.task_interval, &app.cancel).await
    })
    .await??;
    app.renderer().render_action("network configured", &args.vm_id)?;
    Ok(ExitCode::SUCCESS)
}
