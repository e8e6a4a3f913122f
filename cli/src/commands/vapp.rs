//! `vcprov vapp`: power, inspect and network a single vApp.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Subcommand};
use vcprov_common::FenceMode;

use crate::app::AppContext;
use crate::application::ports::{ProgressReporter, VappInspector};
use crate::application::services::task_poller::await_task;
use crate::application::services::{inventory, network, power, session};
use crate::domain::{PollPolicy, ProvisionError, VappNetworkConfig, VappNetworkSettings};

/// vApp subcommands.
#[derive(Subcommand)]
pub enum VappCommand {
    /// Power off a vApp and wait for it
    Stop {
        /// vApp id
        vapp_id: String,
    },
    /// Power on a vApp and wait for it
    Start {
        /// vApp id
        vapp_id: String,
    },
    /// Show name, status, VMs and addresses of a vApp
    Show {
        /// vApp id
        vapp_id: String,
    },
    /// Configure the vApp networks
    ConfigNetwork(ConfigNetworkArgs),
}

/// Arguments for `vapp config-network`.
#[derive(Args, Debug)]
pub struct ConfigNetworkArgs {
    /// vApp id
    pub vapp_id: String,

    /// First network to attach
    #[arg(long = "network-name")]
    pub network_name: String,

    /// Second network to attach
    #[arg(long = "network2-name")]
    pub network2_name: Option<String>,

    /// Fence mode of the first network
    #[arg(long = "fence-mode", value_enum, default_value_t = FenceMode::Bridged)]
    pub fence_mode: FenceMode,

    /// Fence mode of the second network
    #[arg(long = "fence2-mode", value_enum, default_value_t = FenceMode::Bridged)]
    pub fence2_mode: FenceMode,

    /// Keep the first network across deployments
    #[arg(long = "retain-net")]
    pub retain_net: bool,

    /// Keep the second network across deployments
    #[arg(long = "retain2-net")]
    pub retain2_net: bool,
}

impl ConfigNetworkArgs {
    #[must_use]
    pub fn to_config(&self) -> VappNetworkConfig {
        VappNetworkConfig {
            primary: VappNetworkSettings {
                network_name: Some(self.network_name.clone()),
                fence_mode: self.fence_mode,
                retain: self.retain_net,
            },
            secondary: VappNetworkSettings {
                network_name: self.network2_name.clone(),
                fence_mode: self.fence2_mode,
                retain: self.retain2_net,
            },
        }
    }
}

/// Run the vapp command.
///
/// # Errors
///
/// Returns an error if the session, the remote call or its task fails.
pub async fn run(app: &AppContext, cmd: VappCommand) -> Result<ExitCode> {
    let config = app.config()?;
    let client = app.vcloud(&config)?;
    let policy = PollPolicy::from(&config.polling);
    let reporter = app.reporter();
    let cancel = &app.cancel;

    match cmd {
        VappCommand::Stop { vapp_id } => {
            session::scoped(&client, async {
                reporter.step(&format!("Stopping vApp {vapp_id}..."));
                let current = client.get_vapp(&vapp_id).await.map_err(ProvisionError::Api)?;
                power::ensure_powered_off(&client, &current, &policy, cancel).await
            })
            .await??;
            app.renderer().render_action("powered off", &vapp_id)?;
        }
        VappCommand::Start { vapp_id } => {
            session::scoped(&client, async {
                reporter.step(&format!("Starting vApp {vapp_id}..."));
                power::power_on(&client, &vapp_id, &policy, cancel).await
            })
            .await??;
            app.renderer().render_action("powered on", &vapp_id)?;
        }
        VappCommand::Show { vapp_id } => {
            let vapp = session::scoped(&client, inventory::vapp_details(&client, &vapp_id)).await??;
            app.renderer().render_vapp(&vapp)?;
        }
        VappCommand::ConfigNetwork(args) => {
            let network = args.to_config();
            session::scoped(&client, async {
                reporter.step(&format!("Configuring networks of vApp {}...", args.vapp_id));
                let task = network::configure_vapp_network(&client, &args.vapp_id, &network).await?;
                await_task(&client, &task, policy.task_interval, cancel).await
            })
            .await??;
            app.renderer().render_action("network configured", &args.vapp_id)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
