//! `vcprov server`: provision a vApp end to end, or tear one down.

use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use vcprov_common::{AllocationMode, FenceMode};

use crate::app::AppContext;
use crate::application::services::provision::Orchestrator;
use crate::application::services::{session, teardown};
use crate::domain::config::BootstrapConfig;
use crate::domain::request::parse_run_list;
use crate::domain::{
    BootstrapSettings, NicSettings, PollPolicy, ProvisionError, ProvisioningOutcome,
    ProvisioningRequest, Stage, StageFailure, TeardownOutcome, VappNetworkConfig,
    VappNetworkSettings, VmNetworkConfig,
};
use crate::infra::bootstrap::KnifeBootstrap;
use crate::infra::tcp::TokioDialer;

/// Server subcommands.
#[derive(Subcommand)]
pub enum ServerCommand {
    /// Create a vApp from a template, configure it and bootstrap it
    Create(Box<CreateArgs>),
    /// Power off and delete a vApp
    Delete(DeleteArgs),
}

/// Arguments for `server create`.
#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    /// VDC to create the vApp in
    #[arg(long = "vdc-id")]
    pub vdc_id: String,

    /// vApp name; also the guest computer name and default node name
    #[arg(long = "node-name", short = 'N')]
    pub node_name: String,

    /// vApp description
    #[arg(long, default_value = "")]
    pub description: String,

    /// vApp template id to instantiate
    #[arg(long = "template", short = 'I')]
    pub template_id: String,

    /// Number of virtual CPUs
    #[arg(long)]
    pub vcpus: Option<u32>,

    /// Memory in MB
    #[arg(long)]
    pub memory: Option<u32>,

    /// Disable guest customization
    #[arg(long = "no-guest")]
    pub no_guest: bool,

    #[command(flatten)]
    pub network: NetworkArgs,

    #[command(flatten)]
    pub bootstrap: BootstrapArgs,
}

/// NIC and vApp network options for both network slots.
#[derive(Args, Debug, Clone, Default)]
pub struct NetworkArgs {
    /// Network for the first NIC
    #[arg(long = "network-name")]
    pub network_name: Option<String>,

    /// Network for the second NIC
    #[arg(long = "network2-name")]
    pub network2_name: Option<String>,

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

    /// Fence mode of the first vApp network
    #[arg(long = "fence-mode", value_enum, default_value_t = FenceMode::Bridged)]
    pub fence_mode: FenceMode,

    /// Fence mode of the second vApp network
    #[arg(long = "fence2-mode", value_enum, default_value_t = FenceMode::Bridged)]
    pub fence2_mode: FenceMode,

    /// Keep the first vApp network across deployments
    #[arg(long = "retain-net")]
    pub retain_net: bool,

    /// Keep the second vApp network across deployments
    #[arg(long = "retain2-net")]
    pub retain2_net: bool,
}

impl NetworkArgs {
    #[must_use]
    pub fn vm_network(&self) -> VmNetworkConfig {
        VmNetworkConfig {
            primary_index: self.primary_index,
            nic1: NicSettings {
                network_name: self.network_name.clone(),
                index: self.network_index,
                ip: self.ip,
                connected: !self.network_disconnected,
                allocation: self.allocation_mode,
            },
            nic2: self.network2_name.as_ref().map(|name| NicSettings {
                network_name: Some(name.clone()),
                index: self.network2_index,
                ip: self.ip2,
                connected: !self.network2_disconnected,
                allocation: self.allocation2_mode,
            }),
        }
    }

    #[must_use]
    pub fn vapp_network(&self) -> VappNetworkConfig {
        VappNetworkConfig {
            primary: VappNetworkSettings {
                network_name: self.network_name.clone(),
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

/// Configuration-management hand-off options.
#[derive(Args, Debug, Clone, Default)]
pub struct BootstrapArgs {
    /// Stop once the vApp has an address
    #[arg(long = "no-bootstrap")]
    pub no_bootstrap: bool,

    /// Node name to register; defaults to the vApp name
    #[arg(long = "chef-node-name")]
    pub chef_node_name: Option<String>,

    /// Comma separated list of roles/recipes
    #[arg(long = "run-list", short = 'r')]
    pub run_list: Option<String>,

    /// Bootstrap template distro
    #[arg(long, short = 'd')]
    pub distro: Option<String>,

    /// Full path to a bootstrap template
    #[arg(long = "template-file")]
    pub template_file: Option<PathBuf>,

    /// SSH user
    #[arg(long = "ssh-user", short = 'x')]
    pub ssh_user: Option<String>,

    /// SSH password. It is passed to knife on the command line, where other
    /// local users can read it from the process list; prefer --identity-file.
    #[arg(long = "ssh-password", short = 'P', env = "VCPROV_SSH_PASSWORD", hide_env_values = true)]
    pub ssh_password: Option<String>,

    /// SSH identity file
    #[arg(long = "identity-file", short = 'i')]
    pub identity_file: Option<PathBuf>,

    /// Version of the configuration client to install
    #[arg(long = "bootstrap-version")]
    pub bootstrap_version: Option<String>,

    /// Configuration environment of the node
    #[arg(long, short = 'E')]
    pub environment: Option<String>,

    /// Skip SSH host key verification
    #[arg(long = "no-host-key-verify")]
    pub no_host_key_verify: bool,

    /// Bootstrap protocol
    #[arg(long = "bootstrap-protocol")]
    pub bootstrap_protocol: Option<String>,

    /// Proxy used during bootstrap
    #[arg(long = "bootstrap-proxy")]
    pub bootstrap_proxy: Option<String>,

    /// JSON attributes for the first configuration run
    #[arg(long = "json-attributes", short = 'j')]
    pub json_attributes: Option<String>,
}

impl BootstrapArgs {
    /// `None` when bootstrapping is disabled. Distro and SSH user fall back
    /// to the configured defaults.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if the JSON attributes do not parse.
    pub fn settings(&self, defaults: &BootstrapConfig) -> Result<Option<BootstrapSettings>, ProvisionError> {
        if self.no_bootstrap {
            return Ok(None);
        }
        let first_boot_attributes = match &self.json_attributes {
            Some(raw) => serde_json::from_str(raw).map_err(|e| {
                ProvisionError::InvalidRequest(format!("invalid --json-attributes: {e}"))
            })?,
            None => serde_json::Value::Object(serde_json::Map::new()),
        };
        Ok(Some(BootstrapSettings {
            node_name: self.chef_node_name.clone(),
            run_list: self.run_list.as_deref().map(parse_run_list).unwrap_or_default(),
            ssh_user: self.ssh_user.clone().unwrap_or_else(|| defaults.ssh_user.clone()),
            ssh_password: self.ssh_password.clone(),
            identity_file: self.identity_file.clone(),
            distro: self.distro.clone().unwrap_or_else(|| defaults.distro.clone()),
            template_file: self.template_file.clone(),
            bootstrap_version: self.bootstrap_version.clone(),
            environment: self.environment.clone(),
            no_host_key_verify: self.no_host_key_verify,
            protocol: self.bootstrap_protocol.clone(),
            proxy: self.bootstrap_proxy.clone(),
            first_boot_attributes,
        }))
    }
}

impl CreateArgs {
    /// # Errors
    ///
    /// Returns `InvalidRequest` if the bootstrap options are malformed.
    pub fn to_request(&self, defaults: &BootstrapConfig) -> Result<ProvisioningRequest, ProvisionError> {
        let mut request = ProvisioningRequest::new(&self.vdc_id, &self.node_name, &self.template_id);
        request.description.clone_from(&self.description);
        request.cpus = self.vcpus;
        request.memory_mb = self.memory;
        request.guest_customization = !self.no_guest;
        request.vm_network = self.network.vm_network();
        request.vapp_network = self.network.vapp_network();
        request.bootstrap = self.bootstrap.settings(defaults)?;
        Ok(request)
    }
}

/// Arguments for `server delete`.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// vApp id, or name when `--vdc-id` is given
    pub vapp: String,

    /// VDC used to resolve a vApp name
    #[arg(long = "vdc-id")]
    pub vdc_id: Option<String>,
}

/// Run the server command.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded, the client cannot be
/// built, or output fails. Pipeline failures are rendered, not returned.
pub async fn run(app: &AppContext, cmd: ServerCommand) -> Result<ExitCode> {
    match cmd {
        ServerCommand::Create(args) => create(app, &args).await,
        ServerCommand::Delete(args) => delete(app, &args).await,
    }
}

async fn create(app: &AppContext, args: &CreateArgs) -> Result<ExitCode> {
    let config = app.config()?;
    let request = match args
        .to_request(&config.bootstrap)
        .and_then(|r| r.validate().map(|()| r))
    {
        Ok(request) => request,
        Err(err) => {
            let failure = StageFailure::new(Stage::Requested, &err, None);
            return finish_failure(app, &failure);
        }
    };
    let client = app.vcloud(&config)?;
    let reporter = app.reporter();
    let knife = KnifeBootstrap::new(&app.runner, config.bootstrap.knife_path.clone());
    let orchestrator = Orchestrator {
        api: &client,
        dialer: &TokioDialer,
        bootstrapper: &knife,
        reporter: &reporter,
        policy: PollPolicy::from(&config.polling),
        cancel: app.cancel.clone(),
    };

    let outcome = session::scoped(&client, orchestrator.provision(&request))
        .await
        .unwrap_or_else(|e| {
            ProvisioningOutcome::Failed(StageFailure::new(
                Stage::Requested,
                &ProvisionError::Api(e),
                None,
            ))
        });

    match outcome {
        ProvisioningOutcome::Provisioned(done) => {
            app.renderer().render_provisioned(&done)?;
            Ok(ExitCode::SUCCESS)
        }
        ProvisioningOutcome::Failed(failure) => finish_failure(app, &failure),
    }
}

async fn delete(app: &AppContext, args: &DeleteArgs) -> Result<ExitCode> {
    let config = app.config()?;
    let client = app.vcloud(&config)?;
    let reporter = app.reporter();
    let policy = PollPolicy::from(&config.polling);

    let outcome = session::scoped(
        &client,
        teardown::teardown(
            &client,
            &reporter,
            &args.vapp,
            args.vdc_id.as_deref(),
            &policy,
            &app.cancel,
        ),
    )
    .await
    .context("cannot open a session")?;

    match outcome {
        TeardownOutcome::Deleted { vapp_id } => {
            app.renderer().render_action("deleted", &vapp_id)?;
            Ok(ExitCode::SUCCESS)
        }
        TeardownOutcome::Failed(failure) => finish_failure(app, &failure),
    }
}

fn finish_failure(app: &AppContext, failure: &StageFailure) -> Result<ExitCode> {
    app.renderer().render_failure(failure)?;
    Ok(ExitCode::FAILURE)
}
