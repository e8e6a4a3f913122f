//! Bootstrap hand-off parameters.

use std::path::PathBuf;

use crate::domain::request::{BootstrapSettings, ProvisioningRequest};

/// Fully resolved parameter set passed to the bootstrap collaborator.
///
/// Built field by field from the request; nothing is read from ambient state.
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapParams {
    pub host: String,
    pub node_name: String,
    pub run_list: Vec<String>,
    pub ssh_user: String,
    pub ssh_password: Option<String>,
    pub identity_file: Option<PathBuf>,
    pub distro: String,
    pub template_file: Option<PathBuf>,
    pub bootstrap_version: Option<String>,
    pub environment: Option<String>,
    /// Bootstrap runs as root; any other user goes through sudo.
    pub use_sudo: bool,
    pub no_host_key_verify: bool,
    pub protocol: Option<String>,
    pub proxy: Option<String>,
    pub first_boot_attributes: serde_json::Value,
}

impl BootstrapParams {
    #[must_use]
    pub fn for_node(host: &str, request: &ProvisioningRequest, settings: &BootstrapSettings) -> Self {
        Self {
            host: host.to_string(),
            node_name: settings
                .node_name
                .clone()
                .unwrap_or_else(|| request.name.clone()),
            run_list: settings.run_list.clone(),
            ssh_user: settings.ssh_user.clone(),
            ssh_password: settings.ssh_password.clone(),
            identity_file: settings.identity_file.clone(),
            distro: settings.distro.clone(),
            template_file: settings.template_file.clone(),
            bootstrap_version: settings.bootstrap_version.clone(),
            environment: settings.environment.clone(),
            use_sudo: settings.ssh_user != "root",
            no_host_key_verify: settings.no_host_key_verify,
            protocol: settings.protocol.clone(),
            proxy: settings.proxy.clone(),
            first_boot_attributes: settings.first_boot_attributes.clone(),
        }
    }
}
