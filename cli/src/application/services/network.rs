//! Network configuration at VM and vApp level.

use anyhow::Context;
use tracing::info;

use crate::application::ports::{VappLifecycle, VmConfigurator};
use crate::domain::{ProvisionError, VappNetworkConfig, VmNetworkConfig};

/// Issue one reconfiguration request covering every configured NIC of `vm_id`.
///
/// A NIC-2 slot without a network name is dropped before the request is
/// built. The VM's vApp must already be powered off.
///
/// # Errors
///
/// Returns `InvalidRequest` if NIC-1 is incomplete, or `Api` if the control
/// plane rejects the request.
pub async fn configure_vm_network(
    api: &impl VmConfigurator,
    vm_id: &str,
    config: &VmNetworkConfig,
) -> Result<String, ProvisionError> {
    let config = config.normalized()?;
    info!(
        vm_id,
        nic1 = config.primary_network(),
        nic2 = config.secondary_network(),
        "configuring VM network"
    );
    let task = api
        .set_vm_network_config(vm_id, &config)
        .await
        .with_context(|| format!("configuring network of VM {vm_id}"))?;
    Ok(task)
}

/// Issue the vApp-level network request (parent network, fence mode, retain).
///
/// # Errors
///
/// Returns `InvalidRequest` when neither slot names a network, or `Api` if
/// the control plane rejects the request.
pub async fn configure_vapp_network(
    api: &impl VappLifecycle,
    vapp_id: &str,
    config: &VappNetworkConfig,
) -> Result<String, ProvisionError> {
    if config.primary.network_name.is_none() && config.secondary.network_name.is_none() {
        return Err(ProvisionError::InvalidRequest(
            "no network name given for the vApp".to_string(),
        ));
    }
    info!(vapp_id, "configuring vApp network");
    let task = api
        .set_vapp_network_config(vapp_id, config)
        .await
        .with_context(|| format!("configuring network of vApp {vapp_id}"))?;
    Ok(task)
}
