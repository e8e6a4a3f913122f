//! CPU and memory resizing of a single VM.

use anyhow::Context;
use tracing::info;

use crate::application::ports::VmConfigurator;
use crate::domain::ProvisionError;

/// # Errors
///
/// Returns `InvalidRequest` for a zero count, or `Api` if the control plane
/// rejects the request.
pub async fn resize_cpu(
    api: &impl VmConfigurator,
    vm_id: &str,
    count: u32,
) -> Result<String, ProvisionError> {
    if count == 0 {
        return Err(ProvisionError::InvalidRequest(
            "CPU count must be at least 1".to_string(),
        ));
    }
    info!(vm_id, count, "resizing CPUs");
    let task = api
        .set_vm_cpus(vm_id, count)
        .await
        .with_context(|| format!("setting CPU count of VM {vm_id}"))?;
    Ok(task)
}

/// # Errors
///
/// Returns `InvalidRequest` for a zero size, or `Api` if the control plane
/// rejects the request.
pub async fn resize_ram(
    api: &impl VmConfigurator,
    vm_id: &str,
    megabytes: u32,
) -> Result<String, ProvisionError> {
    if megabytes == 0 {
        return Err(ProvisionError::InvalidRequest(
            "memory must be at least 1 MB".to_string(),
        ));
    }
    info!(vm_id, megabytes, "resizing memory");
    let task = api
        .set_vm_ram(vm_id, megabytes)
        .await
        .with_context(|| format!("setting memory of VM {vm_id}"))?;
    Ok(task)
}
