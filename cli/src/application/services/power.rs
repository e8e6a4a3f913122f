//! Power transitions with task completion and state verification.

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::info;
use vcprov_common::{PowerState, VApp};

use crate::application::ports::{TaskTracker, VappInspector, VappLifecycle};
use crate::application::services::cancel::or_cancel;
use crate::application::services::task_poller::await_task;
use crate::domain::{PollPolicy, ProvisionError};

/// Bring `current` to `PoweredOff` and return the re-fetched snapshot.
///
/// No power-off is issued when `current` already reports `PoweredOff`.
///
/// # Errors
///
/// - `TaskFailed` / `Canceled` / `Api` from the power-off task
/// - `PreconditionViolation` if the vApp is still not off afterwards
pub async fn ensure_powered_off(
    api: &(impl VappLifecycle + VappInspector + TaskTracker),
    current: &VApp,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<VApp, ProvisionError> {
    let vapp_id = current.id.as_str();
    if current.status == PowerState::PoweredOff {
        info!(vapp_id, "vApp already powered off");
        return Ok(current.clone());
    }

    let task = api
        .power_off_vapp(vapp_id)
        .await
        .with_context(|| format!("powering off vApp {vapp_id}"))?;
    await_task(api, &task, policy.task_interval, cancel).await?;

    let vapp = or_cancel(cancel, api.get_vapp(vapp_id))
        .await?
        .with_context(|| format!("fetching vApp {vapp_id}"))?;
    if vapp.status != PowerState::PoweredOff {
        return Err(ProvisionError::PreconditionViolation(format!(
            "vApp {vapp_id} reports {} after power-off",
            vapp.status.label()
        )));
    }
    info!(vapp_id, "vApp powered off");
    Ok(vapp)
}

/// Power on `vapp_id` and wait for the task.
///
/// # Errors
///
/// `TaskFailed` / `Canceled` / `Api` from the power-on task.
pub async fn power_on(
    api: &(impl VappLifecycle + TaskTracker),
    vapp_id: &str,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<(), ProvisionError> {
    let task = api
        .power_on_vapp(vapp_id)
        .await
        .with_context(|| format!("powering on vApp {vapp_id}"))?;
    await_task(api, &task, policy.task_interval, cancel).await?;
    info!(vapp_id, "vApp powered on");
    Ok(())
}
