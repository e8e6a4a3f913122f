//! Teardown pipeline: `Requested → Located → PoweredOff → Deleted → Done`.

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::application::ports::{InfrastructureApi, ProgressReporter};
use crate::application::services::power;
use crate::application::services::provision::Progress;
use crate::application::services::task_poller::await_task;
use crate::domain::{PollPolicy, ProvisionError, Stage, StageFailure, TeardownOutcome};

/// Locate the vApp named by `reference` (an id, or a name inside `vdc_id`),
/// power it off and delete it.
pub async fn teardown(
    api: &impl InfrastructureApi,
    reporter: &impl ProgressReporter,
    reference: &str,
    vdc_id: Option<&str>,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> TeardownOutcome {
    let mut progress = Progress::new();
    match drive(api, reporter, reference, vdc_id, policy, cancel, &mut progress).await {
        Ok(id) => TeardownOutcome::Deleted { vapp_id: id },
        Err(err) => {
            error!(stage = %progress.stage, error = %err, "teardown failed");
            // The usual guidance points back at `server delete`, so only the id is kept.
            let mut failure = StageFailure::new(progress.stage, &err, None);
            failure.vapp_id = progress.vapp_id;
            TeardownOutcome::Failed(failure)
        }
    }
}

async fn drive(
    api: &impl InfrastructureApi,
    reporter: &impl ProgressReporter,
    reference: &str,
    vdc_id: Option<&str>,
    policy: &PollPolicy,
    cancel: &CancellationToken,
    progress: &mut Progress,
) -> Result<String, ProvisionError> {
    if reference.trim().is_empty() {
        return Err(ProvisionError::InvalidRequest(
            "a vApp id or name is required".to_string(),
        ));
    }

    progress.enter(Stage::Located);
    reporter.step(&format!("Locating vApp {reference}..."));
    let vapp = api
        .find_vapp(reference, vdc_id)
        .await
        .with_context(|| format!("looking up vApp {reference}"))?
        .ok_or_else(|| ProvisionError::InvalidRequest(format!("no vApp matches '{reference}'")))?;
    let vapp_id = vapp.id.clone();
    progress.vapp_id = Some(vapp_id.clone());
    info!(reference, vapp_id, "vApp located");

    progress.enter(Stage::PoweredOff);
    reporter.step(&format!("Stopping vApp {vapp_id}..."));
    power::ensure_powered_off(api, &vapp, policy, cancel).await?;

    progress.enter(Stage::Deleted);
    reporter.step(&format!("Deleting vApp {vapp_id}..."));
    let task = api
        .delete_vapp(&vapp_id)
        .await
        .with_context(|| format!("deleting vApp {vapp_id}"))?;
    await_task(api, &task, policy.task_interval, cancel).await?;
    reporter.success(&format!("vApp {vapp_id} deleted"));
    Ok(vapp_id)
}
