//! Waits for an infrastructure task to reach a terminal status.
//!
//! The task resource does not carry the updated vApp, so callers re-fetch
//! authoritative state once `await_task` returns.

use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use vcprov_common::TaskStatus;

use crate::application::ports::TaskTracker;
use crate::application::services::cancel::{or_cancel, sleep_or_cancel};
use crate::domain::ProvisionError;

/// Poll `task_id` every `interval` until it succeeds, fails or is canceled.
///
/// The first read happens immediately. No read is issued after a terminal
/// status is seen.
///
/// # Errors
///
/// - `TaskFailed` when the task ends in `error` or `canceled`
/// - `Canceled` when `cancel` fires while waiting
/// - `Api` when the status read itself fails
pub async fn await_task(
    api: &impl TaskTracker,
    task_id: &str,
    interval: Duration,
    cancel: &CancellationToken,
) -> Result<(), ProvisionError> {
    let mut polls = 0u32;
    loop {
        let snapshot = or_cancel(cancel, api.task_status(task_id))
            .await?
            .with_context(|| format!("reading status of task {task_id}"))?;
        polls += 1;
        match snapshot.status {
            TaskStatus::Success => {
                info!(task_id, polls, "task succeeded");
                return Ok(());
            }
            TaskStatus::Error | TaskStatus::Canceled => {
                let reason = snapshot.error_message.unwrap_or_else(|| {
                    format!("task ended with status {:?}", snapshot.status).to_lowercase()
                });
                return Err(ProvisionError::TaskFailed {
                    task_id: task_id.to_string(),
                    reason,
                });
            }
            status => debug!(task_id, ?status, polls, "task still pending"),
        }
        sleep_or_cancel(interval, cancel).await?;
    }
}
