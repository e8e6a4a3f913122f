//! Cancellation-aware waiting shared by the polling services.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::domain::ProvisionError;

/// Sleep for `duration` unless `cancel` fires first.
///
/// # Errors
///
/// Returns `ProvisionError::Canceled` when the token is cancelled before or
/// during the sleep.
pub async fn sleep_or_cancel(
    duration: Duration,
    cancel: &CancellationToken,
) -> Result<(), ProvisionError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ProvisionError::Canceled),
        () = tokio::time::sleep(duration) => Ok(()),
    }
}

/// Drive `fut` to completion unless `cancel` fires first.
///
/// # Errors
///
/// Returns `ProvisionError::Canceled` when the token is cancelled first.
pub async fn or_cancel<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, ProvisionError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ProvisionError::Canceled),
        out = fut => Ok(out),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn sleep_completes_when_not_cancelled() {
        let cancel = CancellationToken::new();
        let start = tokio::time::Instant::now();
        sleep_or_cancel(Duration::from_secs(3), &cancel).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_token_wins_immediately() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let start = tokio::time::Instant::now();
        let err = sleep_or_cancel(Duration::from_secs(60), &cancel).await.unwrap_err();
        assert!(matches!(err, ProvisionError::Canceled));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_pending_future() {
        let cancel = CancellationToken::new();
        let child = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            child.cancel();
        });
        let err = or_cancel(&cancel, std::future::pending::<()>()).await.unwrap_err();
        assert!(matches!(err, ProvisionError::Canceled));
    }
}
