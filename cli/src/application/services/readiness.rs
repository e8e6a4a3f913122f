//! TCP readiness probe for the bootstrap port.
//!
//! One probe opens a connection, waits for the server banner and closes the
//! connection again. Transient socket conditions are absorbed here: the probe
//! pauses and reports "not ready" so the caller simply tries again.

use std::io;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::ports::{BannerStream, PortDialer, ProgressReporter};
use crate::application::services::cancel::{or_cancel, sleep_or_cancel};
use crate::domain::{PollPolicy, ProvisionError};

/// Socket conditions that clear up on their own while a guest boots.
fn is_transient(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::HostUnreachable
            | io::ErrorKind::NetworkUnreachable
            | io::ErrorKind::ConnectionReset
    )
}

async fn not_ready(
    host: &str,
    port: u16,
    err: &io::Error,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<bool, ProvisionError> {
    if is_transient(err.kind()) {
        debug!(host, port, error = %err, "port not reachable yet");
        sleep_or_cancel(policy.probe_retry_delay, cancel).await?;
        return Ok(false);
    }
    Err(ProvisionError::PermanentProbe {
        host: host.to_string(),
        port,
        reason: err.to_string(),
    })
}

/// One connect-and-read-banner attempt.
///
/// Returns `Ok(true)` once a banner arrives and `Ok(false)` after a transient
/// failure or a peer that closed without a banner (having already paused
/// `policy.probe_retry_delay`). The connection
/// is dropped, and so closed, before this returns on every path.
///
/// # Errors
///
/// - `PermanentProbe` on a connect timeout, a permission error or any other
///   unclassified socket error
/// - `Canceled` when `cancel` fires
pub async fn probe_once(
    dialer: &impl PortDialer,
    host: &str,
    port: u16,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<bool, ProvisionError> {
    let connect = tokio::time::timeout(policy.probe_connect_timeout, dialer.connect(host, port));
    let mut conn = match or_cancel(cancel, connect).await? {
        Err(_elapsed) => {
            return Err(ProvisionError::PermanentProbe {
                host: host.to_string(),
                port,
                reason: format!(
                    "connect timed out after {}s",
                    policy.probe_connect_timeout.as_secs()
                ),
            });
        }
        Ok(Err(e)) => return not_ready(host, port, &e, policy, cancel).await,
        Ok(Ok(conn)) => conn,
    };

    let read = tokio::time::timeout(policy.probe_connect_timeout, conn.read_banner());
    let banner = or_cancel(cancel, read).await;
    drop(conn);

    match banner? {
        Ok(Ok(n)) if n > 0 => Ok(true),
        Ok(Ok(_)) => {
            debug!(host, port, "peer closed before sending a banner");
            sleep_or_cancel(policy.probe_retry_delay, cancel).await?;
            Ok(false)
        }
        Err(_elapsed) => {
            debug!(host, port, "no banner within the timeout");
            Ok(false)
        }
        Ok(Err(e)) => not_ready(host, port, &e, policy, cancel).await,
    }
}

/// Probe until the port answers with a banner.
///
/// A permanent probe failure ends only the current attempt: it is reported as
/// a warning and the loop tries again after `policy.probe_retry_delay`. The
/// loop is unbounded unless `policy.max_probe_attempts` is set. Returns the
/// number of attempts made.
///
/// # Errors
///
/// - `Canceled` when `cancel` fires
/// - `PermanentProbe` once `policy.max_probe_attempts` is exhausted
pub async fn await_tcp_ready(
    dialer: &impl PortDialer,
    reporter: &impl ProgressReporter,
    host: &str,
    port: u16,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<u32, ProvisionError> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match probe_once(dialer, host, port, policy, cancel).await {
            Ok(true) => {
                info!(host, port, attempt, "port is accepting connections");
                return Ok(attempt);
            }
            Ok(false) => {}
            Err(ProvisionError::PermanentProbe { reason, .. }) => {
                warn!(host, port, attempt, %reason, "probe attempt failed");
                reporter.warn(&format!("{host}:{port} not reachable ({reason}), retrying"));
                sleep_or_cancel(policy.probe_retry_delay, cancel).await?;
            }
            Err(other) => return Err(other),
        }
        if policy.max_probe_attempts.is_some_and(|max| attempt >= max) {
            return Err(ProvisionError::PermanentProbe {
                host: host.to_string(),
                port,
                reason: format!("still not ready after {attempt} attempts"),
            });
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::application::services::test_support::{Dial, FakeDialer, RecordingReporter};

    const HOST: &str = "10.0.0.5";

    async fn run(dialer: &FakeDialer) -> Result<bool, ProvisionError> {
        probe_once(dialer, HOST, 22, &PollPolicy::default(), &CancellationToken::new()).await
    }

    #[tokio::test(start_paused = true)]
    async fn refused_twice_then_ready_takes_three_attempts_with_pauses() {
        let dialer = FakeDialer::new(&[Dial::Refused, Dial::Refused], Dial::Banner);
        let attempts = await_tcp_ready(
            &dialer,
            &RecordingReporter::default(),
            HOST,
            22,
            &PollPolicy::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(attempts, 3);

        let at = dialer.attempts.lock().unwrap().clone();
        assert_eq!(at.len(), 3);
        assert!(at[1] - at[0] >= Duration::from_secs(2));
        assert!(at[2] - at[1] >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn each_transient_kind_pauses_and_reports_not_ready() {
        for dial in [Dial::Refused, Dial::HostUnreachable, Dial::NetUnreachable, Dial::Reset] {
            let dialer = FakeDialer::new(&[dial], Dial::Banner);
            let start = tokio::time::Instant::now();
            assert!(!run(&dialer).await.unwrap(), "{dial:?}");
            assert!(start.elapsed() >= Duration::from_secs(2), "{dial:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_and_permission_denied_give_up_without_pause() {
        for dial in [Dial::TimedOut, Dial::PermissionDenied] {
            let dialer = FakeDialer::new(&[dial], Dial::Banner);
            let start = tokio::time::Instant::now();
            let err = run(&dialer).await.unwrap_err();
            assert!(matches!(err, ProvisionError::PermanentProbe { .. }), "{dial:?}");
            assert!(start.elapsed() < Duration::from_secs(1), "{dial:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hung_connect_is_bounded_by_connect_timeout() {
        let dialer = FakeDialer::new(&[Dial::Hang], Dial::Banner);
        let start = tokio::time::Instant::now();
        let err = run(&dialer).await.unwrap_err();
        assert!(err.to_string().contains("timed out"), "got: {err}");
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn closed_without_banner_is_not_ready() {
        let dialer = FakeDialer::new(&[Dial::Closed], Dial::Banner);
        assert!(!run(&dialer).await.unwrap());
        assert_eq!(dialer.closed(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_peer_attempts_are_spaced_and_cancelable() {
        let dialer = FakeDialer::new(&[], Dial::Closed);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let reporter = RecordingReporter::default();
        let policy = PollPolicy::default();
        let (result, ()) = tokio::join!(
            await_tcp_ready(&dialer, &reporter, HOST, 22, &policy, &cancel),
            async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                trigger.cancel();
            }
        );
        assert!(matches!(result, Err(ProvisionError::Canceled)));

        let at = dialer.attempts.lock().unwrap().clone();
        assert!((2..=6).contains(&at.len()), "attempts: {}", at.len());
        for pair in at.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_secs(2));
        }
        assert_eq!(dialer.opened(), dialer.closed());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_during_read_is_transient() {
        let dialer = FakeDialer::new(&[Dial::ResetOnRead], Dial::Banner);
        assert!(!run(&dialer).await.unwrap());
        assert_eq!(dialer.opened(), dialer.closed());
    }

    #[tokio::test(start_paused = true)]
    async fn no_connection_leaks_across_many_attempts() {
        let script: Vec<Dial> = [Dial::Closed, Dial::ResetOnRead, Dial::Refused, Dial::Banner]
            .into_iter()
            .cycle()
            .take(100)
            .collect();
        let dialer = FakeDialer::new(&script, Dial::Banner);
        for _ in 0..100 {
            run(&dialer).await.unwrap();
        }
        assert_eq!(dialer.attempt_count(), 100);
        assert_eq!(dialer.opened(), 75);
        assert_eq!(dialer.opened(), dialer.closed());
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failures_keep_looping_and_warn() {
        let dialer = FakeDialer::new(&[Dial::PermissionDenied, Dial::TimedOut], Dial::Banner);
        let reporter = RecordingReporter::default();
        let attempts = await_tcp_ready(
            &dialer,
            &reporter,
            HOST,
            22,
            &PollPolicy::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(attempts, 3);
        assert!(reporter.contains("warn: 10.0.0.5:22 not reachable"));
    }

    #[tokio::test(start_paused = true)]
    async fn optional_attempt_cap_is_honored() {
        let dialer = FakeDialer::new(&[], Dial::Refused);
        let policy = PollPolicy {
            max_probe_attempts: Some(4),
            ..PollPolicy::default()
        };
        let err = await_tcp_ready(
            &dialer,
            &RecordingReporter::default(),
            HOST,
            22,
            &policy,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("after 4 attempts"), "got: {err}");
        assert_eq!(dialer.attempt_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_unbounded_wait() {
        let dialer = FakeDialer::new(&[], Dial::Refused);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let reporter = RecordingReporter::default();
        let policy = PollPolicy::default();
        let (result, ()) = tokio::join!(
            await_tcp_ready(&dialer, &reporter, HOST, 22, &policy, &cancel),
            async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                trigger.cancel();
            }
        );
        assert!(matches!(result, Err(ProvisionError::Canceled)));
        assert_eq!(dialer.opened(), dialer.closed());
    }
}
