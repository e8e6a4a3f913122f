//! Session bracketing around a top-level run.

use std::future::Future;

use anyhow::{Context, Result};
use tracing::warn;

use crate::application::ports::Session;

/// Log in, drive `work`, and log out whatever `work` produced.
///
/// A logout failure is logged and does not replace the result of `work`.
///
/// # Errors
///
/// Returns an error only when login fails; `work` is not started then.
pub async fn scoped<T>(api: &impl Session, work: impl Future<Output = T>) -> Result<T> {
    api.login().await.context("logging in to the control plane")?;
    let out = work.await;
    if let Err(e) = api.logout().await {
        warn!(error = %format!("{e:#}"), "logout failed");
    }
    Ok(out)
}
