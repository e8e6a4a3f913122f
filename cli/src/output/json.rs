//! JSON output helpers.
//!
//! Every `--json` code path prints exactly one pretty-printed document on
//! stdout, whether the command succeeded or failed.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use vcprov_common::VApp;

use crate::application::services::inventory::VdcOverview;
use crate::domain::{ProvisionedVapp, StageFailure, VcprovConfig};

/// Format a JSON error object for failures that happen outside a pipeline.
///
/// ```json
/// { "error": true, "errorKind": "...", "message": "..." }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, kind: &str) -> Result<String> {
    let obj = json!({
        "error": true,
        "errorKind": kind,
        "message": message,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Format a stage failure: `{"error":true,"stage","errorKind","message"}`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_failure(failure: &StageFailure) -> Result<String> {
    let mut obj = serde_json::to_value(failure).context("JSON serialization failed")?;
    if let Some(map) = obj.as_object_mut() {
        map.insert("error".to_string(), json!(true));
    }
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

fn pretty(value: &impl Serialize) -> Result<String> {
    serde_json::to_string_pretty(value).context("JSON serialization failed")
}

/// Renders domain types as JSON documents on stdout.
pub struct JsonRenderer;

impl JsonRenderer {
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_provisioned(&self, done: &ProvisionedVapp) -> Result<()> {
        println!("{}", pretty(done)?);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_failure(&self, failure: &StageFailure) -> Result<()> {
        println!("{}", format_failure(failure)?);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_action(&self, result: &str, id: &str) -> Result<()> {
        println!("{}", pretty(&json!({ "id": id, "result": result }))?);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_vapp(&self, vapp: &VApp) -> Result<()> {
        println!("{}", pretty(vapp)?);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_vdc(&self, overview: &VdcOverview) -> Result<()> {
        let obj = json!({
            "id": overview.vdc.id,
            "name": overview.vdc.name,
            "description": overview.vdc.description,
            "networks": overview.vdc.networks,
            "vapps": overview.vapps,
        });
        println!("{}", pretty(&obj)?);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_config(&self, config: &VcprovConfig, path: &std::path::Path) -> Result<()> {
        let obj = json!({
            "path": path.display().to_string(),
            "config": config.redacted(),
        });
        println!("{}", pretty(&obj)?);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_version(&self, version: &str) -> Result<()> {
        println!("{}", pretty(&json!({ "version": version }))?);
        Ok(())
    }
}
