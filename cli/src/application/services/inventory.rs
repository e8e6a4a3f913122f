//! Read-only reports for `vapp show` and `vdc show`.

use anyhow::{Context, Result};
use vcprov_common::{VApp, VdcSummary};

use crate::application::ports::VappInspector;

/// A VDC together with a snapshot of each of its vApps.
#[derive(Debug, Clone)]
pub struct VdcOverview {
    pub vdc: VdcSummary,
    pub vapps: Vec<VApp>,
}

/// # Errors
///
/// Returns an error if the vApp cannot be fetched.
pub async fn vapp_details(api: &impl VappInspector, vapp_id: &str) -> Result<VApp> {
    api.get_vapp(vapp_id)
        .await
        .with_context(|| format!("fetching vApp {vapp_id}"))
}

/// # Errors
///
/// Returns an error if the VDC or any of its vApps cannot be fetched.
pub async fn vdc_overview(api: &impl VappInspector, vdc_id: &str) -> Result<VdcOverview> {
    let vdc = api
        .get_vdc(vdc_id)
        .await
        .with_context(|| format!("fetching VDC {vdc_id}"))?;
    let mut vapps = Vec::with_capacity(vdc.vapps.len());
    for entry in &vdc.vapps {
        vapps.push(vapp_details(api, &entry.id).await?);
    }
    Ok(VdcOverview { vdc, vapps })
}
