//! Results of a provisioning or teardown run.

use serde::Serialize;
use thiserror::Error;

use crate::domain::error::{ErrorKind, ProvisionError};
use crate::domain::stage::Stage;

/// A provisioned vApp and what the run learned about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedVapp {
    pub vapp_id: String,
    pub vm_id: String,
    pub primary_address: String,
    pub secondary_address: Option<String>,
    /// Last stage completed before `Done`.
    #[serde(skip)]
    pub reached: Stage,
}

/// The stage a run stopped in and why.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{stage} failed: {message}")]
#[serde(rename_all = "camelCase")]
pub struct StageFailure {
    pub stage: Stage,
    pub error_kind: ErrorKind,
    pub message: String,
    /// Set once the vApp exists; the vApp is left in place on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vapp_id: Option<String>,
}

impl StageFailure {
    #[must_use]
    pub fn new(stage: Stage, err: &ProvisionError, vapp_id: Option<&str>) -> Self {
        let mut message = err.to_string();
        if let Some(id) = vapp_id {
            message.push_str(&format!(
                "\nvApp {id} was left in place; inspect it with `vcprov vapp show {id}` \
                 and remove it with `vcprov server delete {id}`"
            ));
        }
        Self {
            stage,
            error_kind: err.kind(),
            message,
            vapp_id: vapp_id.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningOutcome {
    Provisioned(ProvisionedVapp),
    Failed(StageFailure),
}

impl ProvisioningOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Provisioned(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeardownOutcome {
    Deleted { vapp_id: String },
    Failed(StageFailure),
}
