use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Power state of a vApp or VM.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PowerState {
    #[default]
    Unknown,
    PoweredOff,
    PoweredOn,
}

impl PowerState {
    /// Map the control plane's numeric resource status.
    ///
    /// Only `4` (powered on) and `8` (powered off) are settled states; every
    /// other code (resolved, suspended, mixed, busy) is `Unknown`.
    #[must_use]
    pub fn from_status_code(code: i64) -> Self {
        match code {
            4 => Self::PoweredOn,
            8 => Self::PoweredOff,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::PoweredOff => "powered off",
            Self::PoweredOn => "powered on",
        }
    }
}

/// Lifecycle state of an asynchronous infrastructure task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    Queued,
    PreRunning,
    Running,
    Success,
    Error,
    /// Canceled by a user or aborted by the control plane.
    #[serde(alias = "aborted")]
    Canceled,
}

impl TaskStatus {
    /// Parse the `status` attribute of a task resource.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "queued" => Some(Self::Queued),
            "preRunning" => Some(Self::PreRunning),
            "running" => Some(Self::Running),
            "success" => Some(Self::Success),
            "error" => Some(Self::Error),
            "canceled" | "aborted" => Some(Self::Canceled),
            _ => None,
        }
    }
}

/// One observation of a task's status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskSnapshot {
    pub id: String,
    pub status: TaskStatus,
    /// Error detail reported by the control plane for failed tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Summary of a VM inside a vApp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VmSummary {
    pub id: String,
    pub name: String,
    pub status: PowerState,
    #[serde(default)]
    pub addresses: Vec<String>,
}

/// Full snapshot of a vApp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct VApp {
    pub id: String,
    pub name: String,
    pub status: PowerState,
    /// Contained VMs keyed by VM id.
    #[serde(default)]
    pub vms: BTreeMap<String, VmSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_address: Option<String>,
}

impl VApp {
    /// The VM that receives per-VM configuration.
    ///
    /// Templates used for provisioning carry a single VM; with several, the
    /// lowest id wins so the choice is stable across snapshots.
    #[must_use]
    pub fn primary_vm(&self) -> Option<&VmSummary> {
        self.vms.values().next()
    }
}

/// A vApp listed inside a VDC.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VappRef {
    pub id: String,
    pub name: String,
}

/// Summary of a virtual data center.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct VdcSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub vapps: Vec<VappRef>,
    #[serde(default)]
    pub networks: Vec<String>,
}
