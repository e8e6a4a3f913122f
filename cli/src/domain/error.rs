//! Error taxonomy for provisioning and configuration.
//!
//! Infrastructure calls report `anyhow::Error`; it is wrapped as
//! `ProvisionError::Api` at the service boundary so the context chain survives.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

// ── Provisioning errors ──────────────────────────────────────────────────────

/// Failures raised by the provisioning components.
///
/// Transient socket conditions seen by the readiness probe are absorbed inside
/// the probe and never appear here.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("task {task_id} did not succeed: {reason}")]
    TaskFailed { task_id: String, reason: String },

    #[error("no address assigned to vApp {vapp_id} after {attempts} attempts")]
    AddressTimeout { vapp_id: String, attempts: u32 },

    #[error("{host}:{port} is not accepting connections: {reason}")]
    PermanentProbe {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("operation canceled")]
    Canceled,

    #[error("infrastructure API call failed: {0:#}")]
    Api(#[from] anyhow::Error),
}

impl ProvisionError {
    /// Stable classification used in the outcome surface.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TaskFailed { .. } => ErrorKind::TaskFailed,
            Self::AddressTimeout { .. } => ErrorKind::AddressTimeout,
            Self::PermanentProbe { .. } => ErrorKind::PermanentProbeError,
            Self::PreconditionViolation(_) => ErrorKind::PreconditionViolation,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::Canceled => ErrorKind::Canceled,
            Self::Api(_) => ErrorKind::ApiError,
        }
    }
}

/// Error classification reported alongside a failed stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    TaskFailed,
    AddressTimeout,
    PermanentProbeError,
    PreconditionViolation,
    InvalidRequest,
    Canceled,
    ApiError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::TaskFailed => "TaskFailed",
            Self::AddressTimeout => "AddressTimeout",
            Self::PermanentProbeError => "PermanentProbeError",
            Self::PreconditionViolation => "PreconditionViolation",
            Self::InvalidRequest => "InvalidRequest",
            Self::Canceled => "Canceled",
            Self::ApiError => "ApiError",
        };
        f.write_str(s)
    }
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\nExpected: {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },

    #[error("No control plane URL configured. Run: vcprov config set connection.url <url>")]
    MissingUrl,
}
