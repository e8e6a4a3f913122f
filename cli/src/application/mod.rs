//! Application layer: port trait definitions and use-case orchestration.
//!
//! This module depends only on `crate::domain` and `vcprov_common`, never on
//! `crate::infra`, `crate::commands`, or `crate::output`.

pub mod ports;
pub mod services;

pub use ports::{
    BannerStream, Bootstrapper, CommandRunner, ConfigStore, CreatedVapp, InfrastructureApi,
    PortDialer, ProgressReporter, Session, TaskTracker, VappInspector, VappLifecycle,
    VmConfigurator,
};
