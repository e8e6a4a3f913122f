//! Domain layer: request types, stage names, error taxonomy and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, or `std::process`.
//! All functions are synchronous and take data in, returning data out.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod outcome;
pub mod policy;
pub mod request;
pub mod stage;

pub use bootstrap::BootstrapParams;
pub use config::{EnvOverrides, VcprovConfig, validate_config_key, validate_config_value};
pub use error::{ConfigError, ErrorKind, ProvisionError};
pub use outcome::{ProvisionedVapp, ProvisioningOutcome, StageFailure, TeardownOutcome};
pub use policy::PollPolicy;
pub use request::{
    BootstrapSettings, NicSettings, ProvisioningRequest, VappNetworkConfig, VappNetworkSettings,
    VmNetworkConfig,
};
pub use stage::Stage;
