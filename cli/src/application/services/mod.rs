//! Application services: use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports`, never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod address;
pub mod cancel;
pub mod compute;
pub mod config_service;
pub mod inventory;
pub mod network;
pub mod power;
pub mod provision;
pub mod readiness;
pub mod session;
pub mod task_poller;
pub mod teardown;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub mod test_support;
