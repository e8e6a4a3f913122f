//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module holds all I/O-performing code: the vCloud REST client, TCP
//! probing, process execution and the on-disk config store.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod bootstrap;
pub mod command_runner;
pub mod config;
pub mod tcp;
pub mod vcloud;
