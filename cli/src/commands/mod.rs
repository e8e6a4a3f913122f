//! Command implementations

pub mod config;
pub mod server;
pub mod vapp;
pub mod vdc;
pub mod version;
pub mod vm;
