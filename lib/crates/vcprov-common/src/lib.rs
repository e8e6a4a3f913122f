pub mod network;
pub mod types;

pub use network::{AllocationMode, FenceMode};
pub use types::*;
