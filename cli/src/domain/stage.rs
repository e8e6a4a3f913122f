//! Stage names of the provisioning and teardown state machines.

use std::fmt;

use serde::Serialize;

/// A stage of a provisioning or teardown run.
///
/// Provisioning walks `Requested → Created → PoweredOff → NetworkConfigured →
/// GuestCustomized → [CpuResized] → [RamResized] → PoweredOn →
/// AddressAcquired → [ReadinessConfirmed → Handoff] → Done`. Teardown walks
/// `Requested → Located → PoweredOff → Deleted → Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Stage {
    Requested,
    Located,
    Created,
    PoweredOff,
    NetworkConfigured,
    GuestCustomized,
    CpuResized,
    RamResized,
    PoweredOn,
    AddressAcquired,
    ReadinessConfirmed,
    Handoff,
    Deleted,
    Done,
}

impl Stage {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Requested => "Requested",
            Self::Located => "Located",
            Self::Created => "Created",
            Self::PoweredOff => "PoweredOff",
            Self::NetworkConfigured => "NetworkConfigured",
            Self::GuestCustomized => "GuestCustomized",
            Self::CpuResized => "CpuResized",
            Self::RamResized => "RamResized",
            Self::PoweredOn => "PoweredOn",
            Self::AddressAcquired => "AddressAcquired",
            Self::ReadinessConfirmed => "ReadinessConfirmed",
            Self::Handoff => "Handoff",
            Self::Deleted => "Deleted",
            Self::Done => "Done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
