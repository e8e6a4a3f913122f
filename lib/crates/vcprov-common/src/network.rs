use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a mode string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct ParseModeError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// How a NIC obtains its address.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "UPPERCASE")]
pub enum AllocationMode {
    #[default]
    Pool,
    Dhcp,
    /// Fixed address supplied by the caller (`MANUAL` on the wire).
    #[serde(alias = "MANUAL")]
    Static,
    None,
}

impl AllocationMode {
    /// Value expected by the control plane's `IpAddressAllocationMode` field.
    #[must_use]
    pub fn as_api_str(self) -> &'static str {
        match self {
            Self::Pool => "POOL",
            Self::Dhcp => "DHCP",
            Self::Static => "MANUAL",
            Self::None => "NONE",
        }
    }

    /// Whether this mode needs an explicit address on the NIC.
    #[must_use]
    pub fn requires_address(self) -> bool {
        self == Self::Static
    }
}

impl fmt::Display for AllocationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pool => "POOL",
            Self::Dhcp => "DHCP",
            Self::Static => "STATIC",
            Self::None => "NONE",
        };
        f.write_str(s)
    }
}

impl FromStr for AllocationMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "POOL" => Ok(Self::Pool),
            "DHCP" => Ok(Self::Dhcp),
            "STATIC" | "MANUAL" => Ok(Self::Static),
            "NONE" => Ok(Self::None),
            _ => Err(ParseModeError {
                kind: "allocation mode",
                value: s.to_string(),
                expected: "POOL, DHCP, STATIC, NONE",
            }),
        }
    }
}

/// Fence mode of a vApp network relative to its parent org network.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "camelCase")]
pub enum FenceMode {
    #[default]
    Bridged,
    Isolated,
    NatRouted,
}

impl FenceMode {
    #[must_use]
    pub fn as_api_str(self) -> &'static str {
        match self {
            Self::Bridged => "bridged",
            Self::Isolated => "isolated",
            Self::NatRouted => "natRouted",
        }
    }
}

impl fmt::Display for FenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}

impl FromStr for FenceMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "bridged" => Ok(Self::Bridged),
            "isolated" => Ok(Self::Isolated),
            "natrouted" => Ok(Self::NatRouted),
            _ => Err(ParseModeError {
                kind: "fence mode",
                value: s.to_string(),
                expected: "bridged, isolated, natRouted",
            }),
        }
    }
}
