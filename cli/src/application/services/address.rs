//! Bounded wait for the vApp's primary address.

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use vcprov_common::PowerState;

use crate::application::ports::VappInspector;
use crate::application::services::cancel::{or_cancel, sleep_or_cancel};
use crate::domain::{PollPolicy, ProvisionError};

/// Addresses reported for a powered-on vApp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedAddresses {
    pub primary: String,
    pub secondary: Option<String>,
}

/// Fetch the vApp until it reports a primary address.
///
/// Makes at most `policy.address_attempts` fetches with
/// `policy.address_interval` between them, and returns on the first fetch
/// that carries an address.
///
/// # Errors
///
/// - `AddressTimeout` once every attempt came back without an address
/// - `PreconditionViolation` if the vApp is seen powered off
/// - `Canceled` when `cancel` fires while waiting
/// - `Api` when a fetch fails
pub async fn await_address(
    api: &impl VappInspector,
    vapp_id: &str,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<AssignedAddresses, ProvisionError> {
    let budget = policy.address_attempts;
    for attempt in 1..=budget {
        let vapp = or_cancel(cancel, api.get_vapp(vapp_id))
            .await?
            .with_context(|| format!("fetching vApp {vapp_id}"))?;

        if vapp.status == PowerState::PoweredOff {
            return Err(ProvisionError::PreconditionViolation(format!(
                "vApp {vapp_id} is powered off while waiting for an address"
            )));
        }
        if let Some(primary) = vapp.primary_address.filter(|a| !a.is_empty()) {
            info!(vapp_id, attempt, %primary, "address assigned");
            return Ok(AssignedAddresses {
                primary,
                secondary: vapp.secondary_address.filter(|a| !a.is_empty()),
            });
        }

        debug!(vapp_id, attempt, budget, "no address yet");
        if attempt < budget {
            sleep_or_cancel(policy.address_interval, cancel).await?;
        }
    }
    Err(ProvisionError::AddressTimeout {
        vapp_id: vapp_id.to_string(),
        attempts: budget,
    })
}
