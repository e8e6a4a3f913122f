//! JSON documents exchanged with the vCloud Director REST API, and their
//! mapping onto the shared `vcprov_common` types.
//!
//! Only the fields the provisioning pipeline reads or writes are modelled.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vcprov_common::{
    PowerState, TaskSnapshot, TaskStatus, VApp, VappRef, VdcSummary, VmSummary,
};

use crate::domain::{NicSettings, VappNetworkConfig, VappNetworkSettings, VmNetworkConfig};

/// Last path segment of an API href, used as the resource id.
#[must_use]
pub fn id_from_href(href: &str) -> String {
    href.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(href)
        .to_string()
}

// ── Common ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub major_error_code: Option<u16>,
}

// ── Tasks ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub href: String,
    pub status: String,
    #[serde(default)]
    pub error: Option<TaskError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskError {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Tasks {
    #[serde(default)]
    pub task: Vec<Task>,
}

impl Task {
    #[must_use]
    pub fn id(&self) -> String {
        id_from_href(&self.href)
    }

    /// Unknown status strings are treated as still running.
    #[must_use]
    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.id(),
            status: TaskStatus::parse(&self.status).unwrap_or(TaskStatus::Running),
            error_message: self
                .error
                .as_ref()
                .map(|e| e.message.clone())
                .filter(|m| !m.is_empty()),
        }
    }
}

// ── vApps and VMs ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireVapp {
    pub href: String,
    pub name: String,
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub children: Option<VappChildren>,
    #[serde(default)]
    pub tasks: Option<Tasks>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VappChildren {
    #[serde(default)]
    pub vm: Vec<WireVm>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireVm {
    pub href: String,
    pub name: String,
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub network_connection_section: Option<NetworkConnectionSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConnectionSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_network_connection_index: Option<u32>,
    #[serde(default)]
    pub network_connection: Vec<NetworkConnection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConnection {
    pub network: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_connection_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    pub is_connected: bool,
    pub ip_address_allocation_mode: String,
}

impl WireVm {
    /// Assigned addresses ordered by connection index.
    fn addresses(&self) -> Vec<String> {
        let Some(section) = &self.network_connection_section else {
            return Vec::new();
        };
        let mut conns: Vec<&NetworkConnection> = section.network_connection.iter().collect();
        let primary = section.primary_network_connection_index;
        conns.sort_by_key(|c| {
            (
                c.network_connection_index != primary,
                c.network_connection_index,
            )
        });
        conns
            .into_iter()
            .filter_map(|c| c.ip_address.clone())
            .filter(|ip| !ip.is_empty())
            .collect()
    }
}

impl WireVapp {
    /// Task attached to a freshly created vApp.
    #[must_use]
    pub fn first_task(&self) -> Option<&Task> {
        self.tasks.as_ref().and_then(|t| t.task.first())
    }

    #[must_use]
    pub fn into_vapp(self) -> VApp {
        let vms: BTreeMap<String, VmSummary> = self
            .children
            .unwrap_or_default()
            .vm
            .into_iter()
            .map(|vm| {
                let id = id_from_href(&vm.href);
                let summary = VmSummary {
                    id: id.clone(),
                    addresses: vm.addresses(),
                    name: vm.name,
                    status: PowerState::from_status_code(vm.status),
                };
                (id, summary)
            })
            .collect();
        let (primary_address, secondary_address) = vms
            .values()
            .next()
            .map(|vm| {
                let mut it = vm.addresses.iter().cloned();
                (it.next(), it.next())
            })
            .unwrap_or_default();
        VApp {
            id: id_from_href(&self.href),
            name: self.name,
            status: PowerState::from_status_code(self.status),
            vms,
            primary_address,
            secondary_address,
        }
    }
}

// ── VDC ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireVdc {
    pub href: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub resource_entities: Option<ResourceEntities>,
    #[serde(default)]
    pub available_networks: Option<AvailableNetworks>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEntities {
    #[serde(default)]
    pub resource_entity: Vec<Reference>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailableNetworks {
    #[serde(default)]
    pub network: Vec<Reference>,
}

const VAPP_MEDIA_TYPE: &str = "application/vnd.vmware.vcloud.vApp+xml";

impl WireVdc {
    #[must_use]
    pub fn into_summary(self) -> VdcSummary {
        let vapps = self
            .resource_entities
            .unwrap_or_default()
            .resource_entity
            .into_iter()
            .filter(|e| e.media_type.as_deref() == Some(VAPP_MEDIA_TYPE))
            .map(|e| VappRef {
                id: id_from_href(&e.href),
                name: e.name.unwrap_or_default(),
            })
            .collect();
        let networks = self
            .available_networks
            .unwrap_or_default()
            .network
            .into_iter()
            .filter_map(|n| n.name)
            .collect();
        VdcSummary {
            id: id_from_href(&self.href),
            name: self.name,
            description: self.description.unwrap_or_default(),
            vapps,
            networks,
        }
    }
}

// ── Query results ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub record: Vec<Reference>,
}

// ── Request bodies ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstantiateParams {
    pub name: String,
    pub description: String,
    pub deploy: bool,
    pub power_on: bool,
    pub source: Reference,
    pub instantiation_params: InstantiationParams,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstantiationParams {
    pub network_config_section: NetworkConfigSection,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfigSection {
    pub network_config: Vec<VappNetworkEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VappNetworkEntry {
    pub network_name: String,
    pub configuration: NetworkConfiguration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfiguration {
    pub parent_network: Reference,
    pub fence_mode: String,
    pub retain_net_info_across_deployments: bool,
}

/// One entry per vApp slot that names a network.
#[must_use]
pub fn network_config_section(base: &str, config: &VappNetworkConfig) -> NetworkConfigSection {
    let entry = |slot: &VappNetworkSettings| {
        slot.network_name.as_ref().map(|name| VappNetworkEntry {
            network_name: name.clone(),
            configuration: NetworkConfiguration {
                parent_network: Reference {
                    href: format!("{base}/api/network/{name}"),
                    name: Some(name.clone()),
                    media_type: None,
                },
                fence_mode: slot.fence_mode.as_api_str().to_string(),
                retain_net_info_across_deployments: slot.retain,
            },
        })
    };
    NetworkConfigSection {
        network_config: [&config.primary, &config.secondary]
            .into_iter()
            .filter_map(entry)
            .collect(),
    }
}

fn connection(network: &str, nic: &NicSettings, default_index: u32) -> NetworkConnection {
    NetworkConnection {
        network: network.to_string(),
        network_connection_index: Some(nic.index.unwrap_or(default_index)),
        ip_address: nic.ip.map(|ip| ip.to_string()),
        is_connected: nic.connected,
        ip_address_allocation_mode: nic.allocation.as_api_str().to_string(),
    }
}

/// Connection section covering both NICs of a normalized config.
#[must_use]
pub fn network_connection_section(config: &VmNetworkConfig) -> NetworkConnectionSection {
    let mut conns = Vec::with_capacity(2);
    if let Some(name) = config.nic1.network_name.as_deref() {
        conns.push(connection(name, &config.nic1, 0));
    }
    if let Some((nic2, name)) = config
        .nic2
        .as_ref()
        .and_then(|nic| nic.network_name.as_deref().map(|name| (nic, name)))
    {
        conns.push(connection(name, nic2, 1));
    }
    NetworkConnectionSection {
        primary_network_connection_index: Some(config.primary_index.unwrap_or(0)),
        network_connection: conns,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestCustomizationSection {
    pub enabled: bool,
    pub computer_name: String,
}

/// Virtual hardware item used for CPU and memory updates.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareItem {
    pub resource_type: u8,
    pub virtual_quantity: u32,
    pub allocation_units: String,
}

impl HardwareItem {
    #[must_use]
    pub fn cpus(count: u32) -> Self {
        Self {
            resource_type: 3,
            virtual_quantity: count,
            allocation_units: "hertz * 10^6".to_string(),
        }
    }

    #[must_use]
    pub fn memory(megabytes: u32) -> Self {
        Self {
            resource_type: 4,
            virtual_quantity: megabytes,
            allocation_units: "byte * 2^20".to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use vcprov_common::{AllocationMode, FenceMode};

    use super::*;

    #[test]
    fn id_is_last_href_segment() {
        assert_eq!(
            id_from_href("https://vcd.example.com/api/vApp/vapp-1234/"),
            "vapp-1234"
        );
        assert_eq!(id_from_href("task-9"), "task-9");
    }

    #[test]
    fn vapp_maps_status_vms_and_addresses() {
        let body = serde_json::json!({
            "href": "https://vcd/api/vApp/vapp-1",
            "name": "web01",
            "status": 4,
            "children": { "vm": [{
                "href": "https://vcd/api/vApp/vm-1",
                "name": "web01-vm",
                "status": 4,
                "networkConnectionSection": {
                    "primaryNetworkConnectionIndex": 1,
                    "networkConnection": [
                        { "network": "Net-A", "networkConnectionIndex": 0, "ipAddress": "192.168.1.9",
                          "isConnected": true, "ipAddressAllocationMode": "POOL" },
                        { "network": "Net-B", "networkConnectionIndex": 1, "ipAddress": "10.0.0.5",
                          "isConnected": true, "ipAddressAllocationMode": "DHCP" }
                    ]
                }
            }]}
        });
        let vapp = serde_json::from_value::<WireVapp>(body).unwrap().into_vapp();
        assert_eq!(vapp.id, "vapp-1");
        assert_eq!(vapp.status, PowerState::PoweredOn);
        assert_eq!(vapp.primary_vm().unwrap().id, "vm-1");
        assert_eq!(vapp.primary_address.as_deref(), Some("10.0.0.5"));
        assert_eq!(vapp.secondary_address.as_deref(), Some("192.168.1.9"));
    }

    #[test]
    fn vapp_without_addresses_has_none() {
        let body = serde_json::json!({
            "href": "https://vcd/api/vApp/vapp-1",
            "name": "web01",
            "status": 8,
            "children": { "vm": [{ "href": "https://vcd/api/vApp/vm-1", "name": "a", "status": 8 }] }
        });
        let vapp = serde_json::from_value::<WireVapp>(body).unwrap().into_vapp();
        assert_eq!(vapp.status, PowerState::PoweredOff);
        assert!(vapp.primary_address.is_none());
    }

    #[test]
    fn task_snapshot_keeps_error_message() {
        let task: Task = serde_json::from_value(serde_json::json!({
            "href": "https://vcd/api/task/abc",
            "status": "error",
            "error": { "message": "quota exceeded" }
        }))
        .unwrap();
        let snap = task.snapshot();
        assert_eq!(snap.id, "abc");
        assert_eq!(snap.status, TaskStatus::Error);
        assert_eq!(snap.error_message.as_deref(), Some("quota exceeded"));
    }

    #[test]
    fn vdc_summary_lists_only_vapps() {
        let vdc: WireVdc = serde_json::from_value(serde_json::json!({
            "href": "https://vcd/api/vdc/vdc-1",
            "name": "Pool A",
            "resourceEntities": { "resourceEntity": [
                { "href": "https://vcd/api/vApp/vapp-1", "name": "web01", "type": VAPP_MEDIA_TYPE },
                { "href": "https://vcd/api/vAppTemplate/vappTemplate-7", "name": "tmpl",
                  "type": "application/vnd.vmware.vcloud.vAppTemplate+xml" }
            ]},
            "availableNetworks": { "network": [{ "href": "https://vcd/api/network/n1", "name": "Net-A" }] }
        }))
        .unwrap();
        let summary = vdc.into_summary();
        assert_eq!(summary.vapps.len(), 1);
        assert_eq!(summary.vapps[0].name, "web01");
        assert_eq!(summary.networks, vec!["Net-A"]);
    }

    #[test]
    fn connection_section_covers_both_nics() {
        let config = VmNetworkConfig {
            primary_index: Some(0),
            nic1: NicSettings {
                network_name: Some("Net-A".into()),
                allocation: AllocationMode::Static,
                ip: Some("10.0.0.9".parse().unwrap()),
                ..NicSettings::default()
            },
            nic2: Some(NicSettings::on("Net-B")),
        };
        let section = network_connection_section(&config);
        let v = serde_json::to_value(&section).unwrap();
        assert_eq!(v["networkConnection"][0]["ipAddressAllocationMode"], "MANUAL");
        assert_eq!(v["networkConnection"][0]["ipAddress"], "10.0.0.9");
        assert_eq!(v["networkConnection"][1]["network"], "Net-B");
        assert_eq!(v["networkConnection"][1]["networkConnectionIndex"], 1);
    }

    #[test]
    fn network_config_section_keeps_slot_settings_apart() {
        let config = VappNetworkConfig {
            primary: VappNetworkSettings {
                network_name: Some("Net-A".into()),
                fence_mode: FenceMode::Bridged,
                retain: true,
            },
            secondary: VappNetworkSettings {
                network_name: Some("Net-B".into()),
                fence_mode: FenceMode::NatRouted,
                retain: false,
            },
        };
        let v = serde_json::to_value(network_config_section("https://vcd", &config)).unwrap();
        let entries = v["networkConfig"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["configuration"]["retainNetInfoAcrossDeployments"], true);
        assert_eq!(entries[1]["configuration"]["fenceMode"], "natRouted");
        assert_eq!(entries[1]["configuration"]["retainNetInfoAcrossDeployments"], false);
    }
}
