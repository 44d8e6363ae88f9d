//! Project and profile fixtures for pipeline tests.

use std::net::Ipv4Addr;
use tsn_model::{
    Device, DeviceConfig, DeviceProfile, DeviceRole, DeviceStatus, Endpoint, FeatureGroup,
    Ipv4Settings, Link, ProfileSet, Project, StaticForwardEntry, StaticForwardTable, VlanStaticEntry,
    VlanTable,
};
use tsn_types::{DeviceId, InterfaceId, MacAddress, VlanId};

pub const MODEL_NAME: &str = "TSN-G5008";
pub const FIRMWARE_VERSION: &str = "v1.0";

/// A fully featured TSN switch.
pub fn switch(id: i64, address: [u8; 4], mac: &str) -> Device {
    Device {
        id: DeviceId(id),
        name: format!("sw-{id}"),
        mac: mac.parse().expect("fixture MAC"),
        ipv4: Ipv4Settings::with_address(Ipv4Addr::from(address)),
        model_name: MODEL_NAME.to_string(),
        device_profile_id: 1,
        firmware_feature_profile_id: None,
        firmware_version: FIRMWARE_VERSION.to_string(),
        role: DeviceRole::TsnSwitch,
        feature_group: FeatureGroup::full(),
        status: DeviceStatus::default(),
    }
}

/// A non-configurable end station.
pub fn end_station(id: i64, address: [u8; 4], mac: &str) -> Device {
    Device {
        role: DeviceRole::EndStation,
        ..switch(id, address, mac)
    }
}

/// An undirected design link between two (device, interface) endpoints.
pub fn link(id: i64, a: (i64, i64), b: (i64, i64), speed_mbps: u64) -> Link {
    Link {
        id,
        source: Endpoint::new(a.0, a.1),
        destination: Endpoint::new(b.0, b.1),
        speed_mbps,
        propagation_delay_ns: None,
    }
}

/// A project holding the given devices and links, with an empty artifact.
pub fn project(devices: Vec<Device>, links: Vec<Link>) -> Project {
    Project {
        name: "test-project".to_string(),
        devices,
        links,
        device_config: DeviceConfig::default(),
    }
}

/// The profile set the fixtures' model resolves against: one device
/// profile, no firmware-pinned profiles, so devices keep their own
/// declared feature group while their live firmware matches the design.
pub fn profiles() -> ProfileSet {
    ProfileSet {
        device_profiles: vec![DeviceProfile {
            id: 1,
            model_name: MODEL_NAME.to_string(),
            feature_group: FeatureGroup::full(),
            gate_control_list_capacity: 32,
        }],
        firmware_profiles: vec![],
    }
}

/// A VLAN table with one static entry per given VLAN id.
pub fn vlan_table(device: i64, vlans: &[u16]) -> VlanTable {
    VlanTable {
        device: DeviceId(device),
        static_entries: vlans
            .iter()
            .map(|v| VlanStaticEntry {
                vlan: VlanId::new(*v).expect("fixture VLAN id"),
                te_mstid: false,
                member_interfaces: vec![InterfaceId(1)],
            })
            .collect(),
        ..VlanTable::default()
    }
}

/// A static-forward table with one entry per MAC.
pub fn static_forward_table(device: i64, macs: &[&str]) -> StaticForwardTable {
    StaticForwardTable {
        device: DeviceId(device),
        entries: macs
            .iter()
            .map(|m| StaticForwardEntry {
                mac: m.parse::<MacAddress>().expect("fixture MAC"),
                vlan: VlanId::DEFAULT,
                egress_interfaces: vec![InterfaceId(1)],
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_devices_are_consistent() {
        let device = switch(3, [10, 0, 0, 3], "00:90:e8:00:00:03");
        assert!(device.is_deployable());
        assert_eq!(device.ipv4.address, Ipv4Addr::new(10, 0, 0, 3));

        let station = end_station(4, [10, 0, 0, 4], "00:90:e8:00:00:04");
        assert!(!station.is_deployable());
    }

    #[test]
    fn vlan_table_builds_entries() {
        let table = vlan_table(1, &[10, 20]);
        assert_eq!(table.static_entries.len(), 2);
        assert_eq!(table.static_entries[0].vlan.as_u16(), 10);
    }
}
