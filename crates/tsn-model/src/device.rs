//! Device record and connectivity status.

use crate::feature::FeatureGroup;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use tsn_types::{DeviceId, MacAddress};

/// What kind of node the design places at this position.
///
/// Only TSN switches take configuration; end stations and unknown nodes are
/// excluded from deployment and comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceRole {
    TsnSwitch,
    EndStation,
    Unknown,
}

/// IPv4 management-plane settings of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv4Settings {
    pub address: Ipv4Addr,
    pub subnet_mask: Ipv4Addr,
    pub gateway: Option<Ipv4Addr>,
    pub dns1: Option<Ipv4Addr>,
    pub dns2: Option<Ipv4Addr>,
}

impl Ipv4Settings {
    /// Settings with only an address and a /24 mask, no gateway or DNS.
    pub fn with_address(address: Ipv4Addr) -> Self {
        Ipv4Settings {
            address,
            subnet_mask: Ipv4Addr::new(255, 255, 255, 0),
            gateway: None,
            dns1: None,
            dns2: None,
        }
    }
}

/// Live connectivity status, refreshed over southbound during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceStatus {
    pub icmp_reachable: bool,
    pub connected: bool,
}

/// A device owned by the project.
///
/// Mutations during a job (IP swap after a network-setting push, feature
/// group refresh after the firmware probe) happen on the job's local copy
/// and are never written back to the project implicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub mac: MacAddress,
    pub ipv4: Ipv4Settings,
    pub model_name: String,
    pub device_profile_id: i64,
    pub firmware_feature_profile_id: Option<i64>,
    pub firmware_version: String,
    pub role: DeviceRole,
    pub feature_group: FeatureGroup,
    pub status: DeviceStatus,
}

impl Device {
    /// Returns true if the deployment and comparison pipelines may target
    /// this device.
    pub fn is_deployable(&self) -> bool {
        matches!(self.role, DeviceRole::TsnSwitch)
    }

    /// Short identity string used in logs: `ip(id)`.
    pub fn label(&self) -> String {
        format!("{}({})", self.ipv4.address, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(role: DeviceRole) -> Device {
        Device {
            id: DeviceId(1),
            name: "sw-1".into(),
            mac: "00:90:e8:00:00:01".parse().unwrap(),
            ipv4: Ipv4Settings::with_address(Ipv4Addr::new(192, 168, 127, 1)),
            model_name: "TSN-G5008".into(),
            device_profile_id: 1,
            firmware_feature_profile_id: None,
            firmware_version: "v1.0".into(),
            role,
            feature_group: FeatureGroup::default(),
            status: DeviceStatus::default(),
        }
    }

    #[test]
    fn only_switches_are_deployable() {
        assert!(device(DeviceRole::TsnSwitch).is_deployable());
        assert!(!device(DeviceRole::EndStation).is_deployable());
        assert!(!device(DeviceRole::Unknown).is_deployable());
    }

    #[test]
    fn label_contains_address_and_id() {
        assert_eq!(device(DeviceRole::TsnSwitch).label(), "192.168.127.1(1)");
    }
}
