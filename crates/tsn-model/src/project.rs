//! Project: the unit a job runs against.

use crate::device::Device;
use crate::link::Link;
use crate::tables::DeviceConfig;
use serde::{Deserialize, Serialize};
use tsn_types::DeviceId;

/// A designed network: devices, links and the configuration artifact.
///
/// Owned by the caller; jobs receive a clone and never write back. When
/// several jobs can target the same project, the caller serializes access
/// with its own lock.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub devices: Vec<Device>,
    pub links: Vec<Link>,
    pub device_config: DeviceConfig,
}

impl Project {
    /// Looks up a device by id.
    pub fn device_by_id(&self, id: DeviceId) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == id)
    }

    /// Ids of every device the pipelines may target.
    pub fn deployable_device_ids(&self) -> Vec<DeviceId> {
        self.devices
            .iter()
            .filter(|d| d.is_deployable())
            .map(|d| d.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceRole, DeviceStatus, Ipv4Settings};
    use crate::feature::FeatureGroup;
    use std::net::Ipv4Addr;

    fn device(id: i64, role: DeviceRole) -> Device {
        Device {
            id: DeviceId(id),
            name: format!("dev-{id}"),
            mac: "00:90:e8:00:00:01".parse().unwrap(),
            ipv4: Ipv4Settings::with_address(Ipv4Addr::new(10, 0, 0, id as u8)),
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
    fn deployable_ids_exclude_end_stations() {
        let project = Project {
            name: "plant".into(),
            devices: vec![
                device(1, DeviceRole::TsnSwitch),
                device(2, DeviceRole::EndStation),
                device(3, DeviceRole::TsnSwitch),
            ],
            links: vec![],
            device_config: DeviceConfig::default(),
        };

        assert_eq!(
            project.deployable_device_ids(),
            vec![DeviceId(1), DeviceId(3)]
        );
        assert!(project.device_by_id(DeviceId(2)).is_some());
        assert!(project.device_by_id(DeviceId(9)).is_none());
    }
}
