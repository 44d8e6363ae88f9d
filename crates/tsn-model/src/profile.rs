//! Device and firmware capability profiles.
//!
//! A device profile describes a model family; a firmware feature profile
//! pins the capability set of one (model, firmware version) pair. The
//! deployment pipeline probes the live firmware version and re-derives the
//! device's [`FeatureGroup`] from these before gating.

use crate::feature::FeatureGroup;
use serde::{Deserialize, Serialize};

/// Static capability profile of a device model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub id: i64,
    pub model_name: String,
    pub feature_group: FeatureGroup,
    /// Largest gate control list the hardware accepts per interface.
    pub gate_control_list_capacity: u32,
}

/// Capability profile of a specific firmware build of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirmwareFeatureProfile {
    pub id: i64,
    pub model_name: String,
    pub firmware_version: String,
    pub feature_group: FeatureGroup,
}

/// The profile collections a job runs against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileSet {
    pub device_profiles: Vec<DeviceProfile>,
    pub firmware_profiles: Vec<FirmwareFeatureProfile>,
}

impl ProfileSet {
    /// Looks up a device profile by id.
    pub fn device_profile(&self, id: i64) -> Option<&DeviceProfile> {
        self.device_profiles.iter().find(|p| p.id == id)
    }

    /// Looks up the firmware feature profile for a (model, firmware
    /// version) pair.
    pub fn firmware_profile(
        &self,
        model_name: &str,
        firmware_version: &str,
    ) -> Option<&FirmwareFeatureProfile> {
        self.firmware_profiles
            .iter()
            .find(|p| p.model_name == model_name && p.firmware_version == firmware_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn firmware_profile_lookup_matches_model_and_version() {
        let set = ProfileSet {
            device_profiles: vec![],
            firmware_profiles: vec![FirmwareFeatureProfile {
                id: 10,
                model_name: "TSN-G5008".into(),
                firmware_version: "v2.2".into(),
                feature_group: FeatureGroup::full(),
            }],
        };

        assert!(set.firmware_profile("TSN-G5008", "v2.2").is_some());
        assert!(set.firmware_profile("TSN-G5008", "v2.1").is_none());
        assert!(set.firmware_profile("TSN-G5004", "v2.2").is_none());
    }
}
