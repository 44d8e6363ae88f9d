//! Device capability flags.
//!
//! A [`FeatureGroup`] describes which configuration areas a device's
//! firmware supports. It is sourced from the firmware feature profile
//! matched against the device's live firmware version, falling back to the
//! static device profile. The capability gate in the deployment pipeline
//! checks these flags against the configuration artifact before any
//! southbound call is made.

use serde::{Deserialize, Serialize};

/// VLAN-related capability flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VlanFeatures {
    pub access_trunk_mode: bool,
    pub hybrid_mode: bool,
    pub te_mstid: bool,
    pub default_pvid: bool,
    pub default_pcp: bool,
    pub per_stream_priority: bool,
    pub per_stream_priority_v2: bool,
}

/// Static forwarding capability flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticForwardFeatures {
    pub unicast: bool,
    pub multicast: bool,
}

/// Spanning tree capability flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanningTreeFeatures {
    pub rstp: bool,
}

/// TSN capability flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TsnFeatures {
    pub ieee802_1cb: bool,
    pub ieee802_1qbv: bool,
}

/// Configuration-area capability flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigurationFeatures {
    pub network_setting: bool,
    pub login_policy: bool,
    pub information_setting: bool,
    pub snmp_trap_setting: bool,
    pub syslog_setting: bool,
    pub time_setting: bool,
    pub port_setting: bool,
    pub loop_protection: bool,
    /// The device applies pushed configuration asynchronously and exposes a
    /// synchronization flag the pipeline must poll before trusting state.
    pub check_config_synchronization: bool,
    pub vlan: VlanFeatures,
    pub static_forward: StaticForwardFeatures,
    pub spanning_tree: SpanningTreeFeatures,
    pub tsn: TsnFeatures,
}

/// Operation capability flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationFeatures {
    pub reboot: bool,
    pub factory_default: bool,
    pub firmware_upgrade: bool,
}

/// A device's full declared capability set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureGroup {
    pub configuration: ConfigurationFeatures,
    pub operation: OperationFeatures,
}

impl FeatureGroup {
    /// A capability set with every flag enabled.
    ///
    /// Used by fixtures and as the profile for fully featured switches.
    pub fn full() -> Self {
        FeatureGroup {
            configuration: ConfigurationFeatures {
                network_setting: true,
                login_policy: true,
                information_setting: true,
                snmp_trap_setting: true,
                syslog_setting: true,
                time_setting: true,
                port_setting: true,
                loop_protection: true,
                check_config_synchronization: true,
                vlan: VlanFeatures {
                    access_trunk_mode: true,
                    hybrid_mode: true,
                    te_mstid: true,
                    default_pvid: true,
                    default_pcp: true,
                    per_stream_priority: true,
                    per_stream_priority_v2: true,
                },
                static_forward: StaticForwardFeatures {
                    unicast: true,
                    multicast: true,
                },
                spanning_tree: SpanningTreeFeatures { rstp: true },
                tsn: TsnFeatures {
                    ieee802_1cb: true,
                    ieee802_1qbv: true,
                },
            },
            operation: OperationFeatures {
                reboot: true,
                factory_default: true,
                firmware_upgrade: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_all_disabled() {
        let group = FeatureGroup::default();
        assert!(!group.configuration.network_setting);
        assert!(!group.configuration.vlan.hybrid_mode);
        assert!(!group.operation.reboot);
    }

    #[test]
    fn full_enables_everything() {
        let group = FeatureGroup::full();
        assert!(group.configuration.check_config_synchronization);
        assert!(group.configuration.tsn.ieee802_1qbv);
        assert!(group.operation.firmware_upgrade);
    }

    #[test]
    fn serde_fills_missing_fields() {
        let group: FeatureGroup =
            serde_json::from_str(r#"{"configuration":{"vlan":{"hybrid_mode":true}}}"#).unwrap();
        assert!(group.configuration.vlan.hybrid_mode);
        assert!(!group.configuration.vlan.access_trunk_mode);
    }
}
