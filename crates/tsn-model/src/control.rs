//! Step-selection switches for the deployment and comparison pipelines.

use serde::{Deserialize, Serialize};

/// Selects which deployment steps run for one invocation.
///
/// These are advisory: a selected step with no matching table for a device
/// is silently skipped for that device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployControl {
    pub network_setting: bool,
    pub login_policy: bool,
    pub information_setting: bool,
    pub snmp_trap_setting: bool,
    pub syslog_setting: bool,
    pub time_setting: bool,
    pub port_setting: bool,
    pub loop_protection: bool,
    pub vlan: bool,
    pub port_default_pcp: bool,
    pub unicast_static_forward: bool,
    pub multicast_static_forward: bool,
    pub stream_priority_ingress: bool,
    pub stream_priority_egress: bool,
    pub spanning_tree: bool,
    pub ieee802_1cb: bool,
    pub gate_control: bool,
    pub reboot: bool,
    pub factory_default: bool,
    pub firmware_upgrade: bool,
    /// The cohort was produced by broadcast search: devices are addressed
    /// via their MAC through the temporary address-resolution mapping.
    pub from_broadcast_search: bool,
}

impl DeployControl {
    /// A control with every configuration step enabled and the one-shot
    /// operations (reboot, factory default, firmware upgrade) disabled.
    pub fn all_configuration() -> Self {
        DeployControl {
            network_setting: true,
            login_policy: true,
            information_setting: true,
            snmp_trap_setting: true,
            syslog_setting: true,
            time_setting: true,
            port_setting: true,
            loop_protection: true,
            vlan: true,
            port_default_pcp: true,
            unicast_static_forward: true,
            multicast_static_forward: true,
            stream_priority_ingress: true,
            stream_priority_egress: true,
            spanning_tree: true,
            ieee802_1cb: true,
            gate_control: true,
            ..DeployControl::default()
        }
    }
}

/// Selects which verification checks the topology comparison runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareControl {
    pub hybrid_vlan_consistent: bool,
    pub device_config: bool,
    pub alive: bool,
    pub topology_consistent: bool,
    pub model_name: bool,
    pub link_speed: bool,
}

impl CompareControl {
    /// A control with every check enabled.
    pub fn all_checks() -> Self {
        CompareControl {
            hybrid_vlan_consistent: true,
            device_config: true,
            alive: true,
            topology_consistent: true,
            model_name: true,
            link_speed: true,
        }
    }
}
