//! Per-device configuration tables.
//!
//! [`DeviceConfig`] is the configuration artifact produced by the upstream
//! scheduling/routing engine: one map per feature area, keyed by device id.
//! A missing key means "nothing to deploy for that area on that device" and
//! is never an error. The tables are read-only to the pipelines.

use crate::device::Device;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::Ipv4Addr;
use tsn_types::{DeviceId, InterfaceId, MacAddress, Pcp, VlanId};

/// IPv4 assignment mode for the management interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkSettingMode {
    #[default]
    Static,
    Dhcp,
}

/// Management-plane IPv4 configuration to push onto a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSettingTable {
    pub device: DeviceId,
    pub mode: NetworkSettingMode,
    pub address: Ipv4Addr,
    pub subnet_mask: Ipv4Addr,
    pub gateway: Option<Ipv4Addr>,
    pub dns1: Option<Ipv4Addr>,
    pub dns2: Option<Ipv4Addr>,
}

impl NetworkSettingTable {
    /// A table that re-asserts the device's current designed settings.
    pub fn from_device(device: &Device) -> Self {
        NetworkSettingTable {
            device: device.id,
            mode: NetworkSettingMode::Static,
            address: device.ipv4.address,
            subnet_mask: device.ipv4.subnet_mask,
            gateway: device.ipv4.gateway,
            dns1: device.ipv4.dns1,
            dns2: device.ipv4.dns2,
        }
    }
}

/// IP remap for a device whose designed address is not yet live.
///
/// `online_ip` is where the device answers right now (discovered by
/// broadcast search, addressed via its MAC); `offline_ip` is the address
/// the design assigns to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpMappingTable {
    pub device: DeviceId,
    pub mac: MacAddress,
    pub online_ip: Ipv4Addr,
    pub offline_ip: Ipv4Addr,
    pub subnet_mask: Ipv4Addr,
    pub gateway: Option<Ipv4Addr>,
    pub dns1: Option<Ipv4Addr>,
    pub dns2: Option<Ipv4Addr>,
}

/// Login policy settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginPolicyTable {
    pub device: DeviceId,
    pub login_message: String,
    pub failure_message: String,
    pub failure_lockout: bool,
    pub retry_failure_threshold: i32,
    pub lockout_duration_s: i32,
    pub auto_logout_after_s: i32,
}

/// Device identity strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InformationSettingTable {
    pub device: DeviceId,
    pub device_name: String,
    pub location: String,
    pub description: String,
    pub contact_information: String,
}

/// SNMP trap targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnmpTrapTable {
    pub device: DeviceId,
    pub hosts: Vec<SnmpTrapHost>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnmpTrapHost {
    pub address: Ipv4Addr,
    pub community: String,
}

/// Syslog forwarding targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyslogTable {
    pub device: DeviceId,
    pub enabled: bool,
    pub servers: Vec<SyslogServer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyslogServer {
    pub address: Ipv4Addr,
    pub port: u16,
}

/// Clock source configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeTable {
    pub device: DeviceId,
    pub clock_source: ClockSource,
    pub ntp_server_1: Option<Ipv4Addr>,
    pub ntp_server_2: Option<Ipv4Addr>,
    pub time_zone_offset_minutes: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockSource {
    #[default]
    Local,
    Sntp,
    Ntp,
    Ptp,
}

/// Per-port admin status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSettingTable {
    pub device: DeviceId,
    pub entries: Vec<PortAdminEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortAdminEntry {
    pub interface: InterfaceId,
    pub enabled: bool,
}

/// Loop protection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopProtectionTable {
    pub device: DeviceId,
    pub enabled: bool,
    pub detect_interval_s: i32,
}

/// VLAN port membership mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VlanPortType {
    Access,
    Trunk,
    Hybrid,
}

/// Static VLAN entry; `te_mstid` marks traffic-engineered VLANs carried in
/// a TE-MSTID instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanStaticEntry {
    pub vlan: VlanId,
    pub te_mstid: bool,
    pub member_interfaces: Vec<InterfaceId>,
}

/// Port default VLAN assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortVlanEntry {
    pub interface: InterfaceId,
    pub pvid: u16,
}

/// Port VLAN mode assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortTypeEntry {
    pub interface: InterfaceId,
    pub port_type: VlanPortType,
}

/// VLAN configuration: static VLANs, port PVIDs and port types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanTable {
    pub device: DeviceId,
    pub static_entries: Vec<VlanStaticEntry>,
    pub port_vlan_entries: Vec<PortVlanEntry>,
    pub port_type_entries: Vec<PortTypeEntry>,
}

/// Per-port default priority code point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDefaultPcpTable {
    pub device: DeviceId,
    pub entries: Vec<PortDefaultPcpEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDefaultPcpEntry {
    pub interface: InterfaceId,
    pub pcp: Pcp,
}

/// Static forwarding entry. The same table shape serves the unicast and
/// multicast maps; which one a table belongs to is decided by the map it
/// sits in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticForwardEntry {
    pub mac: MacAddress,
    pub vlan: VlanId,
    pub egress_interfaces: Vec<InterfaceId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticForwardTable {
    pub device: DeviceId,
    pub entries: Vec<StaticForwardEntry>,
}

/// Per-stream priority classification at ingress.
///
/// `v2` selects the L3-capable second-generation classifier; a v1 table
/// may be deployed through either implementation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamPriorityIngressTable {
    pub device: DeviceId,
    pub v2: bool,
    pub entries: Vec<StreamPriorityIngressEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamPriorityIngressEntry {
    pub interface: InterfaceId,
    pub stream_vlan: VlanId,
    pub pcp: Pcp,
}

/// Per-stream priority handling at egress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamPriorityEgressTable {
    pub device: DeviceId,
    pub entries: Vec<StreamPriorityEgressEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamPriorityEgressEntry {
    pub interface: InterfaceId,
    pub egress_untag: bool,
}

/// Rapid spanning tree configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RstpTable {
    pub device: DeviceId,
    pub enabled: bool,
    pub bridge_priority: u16,
    pub port_entries: Vec<RstpPortEntry>,
}

impl RstpTable {
    /// The pre-clear configuration pushed before deployment so stale
    /// spanning-tree state cannot shadow the designed one.
    pub fn baseline(device: DeviceId) -> Self {
        RstpTable {
            device,
            ..RstpTable::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RstpPortEntry {
    pub interface: InterfaceId,
    pub enabled: bool,
    pub path_cost: u32,
}

/// IEEE 802.1CB frame replication and elimination configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CbTable {
    pub device: DeviceId,
    pub stream_identities: Vec<StreamIdentityEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamIdentityEntry {
    pub handle: u32,
    pub mac: MacAddress,
    pub vlan: VlanId,
}

/// Gate parameters of one interface (IEEE 802.1Qbv).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceGateParameters {
    pub interface: InterfaceId,
    pub gate_enabled: bool,
    pub admin_control_list_len: u32,
    pub cycle_time_ns: u64,
}

/// Gate control lists for all scheduled interfaces of a device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateControlTable {
    pub device: DeviceId,
    pub interfaces: Vec<InterfaceGateParameters>,
}

/// The full configuration artifact: one table map per feature area, keyed
/// by device id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub ip_mappings: HashMap<DeviceId, IpMappingTable>,
    pub network_settings: HashMap<DeviceId, NetworkSettingTable>,
    pub login_policies: HashMap<DeviceId, LoginPolicyTable>,
    pub information_settings: HashMap<DeviceId, InformationSettingTable>,
    pub snmp_traps: HashMap<DeviceId, SnmpTrapTable>,
    pub syslogs: HashMap<DeviceId, SyslogTable>,
    pub time_settings: HashMap<DeviceId, TimeTable>,
    pub port_settings: HashMap<DeviceId, PortSettingTable>,
    pub loop_protections: HashMap<DeviceId, LoopProtectionTable>,
    pub vlans: HashMap<DeviceId, VlanTable>,
    pub port_default_pcps: HashMap<DeviceId, PortDefaultPcpTable>,
    pub unicast_static_forwards: HashMap<DeviceId, StaticForwardTable>,
    pub multicast_static_forwards: HashMap<DeviceId, StaticForwardTable>,
    pub stream_priority_ingress: HashMap<DeviceId, StreamPriorityIngressTable>,
    pub stream_priority_egress: HashMap<DeviceId, StreamPriorityEgressTable>,
    pub rstp: HashMap<DeviceId, RstpTable>,
    pub cb: HashMap<DeviceId, CbTable>,
    pub gate_controls: HashMap<DeviceId, GateControlTable>,
}
