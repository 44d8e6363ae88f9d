//! The `Southbound` trait.

use crate::SouthboundResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::Ipv4Addr;
use tsn_model::{
    CbTable, Device, GateControlTable, InformationSettingTable, LoginPolicyTable,
    LoopProtectionTable, NetworkSettingTable, PortDefaultPcpTable, PortSettingTable, RstpTable,
    SnmpTrapTable, StaticForwardTable, StreamPriorityEgressTable, StreamPriorityIngressTable,
    SyslogTable, TimeTable, VlanTable,
};
use tsn_types::{InterfaceId, MacAddress};

/// One LLDP neighborship as reported by a device: a local port wired to a
/// remote chassis/port pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LldpNeighbor {
    pub local_interface: InterfaceId,
    pub remote_chassis_mac: MacAddress,
    pub remote_interface: InterfaceId,
}

/// The protocol surface the orchestration pipelines drive.
///
/// Implementations are shared between concurrently polled jobs, so every
/// method takes `&self`. Device identity (address, connection credentials)
/// travels inside the [`Device`] argument. [`Southbound::request_stop`] is
/// the cooperative-cancellation hook: a stopping job calls it so an
/// in-flight protocol exchange can abort instead of running to its timeout.
#[async_trait]
pub trait Southbound: Send + Sync {
    // --- reachability -----------------------------------------------------

    /// ICMP-probes an address, `attempts` echo requests.
    async fn ping(&self, address: Ipv4Addr, attempts: u8) -> SouthboundResult<()>;

    /// Seeds a static entry in the local address-resolution table so
    /// `address` resolves to `mac` via the `host` adapter.
    async fn arp_seed(
        &self,
        address: Ipv4Addr,
        mac: MacAddress,
        host: Ipv4Addr,
    ) -> SouthboundResult<()>;

    /// Removes a previously seeded address-resolution entry.
    async fn arp_delete(&self, address: Ipv4Addr) -> SouthboundResult<()>;

    /// Flushes the local address-resolution cache.
    async fn clear_arp_cache(&self) -> SouthboundResult<()>;

    /// Refreshes the device's live connectivity status in place.
    async fn refresh_connect_status(&self, device: &mut Device) -> SouthboundResult<()>;

    // --- identity queries -------------------------------------------------

    /// Reads the firmware version string off the device.
    async fn firmware_version(&self, device: &Device) -> SouthboundResult<String>;

    /// Reads the model name off the device.
    async fn model_name(&self, device: &Device) -> SouthboundResult<String>;

    /// Live IP-to-MAC mapping of the reachable management network.
    async fn ip_mac_table(&self) -> SouthboundResult<HashMap<Ipv4Addr, MacAddress>>;

    /// LLDP neighborships as the device currently reports them.
    async fn lldp_neighbors(&self, device: &Device) -> SouthboundResult<Vec<LldpNeighbor>>;

    /// Live per-interface speed in Mbit/s. Zero means the device could not
    /// report a speed for that interface.
    async fn port_speeds(&self, device: &Device)
        -> SouthboundResult<HashMap<InterfaceId, u64>>;

    // --- configuration ----------------------------------------------------

    async fn configure_network_setting(
        &self,
        device: &Device,
        table: &NetworkSettingTable,
    ) -> SouthboundResult<()>;

    async fn configure_login_policy(
        &self,
        device: &Device,
        table: &LoginPolicyTable,
    ) -> SouthboundResult<()>;

    async fn configure_information_setting(
        &self,
        device: &Device,
        table: &InformationSettingTable,
    ) -> SouthboundResult<()>;

    async fn configure_snmp_trap(
        &self,
        device: &Device,
        table: &SnmpTrapTable,
    ) -> SouthboundResult<()>;

    async fn configure_syslog(&self, device: &Device, table: &SyslogTable)
        -> SouthboundResult<()>;

    async fn configure_time_setting(
        &self,
        device: &Device,
        table: &TimeTable,
    ) -> SouthboundResult<()>;

    async fn configure_port_setting(
        &self,
        device: &Device,
        table: &PortSettingTable,
    ) -> SouthboundResult<()>;

    async fn configure_loop_protection(
        &self,
        device: &Device,
        table: &LoopProtectionTable,
    ) -> SouthboundResult<()>;

    async fn configure_vlan(&self, device: &Device, table: &VlanTable) -> SouthboundResult<()>;

    async fn configure_port_default_pcp(
        &self,
        device: &Device,
        table: &PortDefaultPcpTable,
    ) -> SouthboundResult<()>;

    /// `unicast` selects between the unicast and multicast forwarding
    /// tables on the device.
    async fn configure_static_forward(
        &self,
        device: &Device,
        table: &StaticForwardTable,
        unicast: bool,
    ) -> SouthboundResult<()>;

    async fn configure_stream_priority_ingress(
        &self,
        device: &Device,
        table: &StreamPriorityIngressTable,
    ) -> SouthboundResult<()>;

    async fn configure_stream_priority_egress(
        &self,
        device: &Device,
        table: &StreamPriorityEgressTable,
    ) -> SouthboundResult<()>;

    async fn configure_spanning_tree(
        &self,
        device: &Device,
        table: &RstpTable,
    ) -> SouthboundResult<()>;

    async fn configure_ieee802_1cb(
        &self,
        device: &Device,
        table: &CbTable,
    ) -> SouthboundResult<()>;

    async fn configure_gate_control(
        &self,
        device: &Device,
        table: &GateControlTable,
    ) -> SouthboundResult<()>;

    // --- synchronization --------------------------------------------------

    /// Reads the device's configuration-synchronization flag. `true` means
    /// the control plane has not finished applying pushed configuration.
    /// Reading the flag also clears it on devices that latch it.
    async fn config_sync_pending(&self, device: &Device) -> SouthboundResult<bool>;

    /// Diffs the device's live VLAN state against an intended table.
    async fn vlan_config_matches(
        &self,
        device: &Device,
        table: &VlanTable,
    ) -> SouthboundResult<bool>;

    // --- operations -------------------------------------------------------

    async fn reboot(&self, device: &Device) -> SouthboundResult<()>;

    async fn factory_default(&self, device: &Device) -> SouthboundResult<()>;

    async fn firmware_upgrade(&self, device: &Device, firmware: &str) -> SouthboundResult<()>;

    // --- cancellation -----------------------------------------------------

    /// Asks the client to abort in-flight and future operations. Called by
    /// a stopping job before it waits for its worker.
    fn request_stop(&self);
}
