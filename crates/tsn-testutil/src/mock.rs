//! Scriptable recording mock of the southbound client.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;
use tsn_model::{
    CbTable, Device, GateControlTable, InformationSettingTable, LoginPolicyTable,
    LoopProtectionTable, NetworkSettingTable, PortDefaultPcpTable, PortSettingTable, RstpTable,
    SnmpTrapTable, StaticForwardTable, StreamPriorityEgressTable, StreamPriorityIngressTable,
    SyslogTable, TimeTable, VlanTable,
};
use tsn_southbound::{LldpNeighbor, Southbound, SouthboundError, SouthboundResult};
use tsn_types::{DeviceId, InterfaceId, MacAddress};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A southbound client that performs no I/O.
///
/// Every call is appended to an ordered log as `"<operation> <target>"`.
/// Failures are scripted per operation (optionally per device via the
/// `"<operation>@<device-id>"` key); synchronization queries answer from a
/// scripted sequence and fall back to a default.
#[derive(Default)]
pub struct MockSouthbound {
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, usize>>,
    delays: Mutex<HashMap<String, Duration>>,
    unreachable: Mutex<HashSet<Ipv4Addr>>,
    firmware: Mutex<HashMap<DeviceId, String>>,
    models: Mutex<HashMap<DeviceId, String>>,
    speeds: Mutex<HashMap<DeviceId, HashMap<InterfaceId, u64>>>,
    lldp: Mutex<HashMap<DeviceId, Vec<LldpNeighbor>>>,
    ip_mac: Mutex<HashMap<Ipv4Addr, MacAddress>>,
    sync_pending_script: Mutex<VecDeque<bool>>,
    sync_pending_default: AtomicBool,
    vlan_matches_script: Mutex<VecDeque<bool>>,
    vlan_matches_default: AtomicBool,
    stop_requested: AtomicBool,
}

impl MockSouthbound {
    pub fn new() -> Self {
        let mock = MockSouthbound::default();
        mock.vlan_matches_default.store(true, Ordering::SeqCst);
        mock
    }

    // --- scripting --------------------------------------------------------

    /// Fails the next `times` calls of `op` (`"configure_vlan"` or
    /// `"configure_vlan@3"` for one device only).
    pub fn with_failures(self, op: &str, times: usize) -> Self {
        lock(&self.failures).insert(op.to_string(), times);
        self
    }

    /// Fails every call of `op`.
    pub fn with_failures_always(self, op: &str) -> Self {
        self.with_failures(op, usize::MAX)
    }

    /// Sleeps before every call of `op`.
    pub fn with_delay(self, op: &str, delay: Duration) -> Self {
        lock(&self.delays).insert(op.to_string(), delay);
        self
    }

    /// Makes ICMP probes of `address` time out.
    pub fn with_unreachable(self, address: Ipv4Addr) -> Self {
        lock(&self.unreachable).insert(address);
        self
    }

    pub fn with_firmware(self, device: DeviceId, version: &str) -> Self {
        lock(&self.firmware).insert(device, version.to_string());
        self
    }

    pub fn with_model_name(self, device: DeviceId, name: &str) -> Self {
        lock(&self.models).insert(device, name.to_string());
        self
    }

    pub fn with_port_speeds(
        self,
        device: DeviceId,
        speeds: impl IntoIterator<Item = (i64, u64)>,
    ) -> Self {
        lock(&self.speeds).insert(
            device,
            speeds
                .into_iter()
                .map(|(interface, speed)| (InterfaceId(interface), speed))
                .collect(),
        );
        self
    }

    pub fn with_lldp(self, device: DeviceId, neighbors: Vec<LldpNeighbor>) -> Self {
        lock(&self.lldp).insert(device, neighbors);
        self
    }

    pub fn with_ip_mac(self, entries: impl IntoIterator<Item = (Ipv4Addr, MacAddress)>) -> Self {
        lock(&self.ip_mac).extend(entries);
        self
    }

    /// Scripted answers for the next sync-flag reads, oldest first.
    pub fn with_sync_pending(self, script: impl IntoIterator<Item = bool>) -> Self {
        lock(&self.sync_pending_script).extend(script);
        self
    }

    /// Answer for sync-flag reads once the script is exhausted.
    pub fn with_sync_pending_default(self, pending: bool) -> Self {
        self.sync_pending_default.store(pending, Ordering::SeqCst);
        self
    }

    /// Scripted answers for the next VLAN-diff queries, oldest first.
    pub fn with_vlan_matches(self, script: impl IntoIterator<Item = bool>) -> Self {
        lock(&self.vlan_matches_script).extend(script);
        self
    }

    // --- observation ------------------------------------------------------

    /// The ordered call log.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// How many logged calls start with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// True once a job propagated its stop request here.
    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    // --- internals --------------------------------------------------------

    fn take_failure(&self, op: &str, device: Option<DeviceId>) -> Option<SouthboundError> {
        let mut failures = lock(&self.failures);
        let keys = [device.map(|d| format!("{op}@{d}")), Some(op.to_string())];
        for key in keys.into_iter().flatten() {
            if let Some(remaining) = failures.get_mut(&key) {
                if *remaining == 0 {
                    failures.remove(&key);
                    continue;
                }
                *remaining -= 1;
                return Some(SouthboundError::operation(op, "scripted failure"));
            }
        }
        None
    }

    async fn invoke(
        &self,
        op: &str,
        device: Option<DeviceId>,
        label: String,
    ) -> SouthboundResult<()> {
        let delay = lock(&self.delays).get(op).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        debug!("mock southbound: {}", label);
        lock(&self.calls).push(label);
        match self.take_failure(op, device) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Southbound for MockSouthbound {
    async fn ping(&self, address: Ipv4Addr, attempts: u8) -> SouthboundResult<()> {
        self.invoke("ping", None, format!("ping {address}")).await?;
        if lock(&self.unreachable).contains(&address) {
            return Err(SouthboundError::unreachable(
                address.to_string(),
                format!("{attempts} echo requests timed out"),
            ));
        }
        Ok(())
    }

    async fn arp_seed(
        &self,
        address: Ipv4Addr,
        _mac: MacAddress,
        _host: Ipv4Addr,
    ) -> SouthboundResult<()> {
        self.invoke("arp_seed", None, format!("arp_seed {address}"))
            .await
    }

    async fn arp_delete(&self, address: Ipv4Addr) -> SouthboundResult<()> {
        self.invoke("arp_delete", None, format!("arp_delete {address}"))
            .await
    }

    async fn clear_arp_cache(&self) -> SouthboundResult<()> {
        self.invoke("clear_arp_cache", None, "clear_arp_cache".to_string())
            .await
    }

    async fn refresh_connect_status(&self, device: &mut Device) -> SouthboundResult<()> {
        self.invoke(
            "refresh_connect_status",
            Some(device.id),
            format!("refresh_connect_status {}", device.id),
        )
        .await?;
        device.status.connected = true;
        device.status.icmp_reachable = true;
        Ok(())
    }

    async fn firmware_version(&self, device: &Device) -> SouthboundResult<String> {
        self.invoke(
            "firmware_version",
            Some(device.id),
            format!("firmware_version {}", device.id),
        )
        .await?;
        Ok(lock(&self.firmware)
            .get(&device.id)
            .cloned()
            .unwrap_or_else(|| device.firmware_version.clone()))
    }

    async fn model_name(&self, device: &Device) -> SouthboundResult<String> {
        self.invoke(
            "model_name",
            Some(device.id),
            format!("model_name {}", device.id),
        )
        .await?;
        Ok(lock(&self.models)
            .get(&device.id)
            .cloned()
            .unwrap_or_else(|| device.model_name.clone()))
    }

    async fn ip_mac_table(&self) -> SouthboundResult<HashMap<Ipv4Addr, MacAddress>> {
        self.invoke("ip_mac_table", None, "ip_mac_table".to_string())
            .await?;
        Ok(lock(&self.ip_mac).clone())
    }

    async fn lldp_neighbors(&self, device: &Device) -> SouthboundResult<Vec<LldpNeighbor>> {
        self.invoke(
            "lldp_neighbors",
            Some(device.id),
            format!("lldp_neighbors {}", device.id),
        )
        .await?;
        Ok(lock(&self.lldp).get(&device.id).cloned().unwrap_or_default())
    }

    async fn port_speeds(
        &self,
        device: &Device,
    ) -> SouthboundResult<HashMap<InterfaceId, u64>> {
        self.invoke(
            "port_speeds",
            Some(device.id),
            format!("port_speeds {}", device.id),
        )
        .await?;
        Ok(lock(&self.speeds)
            .get(&device.id)
            .cloned()
            .unwrap_or_default())
    }

    async fn configure_network_setting(
        &self,
        device: &Device,
        table: &NetworkSettingTable,
    ) -> SouthboundResult<()> {
        self.invoke(
            "configure_network_setting",
            Some(device.id),
            format!("configure_network_setting {} -> {}", device.id, table.address),
        )
        .await
    }

    async fn configure_login_policy(
        &self,
        device: &Device,
        _table: &LoginPolicyTable,
    ) -> SouthboundResult<()> {
        self.invoke(
            "configure_login_policy",
            Some(device.id),
            format!("configure_login_policy {}", device.id),
        )
        .await
    }

    async fn configure_information_setting(
        &self,
        device: &Device,
        _table: &InformationSettingTable,
    ) -> SouthboundResult<()> {
        self.invoke(
            "configure_information_setting",
            Some(device.id),
            format!("configure_information_setting {}", device.id),
        )
        .await
    }

    async fn configure_snmp_trap(
        &self,
        device: &Device,
        _table: &SnmpTrapTable,
    ) -> SouthboundResult<()> {
        self.invoke(
            "configure_snmp_trap",
            Some(device.id),
            format!("configure_snmp_trap {}", device.id),
        )
        .await
    }

    async fn configure_syslog(
        &self,
        device: &Device,
        _table: &SyslogTable,
    ) -> SouthboundResult<()> {
        self.invoke(
            "configure_syslog",
            Some(device.id),
            format!("configure_syslog {}", device.id),
        )
        .await
    }

    async fn configure_time_setting(
        &self,
        device: &Device,
        _table: &TimeTable,
    ) -> SouthboundResult<()> {
        self.invoke(
            "configure_time_setting",
            Some(device.id),
            format!("configure_time_setting {}", device.id),
        )
        .await
    }

    async fn configure_port_setting(
        &self,
        device: &Device,
        _table: &PortSettingTable,
    ) -> SouthboundResult<()> {
        self.invoke(
            "configure_port_setting",
            Some(device.id),
            format!("configure_port_setting {}", device.id),
        )
        .await
    }

    async fn configure_loop_protection(
        &self,
        device: &Device,
        _table: &LoopProtectionTable,
    ) -> SouthboundResult<()> {
        self.invoke(
            "configure_loop_protection",
            Some(device.id),
            format!("configure_loop_protection {}", device.id),
        )
        .await
    }

    async fn configure_vlan(&self, device: &Device, _table: &VlanTable) -> SouthboundResult<()> {
        self.invoke(
            "configure_vlan",
            Some(device.id),
            format!("configure_vlan {}", device.id),
        )
        .await
    }

    async fn configure_port_default_pcp(
        &self,
        device: &Device,
        _table: &PortDefaultPcpTable,
    ) -> SouthboundResult<()> {
        self.invoke(
            "configure_port_default_pcp",
            Some(device.id),
            format!("configure_port_default_pcp {}", device.id),
        )
        .await
    }

    async fn configure_static_forward(
        &self,
        device: &Device,
        _table: &StaticForwardTable,
        unicast: bool,
    ) -> SouthboundResult<()> {
        let op = if unicast {
            "configure_static_forward_unicast"
        } else {
            "configure_static_forward_multicast"
        };
        self.invoke(op, Some(device.id), format!("{op} {}", device.id))
            .await
    }

    async fn configure_stream_priority_ingress(
        &self,
        device: &Device,
        _table: &StreamPriorityIngressTable,
    ) -> SouthboundResult<()> {
        self.invoke(
            "configure_stream_priority_ingress",
            Some(device.id),
            format!("configure_stream_priority_ingress {}", device.id),
        )
        .await
    }

    async fn configure_stream_priority_egress(
        &self,
        device: &Device,
        _table: &StreamPriorityEgressTable,
    ) -> SouthboundResult<()> {
        self.invoke(
            "configure_stream_priority_egress",
            Some(device.id),
            format!("configure_stream_priority_egress {}", device.id),
        )
        .await
    }

    async fn configure_spanning_tree(
        &self,
        device: &Device,
        _table: &RstpTable,
    ) -> SouthboundResult<()> {
        self.invoke(
            "configure_spanning_tree",
            Some(device.id),
            format!("configure_spanning_tree {}", device.id),
        )
        .await
    }

    async fn configure_ieee802_1cb(
        &self,
        device: &Device,
        _table: &CbTable,
    ) -> SouthboundResult<()> {
        self.invoke(
            "configure_ieee802_1cb",
            Some(device.id),
            format!("configure_ieee802_1cb {}", device.id),
        )
        .await
    }

    async fn configure_gate_control(
        &self,
        device: &Device,
        _table: &GateControlTable,
    ) -> SouthboundResult<()> {
        self.invoke(
            "configure_gate_control",
            Some(device.id),
            format!("configure_gate_control {}", device.id),
        )
        .await
    }

    async fn config_sync_pending(&self, device: &Device) -> SouthboundResult<bool> {
        self.invoke(
            "config_sync_pending",
            Some(device.id),
            format!("config_sync_pending {}", device.id),
        )
        .await?;
        Ok(lock(&self.sync_pending_script)
            .pop_front()
            .unwrap_or_else(|| self.sync_pending_default.load(Ordering::SeqCst)))
    }

    async fn vlan_config_matches(
        &self,
        device: &Device,
        _table: &VlanTable,
    ) -> SouthboundResult<bool> {
        self.invoke(
            "vlan_config_matches",
            Some(device.id),
            format!("vlan_config_matches {}", device.id),
        )
        .await?;
        Ok(lock(&self.vlan_matches_script)
            .pop_front()
            .unwrap_or_else(|| self.vlan_matches_default.load(Ordering::SeqCst)))
    }

    async fn reboot(&self, device: &Device) -> SouthboundResult<()> {
        self.invoke("reboot", Some(device.id), format!("reboot {}", device.id))
            .await
    }

    async fn factory_default(&self, device: &Device) -> SouthboundResult<()> {
        self.invoke(
            "factory_default",
            Some(device.id),
            format!("factory_default {}", device.id),
        )
        .await
    }

    async fn firmware_upgrade(&self, device: &Device, firmware: &str) -> SouthboundResult<()> {
        self.invoke(
            "firmware_upgrade",
            Some(device.id),
            format!("firmware_upgrade {} {firmware}", device.id),
        )
        .await
    }

    fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[tokio::test]
    async fn records_calls_in_order() {
        let mock = MockSouthbound::new();
        let device = fixtures::switch(1, [10, 0, 0, 1], "00:90:e8:00:00:01");

        mock.ping(device.ipv4.address, 3).await.unwrap();
        mock.configure_vlan(&device, &VlanTable::default())
            .await
            .unwrap();

        assert_eq!(mock.calls(), vec!["ping 10.0.0.1", "configure_vlan 1"]);
        assert_eq!(mock.count("configure_vlan"), 1);
    }

    #[tokio::test]
    async fn scripted_failures_are_consumed() {
        let mock = MockSouthbound::new().with_failures("configure_vlan", 1);
        let device = fixtures::switch(1, [10, 0, 0, 1], "00:90:e8:00:00:01");

        assert!(mock
            .configure_vlan(&device, &VlanTable::default())
            .await
            .is_err());
        assert!(mock
            .configure_vlan(&device, &VlanTable::default())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn per_device_failures_only_hit_that_device() {
        let mock = MockSouthbound::new().with_failures("configure_vlan@2", 1);
        let one = fixtures::switch(1, [10, 0, 0, 1], "00:90:e8:00:00:01");
        let two = fixtures::switch(2, [10, 0, 0, 2], "00:90:e8:00:00:02");

        assert!(mock.configure_vlan(&one, &VlanTable::default()).await.is_ok());
        assert!(mock.configure_vlan(&two, &VlanTable::default()).await.is_err());
    }

    #[tokio::test]
    async fn sync_script_then_default() {
        let mock = MockSouthbound::new()
            .with_sync_pending([true, false])
            .with_sync_pending_default(false);
        let device = fixtures::switch(1, [10, 0, 0, 1], "00:90:e8:00:00:01");

        assert!(mock.config_sync_pending(&device).await.unwrap());
        assert!(!mock.config_sync_pending(&device).await.unwrap());
        assert!(!mock.config_sync_pending(&device).await.unwrap());
    }
}
