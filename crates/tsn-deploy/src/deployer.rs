//! The deployment pipeline.
//!
//! One cohort per job, devices strictly sequential in caller order, a
//! fixed step order per device. Failures are isolated at device
//! granularity: every error is converted into a result-queue entry and the
//! pipeline continues with the next device. Only the capability pre-flight
//! is all-or-nothing, so a firmware/feature mismatch in one device cannot
//! leave the others half-configured.
//!
//! Devices that apply configuration asynchronously declare
//! `check_config_synchronization`; for them the VLAN-onward sub-sequence
//! re-runs when the device reports unsynchronized state, up to
//! [`SYNC_RETRY_LIMIT`] times.

use crate::error::{DeployError, DeployResult};
use crate::feature_check::check_device_features;
use crate::reachability::ReachabilityBootstrap;
use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tsn_job::{JobContext, JobError, JobRunner, JobState};
use tsn_model::{
    Device, DeviceConfig, DeviceConfigureResult, DeployControl, NetworkSettingTable, ProfileSet,
    Project, RstpTable,
};
use tsn_southbound::Southbound;
use tsn_types::{DeviceId, MacAddress};

/// How many times the VLAN-onward sub-sequence is retried for a device
/// whose configuration has not synchronized yet.
pub const SYNC_RETRY_LIMIT: u8 = 3;

const PING_ATTEMPTS: u8 = 3;
const SUB_PHASES: u8 = 4;
/// Settle time after any device changed its management IP.
const IP_CHANGE_SETTLE: Duration = Duration::from_secs(2);
/// Settle time between pushing a network setting and probing the address.
const NETWORK_SETTING_SETTLE: Duration = Duration::from_secs(1);
const COMPLETION_SETTLE: Duration = Duration::from_millis(100);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Deploys a configuration artifact onto a cohort of devices.
///
/// Single-flight: one running job per orchestrator instance. The caller
/// polls [`DeploymentOrchestrator::status`] and drains
/// [`DeploymentOrchestrator::drain_results`] at its own pace.
pub struct DeploymentOrchestrator {
    southbound: Arc<dyn Southbound>,
    profiles: ProfileSet,
    bootstrap: Arc<ReachabilityBootstrap>,
    runner: JobRunner<DeviceConfigureResult>,
    network_setting_success: Arc<Mutex<HashSet<DeviceId>>>,
}

impl DeploymentOrchestrator {
    pub fn new(
        southbound: Arc<dyn Southbound>,
        profiles: ProfileSet,
        mac_host_map: HashMap<MacAddress, Ipv4Addr>,
    ) -> Self {
        DeploymentOrchestrator {
            southbound,
            profiles,
            bootstrap: Arc::new(ReachabilityBootstrap::new(mac_host_map)),
            runner: JobRunner::new(),
            network_setting_success: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Starts a deployment job. Rejects with [`JobError::AlreadyRunning`]
    /// while a previous job is still Running.
    ///
    /// `firmware_name` is only consulted when the control selects the
    /// firmware-upgrade step.
    pub fn start(
        &self,
        project: Project,
        device_ids: Vec<DeviceId>,
        control: DeployControl,
        firmware_name: Option<String>,
    ) -> Result<JobState, JobError> {
        let southbound = Arc::clone(&self.southbound);
        let profiles = self.profiles.clone();
        let bootstrap = Arc::clone(&self.bootstrap);
        let network_setting_success = Arc::clone(&self.network_setting_success);

        self.runner.start(move |ctx| async move {
            lock(&network_setting_success).clear();
            let run = DeployRun {
                southbound,
                profiles,
                bootstrap,
                ctx,
                project,
                device_ids,
                control,
                firmware_name,
                failed: HashSet::new(),
                network_setting_success,
            };
            run.execute().await
        })
    }

    /// Requests cancellation, propagates it to the southbound client, and
    /// waits until the worker has exited.
    pub async fn stop(&self) -> JobState {
        if self.runner.status().is_running() {
            self.southbound.request_stop();
        }
        self.runner.stop().await
    }

    /// Reported job status; Success is promoted to Finished once progress
    /// reached 100.
    pub fn status(&self) -> JobState {
        self.runner.status()
    }

    /// Drains the per-device result queue, oldest first.
    pub fn drain_results(&self) -> Vec<DeviceConfigureResult> {
        self.runner.drain_results()
    }

    /// Devices whose network-setting push succeeded in the last run. The
    /// caller uses this to write the new addresses back to the project.
    pub fn network_setting_success(&self) -> HashSet<DeviceId> {
        lock(&self.network_setting_success).clone()
    }
}

/// The worker observed the cancellation flag.
struct Stopped;

/// Outcome of one step inside the per-device sequence.
enum StepError {
    /// Cancellation observed; unwinds the whole job.
    Stopped,
    /// The device failed this step; recorded and the cohort moves on.
    Device { reason: String, detail: String },
    /// A sync-capable device reported unsynchronized state; the caller
    /// re-enters the sequence at the VLAN step. `reason`/`detail` are what
    /// gets recorded if the retry budget is exhausted.
    SyncRetry { reason: String, detail: String },
}

impl StepError {
    fn device(reason: &str, detail: impl ToString) -> Self {
        StepError::Device {
            reason: reason.to_string(),
            detail: detail.to_string(),
        }
    }
}

/// Where a (re-)entered step sequence starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResumePoint {
    /// First attempt: network setting through firmware upgrade.
    Full,
    /// Synchronization retry: VLAN through firmware upgrade only.
    VlanOnward,
}

struct DeployRun {
    southbound: Arc<dyn Southbound>,
    profiles: ProfileSet,
    bootstrap: Arc<ReachabilityBootstrap>,
    ctx: JobContext<DeviceConfigureResult>,
    project: Project,
    device_ids: Vec<DeviceId>,
    control: DeployControl,
    firmware_name: Option<String>,
    failed: HashSet<DeviceId>,
    network_setting_success: Arc<Mutex<HashSet<DeviceId>>>,
}

impl DeployRun {
    async fn execute(mut self) -> JobState {
        info!("deploy list size: {}", self.device_ids.len());
        match self.deploy().await {
            Ok(()) => JobState::success(),
            Err(Stopped) => {
                warn!("deployment stopped before completion");
                JobState::stopped("deployment stopped")
            }
        }
    }

    fn stopped(&self) -> bool {
        self.ctx.cancelled()
    }

    fn fail_device(&mut self, device: &Device, reason: &str, detail: impl Into<String>) {
        let detail = detail.into();
        error!(
            "Device {}: {}. Detail: {}",
            device.label(),
            reason,
            detail
        );
        self.ctx.push_result(DeviceConfigureResult::failed(
            device.id,
            self.ctx.progress(),
            reason,
            detail,
        ));
        self.failed.insert(device.id);
    }

    fn skip_failed(&self, device: &Device) -> bool {
        if self.failed.contains(&device.id) {
            debug!("skip device {}, it already failed", device.label());
            true
        } else {
            false
        }
    }

    async fn deploy(&mut self) -> Result<(), Stopped> {
        let config = self.project.device_config.clone();

        // Resolve the cohort. Unknown ids are recorded and excluded; the
        // rest of the cohort continues.
        let mut devices: Vec<Device> = Vec::new();
        for id in self.device_ids.clone() {
            match self.project.device_by_id(id) {
                Some(device) => devices.push(device.clone()),
                None => {
                    error!("Device {} not found in the project", id);
                    self.ctx.push_result(DeviceConfigureResult::failed(
                        id,
                        self.ctx.progress(),
                        "Device not found in the project",
                        format!("device id {id}"),
                    ));
                    self.failed.insert(id);
                }
            }
        }

        // Pre-flight: refresh each device's capability set from its live
        // firmware, then gate. Any failure stops the whole cohort before a
        // single configuration call is made.
        let mut cohort_ok = true;
        for device in &mut devices {
            if self.stopped() {
                return Err(Stopped);
            }
            let mapped = map_device_firmware(
                self.southbound.as_ref(),
                &self.bootstrap,
                &self.profiles,
                device,
                &config,
            )
            .await;
            if let Err(e) = mapped {
                let detail = e.to_string();
                self.fail_device(device, "Mapping device firmware failed", detail);
                cohort_ok = false;
                continue;
            }
            if let Err(e) = check_device_features(device, &config) {
                let detail = e.to_string();
                self.fail_device(device, "Check feature failed", detail);
                cohort_ok = false;
            }
        }
        if !cohort_ok {
            for device in &devices {
                if !self.failed.contains(&device.id) {
                    self.ctx.push_result(DeviceConfigureResult::stopped(
                        device.id,
                        self.ctx.progress(),
                        "Stop configure",
                        "some devices failed the capability pre-flight",
                    ));
                }
            }
            tokio::time::sleep(COMPLETION_SETTLE).await;
            self.ctx.set_progress(100);
            return Ok(());
        }
        self.ctx.set_progress(5);

        // IP step: remap offline-designed devices, re-assert everyone
        // else's settings when selected.
        let mut ip_changed = false;
        for device in &mut devices {
            if self.stopped() {
                return Err(Stopped);
            }
            if self.skip_failed(device) {
                continue;
            }
            if let Some(mapping) = config.ip_mappings.get(&device.id) {
                match self.deploy_ip_mapping(device, mapping).await {
                    Ok(()) => ip_changed = true,
                    Err(StepError::Stopped) => return Err(Stopped),
                    Err(StepError::Device { reason, detail })
                    | Err(StepError::SyncRetry { reason, detail }) => {
                        self.fail_device(device, &reason, detail);
                    }
                }
            } else if self.control.network_setting {
                let table = NetworkSettingTable::from_device(device);
                match self.deploy_network_setting(device, &table).await {
                    Ok(()) => {}
                    Err(StepError::Stopped) => return Err(Stopped),
                    Err(StepError::Device { reason, detail })
                    | Err(StepError::SyncRetry { reason, detail }) => {
                        self.fail_device(device, &reason, detail);
                    }
                }
            }
        }
        if ip_changed {
            tokio::time::sleep(IP_CHANGE_SETTLE).await;
        }

        // Reachability probe against possibly new addresses.
        if let Err(e) = self.southbound.clear_arp_cache().await {
            warn!("clearing the address-resolution cache failed: {}", e);
        }
        if self.stopped() {
            return Err(Stopped);
        }
        for device in &mut devices {
            if self.failed.contains(&device.id) {
                continue;
            }
            let reachable = self
                .southbound
                .ping(device.ipv4.address, PING_ATTEMPTS)
                .await
                .is_ok();
            if self.stopped() {
                return Err(Stopped);
            }
            device.status.icmp_reachable = reachable;
            if !reachable {
                self.fail_device(device, "Device not alive", "no ICMP echo reply");
            }
        }
        self.ctx.set_progress(10);

        // Refresh live connectivity status.
        for device in &mut devices {
            if self.stopped() {
                return Err(Stopped);
            }
            if self.failed.contains(&device.id) {
                debug!("skip device {}, it already failed", device.label());
                continue;
            }
            if let Err(e) = self.southbound.refresh_connect_status(device).await {
                let detail = e.to_string();
                self.fail_device(device, "Update device connect status failed", detail);
            }
        }
        self.ctx.set_progress(20);

        // Spanning-tree pre-clear, so stale topology state cannot shadow
        // the configuration pushed below.
        if self.control.spanning_tree {
            for device in &devices {
                if self.stopped() {
                    return Err(Stopped);
                }
                if self.failed.contains(&device.id) {
                    debug!("skip device {}, it already failed", device.label());
                    continue;
                }
                if !device.feature_group.configuration.spanning_tree.rstp {
                    continue;
                }
                let table = RstpTable::baseline(device.id);
                let result = self.southbound.configure_spanning_tree(device, &table).await;
                if self.stopped() {
                    return Err(Stopped);
                }
                if let Err(e) = result {
                    let detail = e.to_string();
                    self.fail_device(
                        device,
                        "Configure Spanning Tree init configuration failed",
                        detail,
                    );
                }
            }
        }
        self.ctx.set_progress(30);

        // Ordered per-device configuration, 30% to 90%.
        let span = if devices.is_empty() {
            60
        } else {
            60 / devices.len().min(60) as u8
        };
        for device in &mut devices {
            if self.stopped() {
                return Err(Stopped);
            }
            if self.failed.contains(&device.id) {
                debug!("skip device {}, it already failed", device.label());
                continue;
            }
            self.deploy_device(device, &config, span).await?;
        }

        tokio::time::sleep(COMPLETION_SETTLE).await;
        self.ctx.set_progress(100);
        Ok(())
    }

    /// Runs the ordered sequence for one device, driving the bounded
    /// synchronization-retry protocol. Returns `Err` only on cancellation.
    async fn deploy_device(
        &mut self,
        device: &mut Device,
        config: &DeviceConfig,
        span: u8,
    ) -> Result<(), Stopped> {
        let sync_capable = device
            .feature_group
            .configuration
            .check_config_synchronization;

        // Reading the sync flag clears it on devices that latch it, so the
        // checks below observe only state produced by this run.
        if sync_capable {
            let result = self.southbound.config_sync_pending(device).await;
            if self.stopped() {
                return Err(Stopped);
            }
            if let Err(e) = result {
                let detail = e.to_string();
                self.fail_device(device, "Clear device sync status failed", detail);
                return Ok(());
            }
        }

        let checkpoint = span / SUB_PHASES;
        let mut retries: u8 = 0;
        let mut resume = ResumePoint::Full;
        loop {
            if self.stopped() {
                return Err(Stopped);
            }
            if retries > 0 {
                debug!(
                    "retry deploy device {} ({}/{})",
                    device.label(),
                    retries,
                    SYNC_RETRY_LIMIT
                );
            }

            let outcome = self
                .run_step_sequence(device, config, resume, retries == 0, checkpoint)
                .await;
            match outcome {
                Ok(()) => {
                    if sync_capable {
                        let synchronized = self.check_synchronized(device, config).await;
                        if self.stopped() {
                            return Err(Stopped);
                        }
                        match synchronized {
                            Ok(true) => {}
                            Ok(false) => {
                                retries += 1;
                                if retries > SYNC_RETRY_LIMIT {
                                    self.fail_device(
                                        device,
                                        "Device configuration not synchronized",
                                        format!(
                                            "still unsynchronized after {SYNC_RETRY_LIMIT} retries"
                                        ),
                                    );
                                    return Ok(());
                                }
                                resume = ResumePoint::VlanOnward;
                                continue;
                            }
                            Err(e) => {
                                let detail = e.to_string();
                                self.fail_device(
                                    device,
                                    "Check device configuration status failed",
                                    detail,
                                );
                                return Ok(());
                            }
                        }
                    }

                    self.ctx
                        .push_result(DeviceConfigureResult::success(device.id, self.ctx.progress()));
                    let progress = self.ctx.progress().saturating_add(checkpoint).min(90);
                    self.ctx.set_progress(progress);
                    return Ok(());
                }
                Err(StepError::Stopped) => return Err(Stopped),
                Err(StepError::Device { reason, detail }) => {
                    self.fail_device(device, &reason, detail);
                    return Ok(());
                }
                Err(StepError::SyncRetry { reason, detail }) => {
                    retries += 1;
                    if retries > SYNC_RETRY_LIMIT {
                        self.fail_device(device, &reason, detail);
                        return Ok(());
                    }
                    resume = ResumePoint::VlanOnward;
                }
            }
        }
    }

    /// The fixed step order of one attempt. A [`ResumePoint::VlanOnward`]
    /// re-entry skips everything before the VLAN step; network, login,
    /// time and port configuration never run twice for one device.
    async fn run_step_sequence(
        &mut self,
        device: &mut Device,
        config: &DeviceConfig,
        resume: ResumePoint,
        first_attempt: bool,
        checkpoint: u8,
    ) -> Result<(), StepError> {
        if resume == ResumePoint::Full {
            if self.control.network_setting {
                if let Some(table) = config.network_settings.get(&device.id) {
                    self.deploy_network_setting(device, table).await?;
                    lock(&self.network_setting_success).insert(device.id);
                    device.ipv4.address = table.address;
                    debug!(
                        "continue deploying device {} at its new address",
                        device.label()
                    );
                }
            }

            if self.control.login_policy {
                if let Some(table) = config.login_policies.get(&device.id) {
                    let result = self.southbound.configure_login_policy(device, table).await;
                    self.ensure_not_stopped()?;
                    result.map_err(|e| StepError::device("Configure LoginPolicy failed", e))?;
                }
            }

            if self.control.information_setting {
                if let Some(table) = config.information_settings.get(&device.id) {
                    let result = self
                        .southbound
                        .configure_information_setting(device, table)
                        .await;
                    self.ensure_not_stopped()?;
                    result
                        .map_err(|e| StepError::device("Configure InformationSetting failed", e))?;
                }
            }

            if self.control.snmp_trap_setting {
                if let Some(table) = config.snmp_traps.get(&device.id) {
                    let result = self.southbound.configure_snmp_trap(device, table).await;
                    self.ensure_not_stopped()?;
                    result.map_err(|e| StepError::device("Configure SnmpTrapSetting failed", e))?;
                }
            }

            if self.control.syslog_setting {
                if let Some(table) = config.syslogs.get(&device.id) {
                    let result = self.southbound.configure_syslog(device, table).await;
                    self.ensure_not_stopped()?;
                    result.map_err(|e| StepError::device("Configure SyslogSetting failed", e))?;
                }
            }

            if self.control.time_setting {
                if let Some(table) = config.time_settings.get(&device.id) {
                    let result = self.southbound.configure_time_setting(device, table).await;
                    self.ensure_not_stopped()?;
                    result.map_err(|e| StepError::device("Configure TimeSetting failed", e))?;
                }
            }

            if self.control.port_setting {
                if let Some(table) = config.port_settings.get(&device.id) {
                    let result = self.southbound.configure_port_setting(device, table).await;
                    self.ensure_not_stopped()?;
                    result.map_err(|e| StepError::device("Configure PortSetting failed", e))?;
                }
            }

            if self.control.loop_protection {
                if let Some(table) = config.loop_protections.get(&device.id) {
                    let result = self
                        .southbound
                        .configure_loop_protection(device, table)
                        .await;
                    self.ensure_not_stopped()?;
                    result.map_err(|e| StepError::device("Configure LoopProtection failed", e))?;
                }
            }

            self.bump_progress(first_attempt, checkpoint);
        }

        // VLAN onward: the sub-sequence repeated by synchronization
        // retries.
        if self.control.vlan {
            if let Some(table) = config.vlans.get(&device.id) {
                let result = self.southbound.configure_vlan(device, table).await;
                self.ensure_not_stopped()?;
                if let Err(e) = result {
                    return Err(self
                        .sync_gate(device, config, "Configure VLAN failed", e.to_string())
                        .await);
                }
            }
        }

        self.bump_progress(first_attempt, checkpoint);

        if self.control.port_default_pcp {
            if let Some(table) = config.port_default_pcps.get(&device.id) {
                let result = self
                    .southbound
                    .configure_port_default_pcp(device, table)
                    .await;
                self.ensure_not_stopped()?;
                result.map_err(|e| StepError::device("Configure Default PCP failed", e))?;
            }
        }

        if self.control.unicast_static_forward {
            if let Some(table) = config.unicast_static_forwards.get(&device.id) {
                let result = self
                    .southbound
                    .configure_static_forward(device, table, true)
                    .await;
                self.ensure_not_stopped()?;
                if let Err(e) = result {
                    return Err(self
                        .sync_gate(
                            device,
                            config,
                            "Configure Unicast Static Forward failed",
                            e.to_string(),
                        )
                        .await);
                }
            }
        }

        if self.control.multicast_static_forward {
            if let Some(table) = config.multicast_static_forwards.get(&device.id) {
                let result = self
                    .southbound
                    .configure_static_forward(device, table, false)
                    .await;
                self.ensure_not_stopped()?;
                if let Err(e) = result {
                    return Err(self
                        .sync_gate(
                            device,
                            config,
                            "Configure Multicast Static Forward failed",
                            e.to_string(),
                        )
                        .await);
                }
            }
        }

        if self.control.stream_priority_ingress {
            if let Some(table) = config.stream_priority_ingress.get(&device.id) {
                let result = self
                    .southbound
                    .configure_stream_priority_ingress(device, table)
                    .await;
                self.ensure_not_stopped()?;
                if let Err(e) = result {
                    return Err(self
                        .sync_gate(
                            device,
                            config,
                            "Configure Per-Stream Priority (Ingress) failed",
                            e.to_string(),
                        )
                        .await);
                }
            }
        }

        if self.control.stream_priority_egress {
            if let Some(table) = config.stream_priority_egress.get(&device.id) {
                let result = self
                    .southbound
                    .configure_stream_priority_egress(device, table)
                    .await;
                self.ensure_not_stopped()?;
                result.map_err(|e| {
                    StepError::device("Configure Per-Stream Priority (Egress) failed", e)
                })?;
            }
        }

        self.bump_progress(first_attempt, checkpoint);

        if self.control.spanning_tree {
            if let Some(table) = config.rstp.get(&device.id) {
                let result = self.southbound.configure_spanning_tree(device, table).await;
                self.ensure_not_stopped()?;
                result.map_err(|e| StepError::device("Configure Spanning Tree failed", e))?;
            }
        }

        // The NETCONF bundle only lands safely on synchronized state, so a
        // sync-capable device with a CB table is checked first.
        if self.control.ieee802_1cb
            && config.cb.contains_key(&device.id)
            && device
                .feature_group
                .configuration
                .check_config_synchronization
        {
            let synchronized = self.check_synchronized(device, config).await;
            self.ensure_not_stopped()?;
            match synchronized {
                Ok(true) => {}
                Ok(false) => {
                    return Err(StepError::SyncRetry {
                        reason: "Device configuration not synchronized".into(),
                        detail: "sync flag still set before the NETCONF bundle".into(),
                    })
                }
                Err(e) => {
                    return Err(StepError::device(
                        "Check device configuration status failed",
                        e,
                    ))
                }
            }
        }

        self.configure_netconf(device, config).await?;

        if self.control.reboot {
            let result = self.southbound.reboot(device).await;
            self.ensure_not_stopped()?;
            result.map_err(|e| StepError::device("Reboot failed", e))?;
        }

        if self.control.factory_default {
            let result = self.southbound.factory_default(device).await;
            self.ensure_not_stopped()?;
            result.map_err(|e| StepError::device("Factory Default failed", e))?;
        }

        if self.control.firmware_upgrade {
            let name = match self.firmware_name.as_deref() {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => {
                    return Err(StepError::device(
                        "The firmware name parameter is empty",
                        "firmware upgrade selected without a firmware image",
                    ))
                }
            };
            let result = self.southbound.firmware_upgrade(device, &name).await;
            self.ensure_not_stopped()?;
            result.map_err(|e| StepError::device("Firmware Upgrade failed", e))?;
        }

        Ok(())
    }

    /// The IEEE 802.1CB and gate-control configuration, each individually
    /// feature-gated: an unsupported area is skipped with a debug note,
    /// never an error, so default tables cannot fail capable-but-plain
    /// devices.
    async fn configure_netconf(
        &mut self,
        device: &Device,
        config: &DeviceConfig,
    ) -> Result<(), StepError> {
        if self.control.ieee802_1cb {
            if let Some(table) = config.cb.get(&device.id) {
                if device.feature_group.configuration.tsn.ieee802_1cb {
                    let result = self.southbound.configure_ieee802_1cb(device, table).await;
                    self.ensure_not_stopped()?;
                    if let Err(e) = result {
                        return Err(self
                            .sync_gate(device, config, "Configure NETCONF failed", e.to_string())
                            .await);
                    }
                } else {
                    debug!("skip CB configuration, device {} does not support it", device.label());
                }
            }
        }

        if self.control.gate_control {
            if let Some(table) = config.gate_controls.get(&device.id) {
                if device.feature_group.configuration.tsn.ieee802_1qbv {
                    self.check_gate_control_capacity(device, table)?;
                    let result = self.southbound.configure_gate_control(device, table).await;
                    self.ensure_not_stopped()?;
                    if let Err(e) = result {
                        return Err(self
                            .sync_gate(device, config, "Configure NETCONF failed", e.to_string())
                            .await);
                    }
                } else {
                    debug!(
                        "skip gate control configuration, device {} does not support it",
                        device.label()
                    );
                }
            }
        }

        Ok(())
    }

    /// Every configured gate control list must fit the hardware capacity
    /// declared by the device profile.
    fn check_gate_control_capacity(
        &self,
        device: &Device,
        table: &tsn_model::GateControlTable,
    ) -> Result<(), StepError> {
        let profile = self
            .profiles
            .device_profile(device.device_profile_id)
            .ok_or_else(|| {
                StepError::device(
                    "Configure NETCONF failed",
                    DeployError::not_found(format!("device profile {}", device.device_profile_id)),
                )
            })?;
        for interface in &table.interfaces {
            if interface.admin_control_list_len > profile.gate_control_list_capacity {
                return Err(StepError::device(
                    "Configure NETCONF failed",
                    DeployError::GateControlCapacity {
                        requested: interface.admin_control_list_len,
                        capacity: profile.gate_control_list_capacity,
                    },
                ));
            }
        }
        Ok(())
    }

    /// Pushes a network setting, flushes resolution state and verifies the
    /// device answers at the (possibly new) address.
    async fn deploy_network_setting(
        &self,
        device: &Device,
        table: &NetworkSettingTable,
    ) -> Result<(), StepError> {
        debug!("device {} network setting is under deployment", device.label());
        let southbound = self.southbound.as_ref();

        let result = if self.control.from_broadcast_search {
            // Broadcast-search cohorts are reachable only through the
            // temporary address-resolution mapping.
            self.bootstrap
                .with_mapping(southbound, device.ipv4.address, device.mac, async {
                    Ok(southbound.configure_network_setting(device, table).await?)
                })
                .await
        } else {
            southbound
                .configure_network_setting(device, table)
                .await
                .map_err(DeployError::from)
        };
        self.ensure_not_stopped()?;
        result.map_err(|e| StepError::device("Configure Network Setting failed", e))?;

        if let Err(e) = southbound.clear_arp_cache().await {
            warn!("clearing the address-resolution cache failed: {}", e);
        }
        self.ensure_not_stopped()?;

        tokio::time::sleep(NETWORK_SETTING_SETTLE).await;
        southbound
            .ping(table.address, PING_ATTEMPTS)
            .await
            .map_err(|e| {
                StepError::device(
                    "Configure Network Setting failed",
                    format!("device not reachable at {}: {}", table.address, e),
                )
            })?;
        Ok(())
    }

    /// Configures the designed (offline) address onto a device currently
    /// answering at its discovery address.
    async fn deploy_ip_mapping(
        &self,
        device: &Device,
        mapping: &tsn_model::IpMappingTable,
    ) -> Result<(), StepError> {
        debug!(
            "device {} offline-designed IP is under deployment",
            device.label()
        );
        let mut online = device.clone();
        online.ipv4.address = mapping.online_ip;
        online.mac = mapping.mac;
        online.status.connected = true;

        let table = NetworkSettingTable {
            device: device.id,
            mode: tsn_model::tables::NetworkSettingMode::Static,
            address: mapping.offline_ip,
            subnet_mask: mapping.subnet_mask,
            gateway: mapping.gateway,
            dns1: mapping.dns1,
            dns2: mapping.dns2,
        };

        let southbound = self.southbound.as_ref();
        let result = self
            .bootstrap
            .with_mapping(southbound, mapping.online_ip, mapping.mac, async {
                Ok(southbound
                    .configure_network_setting(&online, &table)
                    .await?)
            })
            .await;
        self.ensure_not_stopped()?;
        result.map_err(|e| StepError::device("Configure the offline design IP failed", e))?;
        Ok(())
    }

    /// True when the device's control plane has caught up with everything
    /// pushed so far: the sync flag is clear and, when a VLAN table exists
    /// for the device, the live VLAN state matches it.
    async fn check_synchronized(
        &self,
        device: &Device,
        config: &DeviceConfig,
    ) -> DeployResult<bool> {
        let pending = self.southbound.config_sync_pending(device).await?;
        if pending {
            debug!(
                "device {} configuration sync flag is still set",
                device.label()
            );
            return Ok(false);
        }

        if let Some(table) = config.vlans.get(&device.id) {
            let matches = self.southbound.vlan_config_matches(device, table).await?;
            if !matches {
                debug!(
                    "device {} live VLAN state differs from the intended table",
                    device.label()
                );
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Decides how a failed sync-relevant step ends: a sync-capable device
    /// with unsynchronized state earns a retry, everything else is a
    /// device failure. A failing sync check itself never masks the
    /// original error.
    async fn sync_gate(
        &self,
        device: &Device,
        config: &DeviceConfig,
        reason: &str,
        detail: String,
    ) -> StepError {
        if device
            .feature_group
            .configuration
            .check_config_synchronization
        {
            match self.check_synchronized(device, config).await {
                Ok(false) => {
                    return StepError::SyncRetry {
                        reason: reason.to_string(),
                        detail,
                    }
                }
                Ok(true) => {}
                Err(e) => debug!("synchronization check failed: {}", e),
            }
        }
        StepError::Device {
            reason: reason.to_string(),
            detail,
        }
    }

    fn bump_progress(&self, first_attempt: bool, checkpoint: u8) {
        // Retries re-run steps that were already accounted for.
        if first_attempt {
            let progress = self.ctx.progress().saturating_add(checkpoint);
            self.ctx.set_progress(progress);
        }
    }

    fn ensure_not_stopped(&self) -> Result<(), StepError> {
        if self.stopped() {
            Err(StepError::Stopped)
        } else {
            Ok(())
        }
    }
}

/// Probes the device's live firmware version and re-derives its capability
/// set from the profile collections.
///
/// Devices with a pending IP remap are probed at their discovery address
/// through a temporary address-resolution mapping.
async fn map_device_firmware(
    southbound: &dyn Southbound,
    bootstrap: &ReachabilityBootstrap,
    profiles: &ProfileSet,
    device: &mut Device,
    config: &DeviceConfig,
) -> DeployResult<()> {
    debug!("device {} firmware mapping is under processing", device.label());

    let version = match config.ip_mappings.get(&device.id) {
        Some(mapping) => {
            let mut online = device.clone();
            online.ipv4.address = mapping.online_ip;
            online.mac = mapping.mac;
            online.status.connected = true;
            bootstrap
                .with_mapping(southbound, mapping.online_ip, mapping.mac, async {
                    Ok(southbound.firmware_version(&online).await?)
                })
                .await?
        }
        None => southbound.firmware_version(device).await?,
    };
    debug!("device {} firmware version: {}", device.label(), version);

    if let Some(profile) = profiles.firmware_profile(&device.model_name, &version) {
        device.feature_group = profile.feature_group;
        device.firmware_feature_profile_id = Some(profile.id);
        debug!(
            "device {} mapped to firmware feature profile {}",
            device.label(),
            profile.id
        );
    } else {
        // No profile pins this build. If the live firmware differs from
        // the designed one, fall back to the model's static profile.
        if device.firmware_version != version {
            let profile = profiles
                .device_profile(device.device_profile_id)
                .ok_or_else(|| {
                    DeployError::not_found(format!("device profile {}", device.device_profile_id))
                })?;
            device.feature_group = profile.feature_group;
        }
        device.firmware_feature_profile_id = None;
    }

    Ok(())
}
