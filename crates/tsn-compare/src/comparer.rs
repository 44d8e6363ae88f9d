//! The topology comparison job.

use crate::error::CompareError;
use itertools::Itertools;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info};
use tsn_job::{JobContext, JobError, JobKind, JobRunner, JobState, Severity};
use tsn_model::{CompareControl, CompareFindings, Device, Endpoint, Link, Project};
use tsn_southbound::Southbound;
use tsn_types::{DeviceId, InterfaceId, MacAddress};

const PING_ATTEMPTS: u8 = 3;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Verifies that the live network matches the designed one.
///
/// Single-flight per instance, driven through the shared job lifecycle;
/// the caller polls [`TopologyVerifier::status`] and reads
/// [`TopologyVerifier::findings`] once the job has finished.
pub struct TopologyVerifier {
    southbound: Arc<dyn Southbound>,
    runner: JobRunner<()>,
    findings: Arc<Mutex<CompareFindings>>,
}

impl TopologyVerifier {
    pub fn new(southbound: Arc<dyn Southbound>) -> Self {
        TopologyVerifier {
            southbound,
            runner: JobRunner::new(),
            findings: Arc::new(Mutex::new(CompareFindings::default())),
        }
    }

    /// Starts a comparison job over `device_ids` (every deployable device
    /// of the project when empty). Rejects with
    /// [`JobError::AlreadyRunning`] while a previous job is Running.
    pub fn start(
        &self,
        project: Project,
        device_ids: Vec<DeviceId>,
        control: CompareControl,
    ) -> Result<JobState, JobError> {
        let southbound = Arc::clone(&self.southbound);
        let findings = Arc::clone(&self.findings);

        self.runner.start(move |ctx| async move {
            *lock(&findings) = CompareFindings::default();
            let device_ids = if device_ids.is_empty() {
                project.deployable_device_ids()
            } else {
                device_ids
            };
            let run = CompareRun {
                southbound,
                ctx,
                project,
                device_ids,
                control,
                findings,
                devices: BTreeMap::new(),
                links: Vec::new(),
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

    /// Reported job status.
    pub fn status(&self) -> JobState {
        self.runner.status()
    }

    /// The structured diff accumulated by the last run.
    pub fn findings(&self) -> CompareFindings {
        lock(&self.findings).clone()
    }
}

/// Why a run ended before completing all checks.
enum RunEnd {
    Stopped,
    Fatal(CompareError),
}

impl From<CompareError> for RunEnd {
    fn from(e: CompareError) -> Self {
        RunEnd::Fatal(e)
    }
}

struct CompareRun {
    southbound: Arc<dyn Southbound>,
    ctx: JobContext<()>,
    project: Project,
    device_ids: Vec<DeviceId>,
    control: CompareControl,
    findings: Arc<Mutex<CompareFindings>>,
    /// Compared devices, ordered by id for deterministic reporting.
    devices: BTreeMap<DeviceId, Device>,
    /// Designed links with both endpoints in the compared device set.
    links: Vec<Link>,
}

impl CompareRun {
    async fn execute(mut self) -> JobState {
        info!(
            "comparing topology, {} requested devices",
            self.device_ids.len()
        );
        match self.compare().await {
            Ok(()) => {
                let findings = lock(&self.findings);
                if findings.is_clean() {
                    JobState::success()
                } else {
                    let categories = findings.failed_categories().iter().join(", ");
                    error!("topology comparison failed: {}", categories);
                    JobState {
                        kind: JobKind::Failed,
                        severity: Severity::Error,
                        message: format!("comparison failed: {categories}"),
                        progress: 0,
                    }
                }
            }
            Err(RunEnd::Stopped) => JobState::stopped("comparison stopped"),
            Err(RunEnd::Fatal(e)) => {
                error!("topology comparison aborted: {}", e);
                JobState::failed(e.to_string())
            }
        }
    }

    fn stopped(&self) -> Result<(), RunEnd> {
        if self.ctx.cancelled() {
            Err(RunEnd::Stopped)
        } else {
            Ok(())
        }
    }

    fn record<F: FnOnce(&mut CompareFindings)>(&self, f: F) {
        f(&mut lock(&self.findings));
    }

    async fn compare(&mut self) -> Result<(), RunEnd> {
        self.build_comparison_sets()?;

        if self.control.hybrid_vlan_consistent {
            self.check_hybrid_vlan();
        }
        if self.control.device_config {
            self.check_device_config();
        }
        self.ctx.set_progress(10);

        if self.control.alive {
            self.check_alive().await?;
        }
        self.ctx.set_progress(20);

        self.refresh_connect_status().await?;
        self.ctx.set_progress(30);

        if self.control.topology_consistent {
            self.check_topology_consistent().await?;
        }
        self.ctx.set_progress(50);

        if self.control.model_name {
            self.check_model_name().await?;
        }
        self.ctx.set_progress(70);

        if self.control.link_speed {
            self.check_link_speed().await?;
        }
        self.ctx.set_progress(80);

        self.ctx.set_progress(100);
        Ok(())
    }

    /// Builds the compared device and link subsets: deployable devices
    /// among the requested ids, and links with both endpoints inside that
    /// set.
    fn build_comparison_sets(&mut self) -> Result<(), RunEnd> {
        for id in &self.device_ids {
            let device = self
                .project
                .device_by_id(*id)
                .ok_or_else(|| CompareError::not_found(format!("device {id}")))?;
            if !device.is_deployable() {
                continue;
            }
            self.devices.insert(*id, device.clone());
        }

        for link in &self.project.links {
            if link.both_endpoints(|d| self.devices.contains_key(&d)) {
                self.links.push(link.clone());
            } else {
                debug!(
                    "link {} has an endpoint outside the compared set, excluded",
                    link.id
                );
            }
        }
        Ok(())
    }

    /// All compared devices must agree on hybrid-VLAN capability; a mixed
    /// fleet cannot carry one consistent VLAN design.
    fn check_hybrid_vlan(&self) {
        let mut reference = None;
        for device in self.devices.values() {
            let capable = device.feature_group.configuration.vlan.hybrid_mode;
            match reference {
                None => reference = Some(capable),
                Some(expected) if expected != capable => {
                    error!(
                        "Device VLAN hybrid capability inconsistent. Device: {}",
                        device.label()
                    );
                    self.record(|f| {
                        f.hybrid_vlan_failed
                            .insert(device.ipv4.address.to_string());
                    });
                }
                Some(_) => {}
            }
        }
    }

    /// Design-side invariant check, independent of live device state:
    /// unicast static-forward entries must carry usable unicast MAC
    /// addresses.
    fn check_device_config(&self) {
        for (device_id, table) in &self.project.device_config.unicast_static_forwards {
            for entry in &table.entries {
                if entry.mac.is_unicast() && !entry.mac.is_zero() {
                    continue;
                }
                let address = self
                    .project
                    .device_by_id(*device_id)
                    .map(|d| d.ipv4.address.to_string())
                    .unwrap_or_else(|| device_id.to_string());
                error!(
                    "Unicast static forward entry with unusable MAC {}. Device: {}",
                    entry.mac, address
                );
                self.record(|f| {
                    f.device_config_failed.insert(address.clone());
                });
            }
        }
    }

    async fn check_alive(&mut self) -> Result<(), RunEnd> {
        for device in self.devices.values() {
            self.stopped()?;
            if let Err(e) = self
                .southbound
                .ping(device.ipv4.address, PING_ATTEMPTS)
                .await
            {
                error!("Device not alive. Device: {}: {}", device.label(), e);
                self.record(|f| {
                    f.alive_failed.insert(device.ipv4.address.to_string());
                });
            }
        }
        Ok(())
    }

    async fn refresh_connect_status(&mut self) -> Result<(), RunEnd> {
        for device in self.devices.values_mut() {
            if self.ctx.cancelled() {
                return Err(RunEnd::Stopped);
            }
            self.southbound
                .refresh_connect_status(device)
                .await
                .map_err(CompareError::from)?;
        }
        Ok(())
    }

    /// Synthesizes the live link set from per-device LLDP neighborships
    /// and diffs it against the designed links. A live link consumed by a
    /// designed link cannot satisfy a second one; whatever remains
    /// unconsumed is an extra link.
    async fn check_topology_consistent(&mut self) -> Result<(), RunEnd> {
        let ip_mac = self
            .southbound
            .ip_mac_table()
            .await
            .map_err(CompareError::from)?;

        // Devices are matched to LLDP chassis ids by their live MAC.
        for device in self.devices.values_mut() {
            if let Some(mac) = ip_mac.get(&device.ipv4.address) {
                device.mac = *mac;
            }
        }
        let mac_to_device: HashMap<MacAddress, DeviceId> = self
            .devices
            .values()
            .map(|d| (d.mac, d.id))
            .collect();

        let mut live_links: Vec<Link> = Vec::new();
        for device in self.devices.values() {
            self.stopped()?;
            let neighbors = self
                .southbound
                .lldp_neighbors(device)
                .await
                .map_err(CompareError::from)?;
            for neighbor in neighbors {
                let Some(peer) = mac_to_device.get(&neighbor.remote_chassis_mac) else {
                    // Not a compared device; outside this check's scope.
                    continue;
                };
                let link = Link {
                    id: live_links.len() as i64 + 1,
                    source: Endpoint {
                        device: device.id,
                        interface: neighbor.local_interface,
                    },
                    destination: Endpoint {
                        device: *peer,
                        interface: neighbor.remote_interface,
                    },
                    speed_mbps: 0,
                    propagation_delay_ns: None,
                };
                // Each cable is reported from both of its ends.
                if !live_links.iter().any(|l| l.matches_unordered(&link)) {
                    live_links.push(link);
                }
            }
        }
        for link in &live_links {
            debug!("live link: {}", self.link_label(link));
        }

        for designed in &self.links {
            self.stopped()?;
            match live_links
                .iter()
                .position(|live| live.matches_unordered(designed))
            {
                Some(index) => {
                    live_links.remove(index);
                }
                None => {
                    error!(
                        "Designed link {} not found in the live topology",
                        self.link_label(designed)
                    );
                    let label = self.link_label(designed);
                    self.record(|f| {
                        f.links_not_found.insert(label);
                    });
                }
            }
        }

        for extra in &live_links {
            error!(
                "Live link {} not present in the design",
                self.link_label(extra)
            );
            let label = self.link_label(extra);
            self.record(|f| {
                f.links_extra.insert(label);
            });
        }

        Ok(())
    }

    async fn check_model_name(&mut self) -> Result<(), RunEnd> {
        for device in self.devices.values() {
            self.stopped()?;
            match self.southbound.model_name(device).await {
                Ok(name) if name == device.model_name => {}
                Ok(name) => {
                    error!(
                        "Device model name mismatch. Device: {}. Live {} vs designed {}",
                        device.label(),
                        name,
                        device.model_name
                    );
                    self.record(|f| {
                        f.model_name_failed.insert(device.ipv4.address.to_string());
                    });
                }
                Err(e) => {
                    error!(
                        "Reading model name failed. Device: {}: {}",
                        device.label(),
                        e
                    );
                    self.record(|f| {
                        f.model_name_failed.insert(device.ipv4.address.to_string());
                    });
                }
            }
        }
        Ok(())
    }

    /// A designed link's speed must not exceed what either live endpoint
    /// reports. A live speed of zero means "cannot verify" and is skipped;
    /// so is an endpoint on a device outside the compared set.
    async fn check_link_speed(&mut self) -> Result<(), RunEnd> {
        let mut speed_maps: HashMap<DeviceId, HashMap<InterfaceId, u64>> = HashMap::new();
        for device in self.devices.values() {
            self.stopped()?;
            let speeds = self
                .southbound
                .port_speeds(device)
                .await
                .map_err(CompareError::from)?;
            speed_maps.insert(device.id, speeds);
        }

        for link in &self.links {
            let label = self.link_label(link);
            for endpoint in [link.source, link.destination] {
                let Some(speeds) = speed_maps.get(&endpoint.device) else {
                    debug!(
                        "link {} endpoint device {} not compared, skip its side",
                        label, endpoint.device
                    );
                    continue;
                };
                let live = speeds.get(&endpoint.interface).copied().unwrap_or(0);
                if live != 0 && link.speed_mbps > live {
                    error!(
                        "Link speed check failed. Link: {}. Live {} Mbps < designed {} Mbps",
                        label, live, link.speed_mbps
                    );
                    self.record(|f| {
                        f.speed_failed.insert(label.clone());
                    });
                }
            }
        }
        Ok(())
    }

    /// `src-ip(src-if)-dst-ip(dst-if)`, the identity links carry in
    /// findings and logs.
    fn link_label(&self, link: &Link) -> String {
        let address = |id: DeviceId| {
            self.devices
                .get(&id)
                .map(|d| d.ipv4.address.to_string())
                .unwrap_or_else(|| id.to_string())
        };
        format!(
            "{}({})-{}({})",
            address(link.source.device),
            link.source.interface,
            address(link.destination.device),
            link.destination.interface
        )
    }
}
