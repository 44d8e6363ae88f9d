//! Domain model for TSN network deployment and verification.
//!
//! The upstream design tool produces a [`Project`] (devices, links and a
//! per-device [`DeviceConfig`] artifact); the deployment and comparison
//! pipelines consume it read-only. This crate owns those records plus the
//! capability metadata ([`FeatureGroup`], profiles) used to gate deployment
//! against what a device's firmware actually supports.

pub mod control;
pub mod device;
pub mod feature;
pub mod link;
pub mod profile;
pub mod project;
pub mod result;
pub mod tables;

pub use control::{CompareControl, DeployControl};
pub use device::{Device, DeviceRole, DeviceStatus, Ipv4Settings};
pub use feature::{
    ConfigurationFeatures, FeatureGroup, OperationFeatures, SpanningTreeFeatures,
    StaticForwardFeatures, TsnFeatures, VlanFeatures,
};
pub use link::{Endpoint, Link};
pub use profile::{DeviceProfile, FirmwareFeatureProfile, ProfileSet};
pub use project::Project;
pub use result::{CompareFindings, ConfigureStatus, DeviceConfigureResult};
pub use tables::{
    CbTable, DeviceConfig, GateControlTable, InformationSettingTable, InterfaceGateParameters,
    IpMappingTable, LoginPolicyTable, LoopProtectionTable, NetworkSettingTable, PortDefaultPcpEntry,
    PortDefaultPcpTable, PortSettingTable, PortTypeEntry, PortVlanEntry, RstpTable, SnmpTrapTable,
    StaticForwardEntry, StaticForwardTable, StreamPriorityEgressTable, StreamPriorityIngressTable,
    SyslogTable, TimeTable, VlanPortType, VlanStaticEntry, VlanTable,
};
