//! The capability gate.
//!
//! Before any configuration call is made, every device in the cohort is
//! checked against the subset of the artifact that targets it. A feature
//! area is only checked when its table is present and non-default for the
//! device: an empty table never trips the gate. Some areas need a stricter
//! look at the entries, e.g. the hybrid VLAN port mode is only required if
//! at least one configured port actually uses it.

use crate::error::{DeployError, DeployResult};
use tracing::error;
use tsn_model::{Device, DeviceConfig, VlanPortType};
use tsn_types::DEFAULT_PVID;

fn unsupported(device: &Device, feature: &str) -> DeployError {
    error!(
        "Device not support {}. Device: {}",
        feature,
        device.label()
    );
    DeployError::feature_unsupported(feature)
}

/// Checks a device's declared capability set against the configuration
/// areas the artifact wants to deploy to it.
pub fn check_device_features(device: &Device, config: &DeviceConfig) -> DeployResult<()> {
    let id = device.id;
    let features = &device.feature_group.configuration;

    // Network setting, also needed when the device requires an IP remap.
    if (config.ip_mappings.contains_key(&id) || config.network_settings.contains_key(&id))
        && !features.network_setting
    {
        return Err(unsupported(device, "Network Setting"));
    }

    // 802.1Qbv: required only when at least one interface enables its gate.
    if let Some(table) = config.gate_controls.get(&id) {
        if table.interfaces.iter().any(|i| i.gate_enabled) && !features.tsn.ieee802_1qbv {
            return Err(unsupported(device, "Time Slot Setting (Qbv)"));
        }
    }

    // 802.1CB: an empty stream identity list is the default configuration.
    if let Some(table) = config.cb.get(&id) {
        if !table.stream_identities.is_empty() && !features.tsn.ieee802_1cb {
            return Err(unsupported(device, "Frame Replication (CB)"));
        }
    }

    if config.rstp.contains_key(&id) && !features.spanning_tree.rstp {
        return Err(unsupported(device, "RSTP"));
    }

    if let Some(table) = config.vlans.get(&id) {
        if !table.port_type_entries.is_empty() {
            if !features.vlan.access_trunk_mode {
                return Err(unsupported(device, "Port Type (Access/Trunk)"));
            }
            if table
                .port_type_entries
                .iter()
                .any(|e| e.port_type == VlanPortType::Hybrid)
                && !features.vlan.hybrid_mode
            {
                return Err(unsupported(device, "Port Type (Hybrid)"));
            }
        }

        // A PVID equal to the protocol default is not a configuration.
        if table
            .port_vlan_entries
            .iter()
            .any(|e| e.pvid != DEFAULT_PVID)
            && !features.vlan.default_pvid
        {
            return Err(unsupported(device, "PVID"));
        }

        if table.static_entries.iter().any(|e| e.te_mstid) && !features.vlan.te_mstid {
            return Err(unsupported(device, "TE-MSTID"));
        }
    }

    if let Some(table) = config.port_default_pcps.get(&id) {
        if table.entries.iter().any(|e| !e.pcp.is_default()) && !features.vlan.default_pcp {
            return Err(unsupported(device, "Default PCP"));
        }
    }

    if let Some(table) = config.stream_priority_ingress.get(&id) {
        if !table.entries.is_empty() {
            if table.v2 {
                if !features.vlan.per_stream_priority_v2 {
                    return Err(unsupported(device, "L3 Per-Stream Priority"));
                }
            } else if !features.vlan.per_stream_priority && !features.vlan.per_stream_priority_v2 {
                // A v1 table deploys through either classifier generation.
                return Err(unsupported(device, "Per-Stream Priority"));
            }
        }
    }

    // Egress untagging is only implemented by the first-generation engine.
    if let Some(table) = config.stream_priority_egress.get(&id) {
        if table.entries.iter().any(|e| e.egress_untag) && !features.vlan.per_stream_priority {
            return Err(unsupported(device, "Per-Stream Priority"));
        }
    }

    if let Some(table) = config.unicast_static_forwards.get(&id) {
        if !table.entries.is_empty() && !features.static_forward.unicast {
            return Err(unsupported(device, "Unicast Static Forward"));
        }
    }

    if let Some(table) = config.multicast_static_forwards.get(&id) {
        if !table.entries.is_empty() && !features.static_forward.multicast {
            return Err(unsupported(device, "Multicast Static Forward"));
        }
    }

    Ok(())
}
