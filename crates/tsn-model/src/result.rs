//! Per-device outcomes and comparison findings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tsn_types::DeviceId;

/// Terminal state of one device inside a deployment job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigureStatus {
    Success,
    Failed,
    /// The whole cohort was stopped before this device was configured
    /// (pre-flight gate failure or operator cancellation).
    Stopped,
}

/// One entry of the deployment result queue.
///
/// Appended as each device finishes; the caller drains the queue at its own
/// pace, independently of job completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfigureResult {
    pub device: DeviceId,
    /// Job progress at the time the result was recorded.
    pub progress: u8,
    pub status: ConfigureStatus,
    pub reason: String,
    pub detail: String,
}

impl DeviceConfigureResult {
    pub fn success(device: DeviceId, progress: u8) -> Self {
        DeviceConfigureResult {
            device,
            progress,
            status: ConfigureStatus::Success,
            reason: String::new(),
            detail: String::new(),
        }
    }

    pub fn failed(
        device: DeviceId,
        progress: u8,
        reason: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        DeviceConfigureResult {
            device,
            progress,
            status: ConfigureStatus::Failed,
            reason: reason.into(),
            detail: detail.into(),
        }
    }

    pub fn stopped(
        device: DeviceId,
        progress: u8,
        reason: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        DeviceConfigureResult {
            device,
            progress,
            status: ConfigureStatus::Stopped,
            reason: reason.into(),
            detail: detail.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ConfigureStatus::Success
    }
}

/// Structured diff produced by the topology comparison.
///
/// Each category accumulates the identities of every offender (device
/// address or link label) so one pass reports the full extent of the
/// drift. Ordered sets keep the report stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareFindings {
    /// Designed links with no live counterpart.
    pub links_not_found: BTreeSet<String>,
    /// Live links the design does not contain.
    pub links_extra: BTreeSet<String>,
    pub hybrid_vlan_failed: BTreeSet<String>,
    pub device_config_failed: BTreeSet<String>,
    pub alive_failed: BTreeSet<String>,
    pub model_name_failed: BTreeSet<String>,
    pub speed_failed: BTreeSet<String>,
}

impl CompareFindings {
    /// True when every enabled check passed.
    pub fn is_clean(&self) -> bool {
        self.links_not_found.is_empty()
            && self.links_extra.is_empty()
            && self.hybrid_vlan_failed.is_empty()
            && self.device_config_failed.is_empty()
            && self.alive_failed.is_empty()
            && self.model_name_failed.is_empty()
            && self.speed_failed.is_empty()
    }

    /// Names of the categories holding at least one finding.
    pub fn failed_categories(&self) -> Vec<&'static str> {
        let mut categories = Vec::new();
        if !self.links_not_found.is_empty() {
            categories.push("links not found");
        }
        if !self.links_extra.is_empty() {
            categories.push("extra links");
        }
        if !self.hybrid_vlan_failed.is_empty() {
            categories.push("hybrid VLAN capability");
        }
        if !self.device_config_failed.is_empty() {
            categories.push("device config");
        }
        if !self.alive_failed.is_empty() {
            categories.push("device alive");
        }
        if !self.model_name_failed.is_empty() {
            categories.push("model name");
        }
        if !self.speed_failed.is_empty() {
            categories.push("link speed");
        }
        categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn result_constructors() {
        let ok = DeviceConfigureResult::success(DeviceId(1), 42);
        assert!(ok.is_success());
        assert_eq!(ok.progress, 42);

        let failed = DeviceConfigureResult::failed(DeviceId(2), 50, "Configure VLAN failed", "timeout");
        assert_eq!(failed.status, ConfigureStatus::Failed);
        assert_eq!(failed.reason, "Configure VLAN failed");
    }

    #[test]
    fn findings_clean_and_categories() {
        let mut findings = CompareFindings::default();
        assert!(findings.is_clean());
        assert!(findings.failed_categories().is_empty());

        findings.links_extra.insert("10.0.0.1(1)-10.0.0.2(2)".into());
        findings.alive_failed.insert("10.0.0.3".into());
        assert!(!findings.is_clean());
        assert_eq!(
            findings.failed_categories(),
            vec!["extra links", "device alive"]
        );
    }
}
