//! Deployment error types.

use thiserror::Error;
use tsn_southbound::SouthboundError;
use tsn_types::MacAddress;

/// Result type alias for deployment operations.
pub type DeployResult<T> = Result<T, DeployError>;

/// Errors raised inside the deployment pipeline.
///
/// All of these are device-scoped: they are caught at the device-loop
/// level, converted into a result-queue entry, and never abort the cohort.
#[derive(Debug, Clone, Error)]
pub enum DeployError {
    /// A referenced device, profile or table is absent.
    #[error("{what} not found")]
    NotFound { what: String },

    /// A device addressed by MAC has no entry in the known host map, so no
    /// temporary address-resolution entry can be seeded for it.
    #[error("MAC {mac} not found in the known host map")]
    MacHostNotFound { mac: MacAddress },

    /// The capability gate rejected a device.
    #[error("device does not support {feature}")]
    FeatureUnsupported { feature: String },

    /// A gate control list is longer than the hardware accepts.
    #[error("gate control list length {requested} exceeds device capacity {capacity}")]
    GateControlCapacity { requested: u32, capacity: u32 },

    /// The southbound client reported a failure; the protocol-level detail
    /// is preserved verbatim.
    #[error(transparent)]
    Southbound(#[from] SouthboundError),
}

impl DeployError {
    /// Creates a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        DeployError::NotFound { what: what.into() }
    }

    /// Creates a capability-gate rejection naming the missing feature.
    pub fn feature_unsupported(feature: impl Into<String>) -> Self {
        DeployError::FeatureUnsupported {
            feature: feature.into(),
        }
    }
}
