//! Southbound error type.

use thiserror::Error;

/// Result type alias for southbound operations.
pub type SouthboundResult<T> = Result<T, SouthboundError>;

/// Errors surfaced by a southbound protocol client.
///
/// The `message`/`detail` split is deliberate: `message` is the operator
/// headline, `detail` carries the protocol-level diagnosis verbatim so
/// nothing is lost between the device and the result queue.
#[derive(Debug, Clone, Error)]
pub enum SouthboundError {
    /// The device did not answer a protocol request.
    #[error("device {address} unreachable: {detail}")]
    Unreachable { address: String, detail: String },

    /// A configuration or action call was rejected or failed on the device.
    #[error("{operation} failed: {detail}")]
    OperationFailed { operation: String, detail: String },

    /// A local host-side action (ARP table manipulation, cache flush)
    /// failed.
    #[error("host operation {operation} failed: {detail}")]
    HostOperationFailed { operation: String, detail: String },

    /// The client was asked to stop mid-operation.
    #[error("operation aborted by stop request")]
    Aborted,
}

impl SouthboundError {
    /// Creates an unreachable-device error.
    pub fn unreachable(address: impl Into<String>, detail: impl Into<String>) -> Self {
        SouthboundError::Unreachable {
            address: address.into(),
            detail: detail.into(),
        }
    }

    /// Creates an operation failure.
    pub fn operation(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        SouthboundError::OperationFailed {
            operation: operation.into(),
            detail: detail.into(),
        }
    }

    /// Creates a host-side failure.
    pub fn host(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        SouthboundError::HostOperationFailed {
            operation: operation.into(),
            detail: detail.into(),
        }
    }
}
