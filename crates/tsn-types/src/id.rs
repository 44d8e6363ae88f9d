//! Project-scoped identity types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a device inside a project.
///
/// Assigned by the design tool; stable across IP changes, which is why the
/// orchestration pipeline keys everything by device id rather than address.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DeviceId(pub i64);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for DeviceId {
    fn from(id: i64) -> Self {
        DeviceId(id)
    }
}

/// Identity of a switch interface (port) on a device.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct InterfaceId(pub i64);

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for InterfaceId {
    fn from(id: i64) -> Self {
        InterfaceId(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_ordering() {
        assert_eq!(DeviceId(7).to_string(), "7");
        assert!(DeviceId(1) < DeviceId(2));
        assert_eq!(InterfaceId(3).to_string(), "3");
    }
}
