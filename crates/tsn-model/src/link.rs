//! Designed topology link.

use serde::{Deserialize, Serialize};
use std::fmt;
use tsn_types::{DeviceId, InterfaceId};

/// One side of a link: a device interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub device: DeviceId,
    pub interface: InterfaceId,
}

impl Endpoint {
    pub fn new(device: impl Into<DeviceId>, interface: impl Into<InterfaceId>) -> Self {
        Endpoint {
            device: device.into(),
            interface: interface.into(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.device, self.interface)
    }
}

/// An undirected cable between two device interfaces, with the speed the
/// design assumes for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: i64,
    pub source: Endpoint,
    pub destination: Endpoint,
    /// Designed link speed in Mbit/s.
    pub speed_mbps: u64,
    /// Cable propagation delay in nanoseconds, when measured.
    pub propagation_delay_ns: Option<u64>,
}

impl Link {
    /// Symmetric endpoint comparison: a link matches another if its
    /// endpoint pair matches in either direction. Link identity and speed
    /// are not part of the comparison.
    pub fn matches_unordered(&self, other: &Link) -> bool {
        (self.source == other.source && self.destination == other.destination)
            || (self.source == other.destination && self.destination == other.source)
    }

    /// Returns true if both endpoints belong to devices accepted by the
    /// predicate.
    pub fn both_endpoints<F: Fn(DeviceId) -> bool>(&self, accepted: F) -> bool {
        accepted(self.source.device) && accepted(self.destination.device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(id: i64, a: (i64, i64), b: (i64, i64)) -> Link {
        Link {
            id,
            source: Endpoint::new(a.0, a.1),
            destination: Endpoint::new(b.0, b.1),
            speed_mbps: 1000,
            propagation_delay_ns: None,
        }
    }

    #[test]
    fn matches_in_either_direction() {
        let designed = link(1, (1, 1), (2, 3));
        let forward = link(9, (1, 1), (2, 3));
        let reversed = link(9, (2, 3), (1, 1));
        assert!(designed.matches_unordered(&forward));
        assert!(designed.matches_unordered(&reversed));
    }

    #[test]
    fn interface_mismatch_is_not_a_match() {
        let designed = link(1, (1, 1), (2, 3));
        let other_port = link(9, (1, 2), (2, 3));
        assert!(!designed.matches_unordered(&other_port));
    }

    #[test]
    fn endpoint_membership() {
        let l = link(1, (1, 1), (2, 3));
        assert!(l.both_endpoints(|d| d.0 <= 2));
        assert!(!l.both_endpoints(|d| d.0 == 1));
    }
}
