//! Identity and value types shared across the TSN orchestration crates.
//!
//! These are the primitives every other crate speaks in:
//!
//! - [`MacAddress`]: 48-bit Ethernet MAC addresses
//! - [`DeviceId`] / [`InterfaceId`]: project-scoped identities
//! - [`VlanId`]: IEEE 802.1Q VLAN identifiers
//! - [`Pcp`]: IEEE 802.1p priority code points

mod id;
mod mac;
mod vlan;

pub use id::{DeviceId, InterfaceId};
pub use mac::MacAddress;
pub use vlan::{Pcp, VlanId, DEFAULT_PVID};

/// Common error type for parsing and validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid VLAN ID: {0} (must be 1-4094)")]
    InvalidVlanId(u16),

    #[error("invalid priority code point: {0} (must be 0-7)")]
    InvalidPcp(u8),
}
