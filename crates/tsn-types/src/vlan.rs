//! VLAN identifier and priority code point types with validation.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The factory-default port VLAN id.
///
/// A port-VLAN entry carrying this value is indistinguishable from an
/// unconfigured port, so the capability gate ignores it.
pub const DEFAULT_PVID: u16 = 1;

/// IEEE 802.1Q VLAN identifier (1-4094).
///
/// VLAN 0 (priority tagging) and 4095 are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct VlanId(u16);

impl VlanId {
    /// Minimum valid VLAN ID.
    pub const MIN: u16 = 1;

    /// Maximum valid VLAN ID.
    pub const MAX: u16 = 4094;

    /// Default VLAN (VLAN 1).
    pub const DEFAULT: VlanId = VlanId(DEFAULT_PVID);

    /// Creates a new VLAN ID, validating the 1-4094 range.
    pub const fn new(id: u16) -> Result<Self, ParseError> {
        if id >= Self::MIN && id <= Self::MAX {
            Ok(VlanId(id))
        } else {
            Err(ParseError::InvalidVlanId(id))
        }
    }

    /// Returns the VLAN ID as a u16.
    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    /// Returns true if this is the default VLAN (VLAN 1).
    pub const fn is_default(&self) -> bool {
        self.0 == DEFAULT_PVID
    }
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for VlanId {
    type Error = ParseError;

    fn try_from(id: u16) -> Result<Self, Self::Error> {
        VlanId::new(id)
    }
}

impl From<VlanId> for u16 {
    fn from(vlan: VlanId) -> u16 {
        vlan.0
    }
}

/// IEEE 802.1p priority code point (0-7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Pcp(u8);

impl Pcp {
    /// The protocol default priority.
    pub const DEFAULT: Pcp = Pcp(0);

    /// Creates a new PCP, validating the 0-7 range.
    pub const fn new(pcp: u8) -> Result<Self, ParseError> {
        if pcp <= 7 {
            Ok(Pcp(pcp))
        } else {
            Err(ParseError::InvalidPcp(pcp))
        }
    }

    /// Returns the priority as a u8.
    pub const fn as_u8(&self) -> u8 {
        self.0
    }

    /// Returns true if this is the protocol default priority (0).
    pub const fn is_default(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Pcp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for Pcp {
    type Error = ParseError;

    fn try_from(pcp: u8) -> Result<Self, Self::Error> {
        Pcp::new(pcp)
    }
}

impl From<Pcp> for u8 {
    fn from(pcp: Pcp) -> u8 {
        pcp.0
    }
}
