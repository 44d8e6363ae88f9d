//! MAC address type with safe parsing and formatting.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 48-bit Ethernet MAC address.
///
/// Devices discovered by broadcast search are addressed by MAC before they
/// have a final IP, so this type doubles as a lookup key into the
/// MAC-to-host reachability map.
///
/// # Examples
///
/// ```
/// use tsn_types::MacAddress;
///
/// let mac: MacAddress = "00:90:e8:11:22:33".parse().unwrap();
/// assert_eq!(mac.to_string(), "00:90:e8:11:22:33");
///
/// // Hyphen-separated input is accepted as well
/// let mac2: MacAddress = "00-90-E8-11-22-33".parse().unwrap();
/// assert_eq!(mac, mac2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// The broadcast MAC address (ff:ff:ff:ff:ff:ff).
    pub const BROADCAST: MacAddress = MacAddress([0xff; 6]);

    /// The all-zero MAC address.
    pub const ZERO: MacAddress = MacAddress([0; 6]);

    /// Creates a MAC address from raw bytes.
    pub const fn new(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }

    /// Returns the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Returns true if the group bit (LSB of the first octet) is set.
    pub const fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    /// Returns true for an individual (non-group) address.
    pub const fn is_unicast(&self) -> bool {
        !self.is_multicast()
    }

    /// Returns true for ff:ff:ff:ff:ff:ff.
    pub fn is_broadcast(&self) -> bool {
        self.0 == [0xff; 6]
    }

    /// Returns true for 00:00:00:00:00:00.
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 6]
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let separator = if s.contains(':') { ':' } else { '-' };

        let mut bytes = [0u8; 6];
        let mut count = 0;
        for part in s.split(separator) {
            if count == 6 {
                return Err(ParseError::InvalidMacAddress(s.to_string()));
            }
            bytes[count] = u8::from_str_radix(part, 16)
                .map_err(|_| ParseError::InvalidMacAddress(s.to_string()))?;
            count += 1;
        }
        if count != 6 {
            return Err(ParseError::InvalidMacAddress(s.to_string()));
        }

        Ok(MacAddress(bytes))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> String {
        mac.to_string()
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_colon_and_hyphen_formats() {
        let a: MacAddress = "00:90:e8:00:00:01".parse().unwrap();
        let b: MacAddress = "00-90-E8-00-00-01".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_bytes(), &[0x00, 0x90, 0xe8, 0x00, 0x00, 0x01]);
    }

    #[test]
    fn display_is_lowercase_colon() {
        let mac = MacAddress::new([0xAA, 0xBB, 0xCC, 0x00, 0x11, 0x22]);
        assert_eq!(mac.to_string(), "aa:bb:cc:00:11:22");
    }

    #[test]
    fn unicast_and_multicast() {
        let unicast: MacAddress = "00:90:e8:11:22:33".parse().unwrap();
        assert!(unicast.is_unicast());

        let multicast: MacAddress = "01:1b:19:00:00:00".parse().unwrap();
        assert!(multicast.is_multicast());

        assert!(MacAddress::BROADCAST.is_broadcast());
        assert!(MacAddress::ZERO.is_zero());
    }

    #[test]
    fn rejects_malformed_input() {
        assert!("".parse::<MacAddress>().is_err());
        assert!("00:90:e8".parse::<MacAddress>().is_err());
        assert!("00:90:e8:11:22:33:44".parse::<MacAddress>().is_err());
        assert!("zz:90:e8:11:22:33".parse::<MacAddress>().is_err());
    }

    #[test]
    fn serde_round_trip_as_string() {
        let mac: MacAddress = "00:90:e8:11:22:33".parse().unwrap();
        let json = serde_json::to_string(&mac).unwrap();
        assert_eq!(json, "\"00:90:e8:11:22:33\"");
        let back: MacAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mac);
    }
}
