//! FDB entry identity and its binary search key.
//!
//! The radix key is `[vlan_hi, vlan_lo, mac0..mac5]`. Putting the VLAN first
//! keeps every entry of one VLAN in a contiguous key range, so per-vlan scans
//! seek to `(vlan, 00:00:00:00:00:00)` and stop at the first foreign VLAN.

use crate::radix::RadixKey;
use sai_common::{MacAddress, VlanId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of the encoded key in bytes.
pub const FDB_KEY_SIZE: usize = 8;

/// Identity of an FDB entry: a MAC address within a VLAN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FdbKey {
    pub mac: MacAddress,
    pub vlan: VlanId,
}

impl FdbKey {
    pub const fn new(mac: MacAddress, vlan: VlanId) -> Self {
        Self { mac, vlan }
    }

    /// Lowest key of `vlan`.
    pub const fn vlan_start(vlan: VlanId) -> Self {
        Self {
            mac: MacAddress::ZERO,
            vlan,
        }
    }

    pub fn to_bytes(&self) -> [u8; FDB_KEY_SIZE] {
        let mut bytes = [0u8; FDB_KEY_SIZE];
        bytes[..2].copy_from_slice(&self.vlan.as_u16().to_be_bytes());
        bytes[2..].copy_from_slice(self.mac.as_bytes());
        bytes
    }

    /// Decodes a key, rejecting VLAN ids outside 1-4094.
    pub fn from_bytes(bytes: &[u8; FDB_KEY_SIZE]) -> Result<Self, sai_common::ParseError> {
        let vlan = VlanId::new(u16::from_be_bytes([bytes[0], bytes[1]]))?;
        let mut mac = [0u8; 6];
        mac.copy_from_slice(&bytes[2..]);
        Ok(Self::new(MacAddress::new(mac), vlan))
    }
}

impl RadixKey for FdbKey {
    fn bits(&self) -> u64 {
        u64::from_be_bytes(self.to_bytes())
    }
}

impl Ord for FdbKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.bits().cmp(&other.bits())
    }
}

impl PartialOrd for FdbKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for FdbKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MAC:{} vlan:{}", self.mac, self.vlan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key(mac: [u8; 6], vlan: u16) -> FdbKey {
        FdbKey::new(MacAddress::new(mac), VlanId::new(vlan).unwrap())
    }

    #[test]
    fn test_key_layout_is_vlan_first_big_endian() {
        let k = key([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff], 0x0102);
        assert_eq!(k.to_bytes(), [0x01, 0x02, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        assert_eq!(FdbKey::from_bytes(&k.to_bytes()).unwrap(), k);
    }

    #[test]
    fn test_keys_order_by_vlan_then_mac() {
        let high_mac_low_vlan = key([0xff; 6], 10);
        let low_mac_high_vlan = key([0x00, 0, 0, 0, 0, 1], 11);
        assert!(high_mac_low_vlan < low_mac_high_vlan);
        assert!(FdbKey::vlan_start(VlanId::new(11).unwrap()) < low_mac_high_vlan);
    }

    #[test]
    fn test_from_bytes_rejects_reserved_vlan() {
        let bytes = [0x0f, 0xff, 0, 0, 0, 0, 0, 1];
        assert!(FdbKey::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_display() {
        let k = key([0, 0x11, 0x22, 0x33, 0x44, 0x55], 100);
        assert_eq!(k.to_string(), "MAC:00:11:22:33:44:55 vlan:100");
    }
}
