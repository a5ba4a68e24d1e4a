//! SAI object ids.
//!
//! The adapter packs the SAI object type into bits 48..56 of every object id
//! it hands out, so the type of an id can be recovered without a lookup.
//! Attribute validation relies on this: an FDB entry's port attribute must
//! decode to either a port or a LAG.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw SAI object ID type (matches sai_object_id_t in C).
pub type RawSaiObjectId = u64;

const TYPE_SHIFT: u32 = 48;
const TYPE_MASK: u64 = 0xFF;
const INDEX_MASK: u64 = (1 << TYPE_SHIFT) - 1;

/// SAI object types the FDB core needs to tell apart.
///
/// Discriminants follow `sai_object_type_t`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaiObjectType {
    Null = 0,
    Port = 1,
    Lag = 2,
    VirtualRouter = 3,
    RouterInterface = 6,
    LagMember = 27,
    Switch = 33,
    Vlan = 38,
    VlanMember = 39,
    Tunnel = 42,
    L2mcGroup = 49,
    Bridge = 57,
    BridgePort = 58,
}

impl SaiObjectType {
    /// Decodes an object type value. Unknown values yield `None`.
    pub fn from_raw(raw: u8) -> Option<Self> {
        let ty = match raw {
            0 => SaiObjectType::Null,
            1 => SaiObjectType::Port,
            2 => SaiObjectType::Lag,
            3 => SaiObjectType::VirtualRouter,
            6 => SaiObjectType::RouterInterface,
            27 => SaiObjectType::LagMember,
            33 => SaiObjectType::Switch,
            38 => SaiObjectType::Vlan,
            39 => SaiObjectType::VlanMember,
            42 => SaiObjectType::Tunnel,
            49 => SaiObjectType::L2mcGroup,
            57 => SaiObjectType::Bridge,
            58 => SaiObjectType::BridgePort,
            _ => return None,
        };
        Some(ty)
    }

    /// Returns the SAI object type name for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            SaiObjectType::Null => "Null",
            SaiObjectType::Port => "Port",
            SaiObjectType::Lag => "Lag",
            SaiObjectType::VirtualRouter => "VirtualRouter",
            SaiObjectType::RouterInterface => "RouterInterface",
            SaiObjectType::LagMember => "LagMember",
            SaiObjectType::Switch => "Switch",
            SaiObjectType::Vlan => "Vlan",
            SaiObjectType::VlanMember => "VlanMember",
            SaiObjectType::Tunnel => "Tunnel",
            SaiObjectType::L2mcGroup => "L2mcGroup",
            SaiObjectType::Bridge => "Bridge",
            SaiObjectType::BridgePort => "BridgePort",
        }
    }
}

/// An SAI object id carrying its object type in the upper bits.
///
/// # Examples
///
/// ```
/// use sai_common::{SaiObjectId, SaiObjectType};
///
/// let port = SaiObjectId::new(SaiObjectType::Port, 1);
/// assert_eq!(port.as_raw(), 0x1_0000_0000_0001);
/// assert_eq!(port.object_type(), Some(SaiObjectType::Port));
/// assert_eq!(port.index(), 1);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaiObjectId(RawSaiObjectId);

impl SaiObjectId {
    /// The null object ID (SAI_NULL_OBJECT_ID).
    pub const NULL: Self = SaiObjectId(0);

    /// Builds an object id from its type and a per-type index.
    ///
    /// Index bits above bit 47 are discarded.
    pub const fn new(object_type: SaiObjectType, index: u64) -> Self {
        SaiObjectId(((object_type as u64) << TYPE_SHIFT) | (index & INDEX_MASK))
    }

    /// Wraps a raw object id value, including null.
    pub const fn from_raw(raw: RawSaiObjectId) -> Self {
        SaiObjectId(raw)
    }

    /// Returns the raw object ID value.
    pub const fn as_raw(&self) -> RawSaiObjectId {
        self.0
    }

    /// Returns true if this is a null object ID.
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Returns the object type encoded in the id, if it is one the adapter knows.
    pub fn object_type(&self) -> Option<SaiObjectType> {
        SaiObjectType::from_raw(((self.0 >> TYPE_SHIFT) & TYPE_MASK) as u8)
    }

    /// Returns the per-type index of the object.
    pub const fn index(&self) -> u64 {
        self.0 & INDEX_MASK
    }
}

impl fmt::Debug for SaiObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.object_type().map_or("Unknown", |t| t.type_name());
        write!(f, "{}(0x{:016x})", name, self.0)
    }
}

impl fmt::Display for SaiObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

impl From<RawSaiObjectId> for SaiObjectId {
    fn from(raw: RawSaiObjectId) -> Self {
        SaiObjectId(raw)
    }
}

impl From<SaiObjectId> for RawSaiObjectId {
    fn from(oid: SaiObjectId) -> Self {
        oid.0
    }
}

/// Returns true if `oid` refers to a port object.
pub fn is_port_object(oid: SaiObjectId) -> bool {
    oid.object_type() == Some(SaiObjectType::Port)
}

/// Returns true if `oid` refers to a LAG object.
pub fn is_lag_object(oid: SaiObjectId) -> bool {
    oid.object_type() == Some(SaiObjectType::Lag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_oid_encoding() {
        let lag = SaiObjectId::new(SaiObjectType::Lag, 0x42);
        assert_eq!(lag.as_raw(), 0x2_0000_0000_0042);
        assert_eq!(lag.object_type(), Some(SaiObjectType::Lag));
        assert_eq!(lag.index(), 0x42);
    }

    #[test]
    fn test_null_oid() {
        assert!(SaiObjectId::NULL.is_null());
        assert_eq!(SaiObjectId::NULL.object_type(), Some(SaiObjectType::Null));
        assert!(!is_port_object(SaiObjectId::NULL));
    }

    #[test]
    fn test_classification() {
        let port = SaiObjectId::new(SaiObjectType::Port, 3);
        let lag = SaiObjectId::new(SaiObjectType::Lag, 3);
        let bridge_port = SaiObjectId::new(SaiObjectType::BridgePort, 3);

        assert!(is_port_object(port));
        assert!(!is_lag_object(port));
        assert!(is_lag_object(lag));
        assert!(!is_port_object(bridge_port));
        assert!(!is_lag_object(bridge_port));
    }

    #[test]
    fn test_unknown_type() {
        let oid = SaiObjectId::from_raw(0xEE_0000_0000_0001);
        assert_eq!(oid.object_type(), None);
        assert!(format!("{:?}", oid).starts_with("Unknown("));
    }

    #[test]
    fn test_oid_formatting() {
        let port = SaiObjectId::new(SaiObjectType::Port, 1);
        assert_eq!(port.to_string(), "0x0001000000000001");
        assert_eq!(format!("{:?}", port), "Port(0x0001000000000001)");
    }

    #[test]
    fn test_oid_serializes_as_raw_number() {
        let port = SaiObjectId::new(SaiObjectType::Port, 1);
        assert_eq!(serde_json::to_string(&port).unwrap(), "281474976710657");
    }
}
