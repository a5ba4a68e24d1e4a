//! SAI status codes and adapter error handling.
//!
//! Adapter operations return [`SaiResult`]. At the C boundary an error is
//! turned back into the raw `sai_status_t` value with [`SaiError::to_status`]
//! and [`SaiStatus::as_raw`].

use std::fmt;
use thiserror::Error;

/// Base value of the indexed attribute status ranges.
const ATTR_RANGE: i32 = 0x0001_0000;

/// Number of attribute indices each indexed range can express.
const ATTR_INDEX_MAX: i32 = 0xFFFF;

/// SAI status codes.
///
/// The plain codes match `sai_status_t`. The attribute codes carry the index
/// of the offending attribute in the request list, encoded the way SAI does:
/// `SAI_STATUS_INVALID_ATTR_VALUE_0 + index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaiStatus {
    Success,
    Failure,
    NotSupported,
    NoMemory,
    InsufficientResources,
    InvalidParameter,
    ItemAlreadyExists,
    ItemNotFound,
    BufferOverflow,
    InvalidPortNumber,
    InvalidPortMember,
    InvalidVlanId,
    Uninitialized,
    TableFull,
    MandatoryAttributeMissing,
    NotImplemented,
    AddrNotFound,
    ObjectInUse,
    InvalidObjectType,
    InvalidObjectId,
    InvalidNifId,
    NifTableFull,
    HwTableFull,
    NotExecuted,
    /// `SAI_STATUS_INVALID_ATTRIBUTE` without an index.
    InvalidAttributeUnindexed,
    InvalidAttribute(u16),
    InvalidAttrValue(u16),
    AttrNotImplemented(u16),
    UnknownAttribute(u16),
    AttrNotSupported(u16),
}

impl SaiStatus {
    /// Decodes a raw `sai_status_t` value. Unknown codes map to `Failure`.
    ///
    /// Indexed codes are recognised from `-0x1_0000` down. Range 1 indices
    /// above zero overlap the plain codes and only index 0 decodes there.
    pub fn from_raw(status: i32) -> Self {
        match status {
            0 => SaiStatus::Success,
            -1 => SaiStatus::Failure,
            -2 => SaiStatus::NotSupported,
            -3 => SaiStatus::NoMemory,
            -4 => SaiStatus::InsufficientResources,
            -5 => SaiStatus::InvalidParameter,
            -6 => SaiStatus::ItemAlreadyExists,
            -7 => SaiStatus::ItemNotFound,
            -8 => SaiStatus::BufferOverflow,
            -9 => SaiStatus::InvalidPortNumber,
            -10 => SaiStatus::InvalidPortMember,
            -11 => SaiStatus::InvalidVlanId,
            -12 => SaiStatus::Uninitialized,
            -13 => SaiStatus::TableFull,
            -14 => SaiStatus::MandatoryAttributeMissing,
            -15 => SaiStatus::NotImplemented,
            -16 => SaiStatus::AddrNotFound,
            -17 => SaiStatus::ObjectInUse,
            -18 => SaiStatus::InvalidObjectType,
            -19 => SaiStatus::InvalidObjectId,
            -20 => SaiStatus::InvalidNifId,
            -21 => SaiStatus::NifTableFull,
            -22 => SaiStatus::HwTableFull,
            -23 => SaiStatus::NotExecuted,
            -24 => SaiStatus::InvalidAttributeUnindexed,
            raw if (-5 * ATTR_RANGE..=-ATTR_RANGE).contains(&raw) => {
                // -0x1_0000 + idx lands in range 1, -0x2_0000 + idx in range 2, ...
                let range = (-raw + ATTR_INDEX_MAX) / ATTR_RANGE;
                let index = (raw + range * ATTR_RANGE) as u16;
                match range {
                    1 => SaiStatus::InvalidAttribute(index),
                    2 => SaiStatus::InvalidAttrValue(index),
                    3 => SaiStatus::AttrNotImplemented(index),
                    4 => SaiStatus::UnknownAttribute(index),
                    5 => SaiStatus::AttrNotSupported(index),
                    _ => SaiStatus::Failure,
                }
            }
            _ => SaiStatus::Failure,
        }
    }

    /// Encodes the status as a raw `sai_status_t` value.
    pub fn as_raw(&self) -> i32 {
        let indexed = |range: i32, index: u16| -range * ATTR_RANGE + i32::from(index);
        match *self {
            SaiStatus::Success => 0,
            SaiStatus::Failure => -1,
            SaiStatus::NotSupported => -2,
            SaiStatus::NoMemory => -3,
            SaiStatus::InsufficientResources => -4,
            SaiStatus::InvalidParameter => -5,
            SaiStatus::ItemAlreadyExists => -6,
            SaiStatus::ItemNotFound => -7,
            SaiStatus::BufferOverflow => -8,
            SaiStatus::InvalidPortNumber => -9,
            SaiStatus::InvalidPortMember => -10,
            SaiStatus::InvalidVlanId => -11,
            SaiStatus::Uninitialized => -12,
            SaiStatus::TableFull => -13,
            SaiStatus::MandatoryAttributeMissing => -14,
            SaiStatus::NotImplemented => -15,
            SaiStatus::AddrNotFound => -16,
            SaiStatus::ObjectInUse => -17,
            SaiStatus::InvalidObjectType => -18,
            SaiStatus::InvalidObjectId => -19,
            SaiStatus::InvalidNifId => -20,
            SaiStatus::NifTableFull => -21,
            SaiStatus::HwTableFull => -22,
            SaiStatus::NotExecuted => -23,
            SaiStatus::InvalidAttributeUnindexed => -24,
            SaiStatus::InvalidAttribute(i) => indexed(1, i),
            SaiStatus::InvalidAttrValue(i) => indexed(2, i),
            SaiStatus::AttrNotImplemented(i) => indexed(3, i),
            SaiStatus::UnknownAttribute(i) => indexed(4, i),
            SaiStatus::AttrNotSupported(i) => indexed(5, i),
        }
    }
}

impl fmt::Display for SaiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SaiStatus::Success => "SAI_STATUS_SUCCESS",
            SaiStatus::Failure => "SAI_STATUS_FAILURE",
            SaiStatus::NotSupported => "SAI_STATUS_NOT_SUPPORTED",
            SaiStatus::NoMemory => "SAI_STATUS_NO_MEMORY",
            SaiStatus::InsufficientResources => "SAI_STATUS_INSUFFICIENT_RESOURCES",
            SaiStatus::InvalidParameter => "SAI_STATUS_INVALID_PARAMETER",
            SaiStatus::ItemAlreadyExists => "SAI_STATUS_ITEM_ALREADY_EXISTS",
            SaiStatus::ItemNotFound => "SAI_STATUS_ITEM_NOT_FOUND",
            SaiStatus::BufferOverflow => "SAI_STATUS_BUFFER_OVERFLOW",
            SaiStatus::InvalidPortNumber => "SAI_STATUS_INVALID_PORT_NUMBER",
            SaiStatus::InvalidPortMember => "SAI_STATUS_INVALID_PORT_MEMBER",
            SaiStatus::InvalidVlanId => "SAI_STATUS_INVALID_VLAN_ID",
            SaiStatus::Uninitialized => "SAI_STATUS_UNINITIALIZED",
            SaiStatus::TableFull => "SAI_STATUS_TABLE_FULL",
            SaiStatus::MandatoryAttributeMissing => "SAI_STATUS_MANDATORY_ATTRIBUTE_MISSING",
            SaiStatus::NotImplemented => "SAI_STATUS_NOT_IMPLEMENTED",
            SaiStatus::AddrNotFound => "SAI_STATUS_ADDR_NOT_FOUND",
            SaiStatus::ObjectInUse => "SAI_STATUS_OBJECT_IN_USE",
            SaiStatus::InvalidObjectType => "SAI_STATUS_INVALID_OBJECT_TYPE",
            SaiStatus::InvalidObjectId => "SAI_STATUS_INVALID_OBJECT_ID",
            SaiStatus::InvalidNifId => "SAI_STATUS_INVALID_NIF_ID",
            SaiStatus::NifTableFull => "SAI_STATUS_NIF_TABLE_FULL",
            SaiStatus::HwTableFull => "SAI_STATUS_HW_TABLE_FULL",
            SaiStatus::NotExecuted => "SAI_STATUS_NOT_EXECUTED",
            SaiStatus::InvalidAttributeUnindexed => "SAI_STATUS_INVALID_ATTRIBUTE",
            SaiStatus::InvalidAttribute(i) => return write!(f, "SAI_STATUS_INVALID_ATTRIBUTE_{}", i),
            SaiStatus::InvalidAttrValue(i) => return write!(f, "SAI_STATUS_INVALID_ATTR_VALUE_{}", i),
            SaiStatus::AttrNotImplemented(i) => {
                return write!(f, "SAI_STATUS_ATTR_NOT_IMPLEMENTED_{}", i)
            }
            SaiStatus::UnknownAttribute(i) => return write!(f, "SAI_STATUS_UNKNOWN_ATTRIBUTE_{}", i),
            SaiStatus::AttrNotSupported(i) => {
                return write!(f, "SAI_STATUS_ATTR_NOT_SUPPORTED_{}", i)
            }
        };
        write!(f, "{}", s)
    }
}

/// Error type for SAI adapter operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaiError {
    /// An SAI status without a more specific mapping.
    #[error("SAI operation failed: {status}")]
    Status { status: SaiStatus },

    /// No cache entry exists for the given address.
    #[error("Address not found: {addr}")]
    AddrNotFound { addr: String },

    /// The item already exists.
    #[error("Item already exists: {item}")]
    AlreadyExists { item: String },

    /// Allocation failed.
    #[error("No memory for {what}")]
    NoMemory { what: String },

    /// Object is in use and cannot be removed.
    #[error("Object in use: {object}")]
    ObjectInUse { object: String },

    /// The value of the attribute at `index` is not acceptable.
    #[error("Invalid value for attribute #{index}: {message}")]
    InvalidAttributeValue { index: u16, message: String },

    /// The attribute at `index` is not known to this object type.
    #[error("Unknown attribute #{index}: id {attr_id}")]
    UnknownAttribute { index: u16, attr_id: u32 },
}

impl SaiError {
    /// Creates an error from a SAI status code.
    pub fn from_status(status: SaiStatus) -> Self {
        match status {
            SaiStatus::AddrNotFound => SaiError::AddrNotFound {
                addr: "unknown".to_string(),
            },
            SaiStatus::ItemAlreadyExists => SaiError::AlreadyExists {
                item: "unknown".to_string(),
            },
            SaiStatus::NoMemory => SaiError::NoMemory {
                what: "unknown".to_string(),
            },
            SaiStatus::ObjectInUse => SaiError::ObjectInUse {
                object: "unknown".to_string(),
            },
            SaiStatus::InvalidAttrValue(index) => SaiError::InvalidAttributeValue {
                index,
                message: format!("SAI returned {}", status),
            },
            SaiStatus::UnknownAttribute(index) => SaiError::UnknownAttribute { index, attr_id: 0 },
            _ => SaiError::Status { status },
        }
    }

    /// Returns the SAI status reported to the caller of the C API.
    pub fn to_status(&self) -> SaiStatus {
        match self {
            SaiError::Status { status } => *status,
            SaiError::AddrNotFound { .. } => SaiStatus::AddrNotFound,
            SaiError::AlreadyExists { .. } => SaiStatus::ItemAlreadyExists,
            SaiError::NoMemory { .. } => SaiStatus::NoMemory,
            SaiError::ObjectInUse { .. } => SaiStatus::ObjectInUse,
            SaiError::InvalidAttributeValue { index, .. } => SaiStatus::InvalidAttrValue(*index),
            SaiError::UnknownAttribute { index, .. } => SaiStatus::UnknownAttribute(*index),
        }
    }

    pub fn addr_not_found(addr: impl Into<String>) -> Self {
        SaiError::AddrNotFound { addr: addr.into() }
    }

    pub fn no_memory(what: impl Into<String>) -> Self {
        SaiError::NoMemory { what: what.into() }
    }

    pub fn object_in_use(object: impl Into<String>) -> Self {
        SaiError::ObjectInUse {
            object: object.into(),
        }
    }

    pub fn invalid_attr_value(index: u16, message: impl Into<String>) -> Self {
        SaiError::InvalidAttributeValue {
            index,
            message: message.into(),
        }
    }
}

/// Result type for SAI operations.
pub type SaiResult<T> = Result<T, SaiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_status_raw_values() {
        assert_eq!(SaiStatus::from_raw(0), SaiStatus::Success);
        assert_eq!(SaiStatus::from_raw(-16), SaiStatus::AddrNotFound);
        assert_eq!(SaiStatus::from_raw(-17), SaiStatus::ObjectInUse);
        assert_eq!(SaiStatus::from_raw(-999), SaiStatus::Failure);
        assert_eq!(SaiStatus::from_raw(-0x0001_0000 + 5), SaiStatus::Failure);
        assert_eq!(SaiStatus::ObjectInUse.as_raw(), -17);
    }

    #[test]
    fn test_codes_between_plain_and_indexed() {
        assert_eq!(SaiStatus::from_raw(-20), SaiStatus::InvalidNifId);
        assert_eq!(SaiStatus::from_raw(-21), SaiStatus::NifTableFull);
        assert_eq!(SaiStatus::from_raw(-22), SaiStatus::HwTableFull);
        assert_eq!(SaiStatus::from_raw(-23), SaiStatus::NotExecuted);
        assert_eq!(SaiStatus::from_raw(-24), SaiStatus::InvalidAttributeUnindexed);
        assert_eq!(SaiStatus::from_raw(-25), SaiStatus::Failure);
        assert_eq!(SaiStatus::HwTableFull.as_raw(), -22);
        assert_eq!(
            SaiStatus::InvalidAttributeUnindexed.to_string(),
            "SAI_STATUS_INVALID_ATTRIBUTE"
        );
    }

    #[test]
    fn test_indexed_attribute_status() {
        assert_eq!(SaiStatus::InvalidAttrValue(0).as_raw(), -0x0002_0000);
        assert_eq!(SaiStatus::InvalidAttrValue(3).as_raw(), -0x0002_0000 + 3);
        assert_eq!(SaiStatus::UnknownAttribute(0).as_raw(), -0x0004_0000);

        assert_eq!(SaiStatus::from_raw(-0x0002_0000 + 3), SaiStatus::InvalidAttrValue(3));
        assert_eq!(SaiStatus::from_raw(-0x0004_0000), SaiStatus::UnknownAttribute(0));
        assert_eq!(SaiStatus::from_raw(-0x0001_0000), SaiStatus::InvalidAttribute(0));
        assert_eq!(SaiStatus::from_raw(-0x0005_0000 - 1), SaiStatus::Failure);
        assert_eq!(SaiStatus::from_raw(-0x0005_0000 + 0xFFFF), SaiStatus::AttrNotSupported(0xFFFF));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SaiStatus::AddrNotFound.to_string(), "SAI_STATUS_ADDR_NOT_FOUND");
        assert_eq!(
            SaiStatus::InvalidAttrValue(0).to_string(),
            "SAI_STATUS_INVALID_ATTR_VALUE_0"
        );
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(SaiError::addr_not_found("k").to_status(), SaiStatus::AddrNotFound);
        assert_eq!(SaiError::object_in_use("k").to_status(), SaiStatus::ObjectInUse);
        assert_eq!(
            SaiError::invalid_attr_value(0, "bad port").to_status(),
            SaiStatus::InvalidAttrValue(0)
        );

        let err = SaiError::from_status(SaiStatus::ObjectInUse);
        assert!(matches!(err, SaiError::ObjectInUse { .. }));
    }
}
