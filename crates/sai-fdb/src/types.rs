//! FDB entry, attribute and event types.

use crate::key::FdbKey;
use sai_common::{SaiError, SaiObjectId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// `sai_fdb_entry_type_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FdbEntryType {
    #[default]
    Dynamic,
    Static,
}

impl TryFrom<i32> for FdbEntryType {
    type Error = SaiError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FdbEntryType::Dynamic),
            1 => Ok(FdbEntryType::Static),
            other => Err(SaiError::invalid_attr_value(
                0,
                format!("unknown FDB entry type {}", other),
            )),
        }
    }
}

impl fmt::Display for FdbEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FdbEntryType::Dynamic => write!(f, "dynamic"),
            FdbEntryType::Static => write!(f, "static"),
        }
    }
}

/// `sai_packet_action_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketAction {
    Drop,
    #[default]
    Forward,
    Copy,
    CopyCancel,
    Trap,
    Log,
    Deny,
    Transit,
}

impl PacketAction {
    /// Actions an FDB entry may carry.
    pub fn is_fdb_action(&self) -> bool {
        matches!(
            self,
            PacketAction::Forward | PacketAction::Trap | PacketAction::Log | PacketAction::Drop
        )
    }
}

impl TryFrom<i32> for PacketAction {
    type Error = SaiError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        let action = match value {
            0 => PacketAction::Drop,
            1 => PacketAction::Forward,
            2 => PacketAction::Copy,
            3 => PacketAction::CopyCancel,
            4 => PacketAction::Trap,
            5 => PacketAction::Log,
            6 => PacketAction::Deny,
            7 => PacketAction::Transit,
            other => {
                return Err(SaiError::invalid_attr_value(
                    0,
                    format!("unknown packet action {}", other),
                ))
            }
        };
        Ok(action)
    }
}

impl fmt::Display for PacketAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PacketAction::Drop => "drop",
            PacketAction::Forward => "forward",
            PacketAction::Copy => "copy",
            PacketAction::CopyCancel => "copy_cancel",
            PacketAction::Trap => "trap",
            PacketAction::Log => "log",
            PacketAction::Deny => "deny",
            PacketAction::Transit => "transit",
        };
        f.write_str(s)
    }
}

/// `sai_fdb_event_t`: what happened to a watched entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FdbEvent {
    #[default]
    Learned,
    Aged,
    Flushed,
    Moved,
}

impl fmt::Display for FdbEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FdbEvent::Learned => "learned",
            FdbEvent::Aged => "aged",
            FdbEvent::Flushed => "flushed",
            FdbEvent::Moved => "moved",
        };
        f.write_str(s)
    }
}

/// Entry-type filter for bulk flushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushEntryType {
    #[default]
    All,
    Static,
    Dynamic,
}

impl fmt::Display for FlushEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlushEntryType::All => "all",
            FlushEntryType::Static => "static",
            FlushEntryType::Dynamic => "dynamic",
        };
        f.write_str(s)
    }
}

impl FlushEntryType {
    pub fn matches(&self, entry_type: FdbEntryType) -> bool {
        match self {
            FlushEntryType::All => true,
            FlushEntryType::Static => entry_type == FdbEntryType::Static,
            FlushEntryType::Dynamic => entry_type == FdbEntryType::Dynamic,
        }
    }
}

/// A live entry in the FDB store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FdbEntry {
    pub key: FdbKey,
    /// Owning port or LAG.
    pub port: SaiObjectId,
    pub entry_type: FdbEntryType,
    pub action: PacketAction,
    pub metadata: u32,
    /// Set while the hardware programming of this entry is outstanding.
    pub pending: bool,
}

impl FdbEntry {
    /// Creates a dynamic, forwarding entry on `port`.
    pub fn new(key: FdbKey, port: SaiObjectId) -> Self {
        Self {
            key,
            port,
            entry_type: FdbEntryType::Dynamic,
            action: PacketAction::Forward,
            metadata: 0,
            pending: false,
        }
    }

    pub fn with_type(mut self, entry_type: FdbEntryType) -> Self {
        self.entry_type = entry_type;
        self
    }

    pub fn with_action(mut self, action: PacketAction) -> Self {
        self.action = action;
        self
    }

    pub fn with_metadata(mut self, metadata: u32) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn is_static(&self) -> bool {
        self.entry_type == FdbEntryType::Static
    }

    /// Applies one attribute. Returns true if the owning port changed.
    pub(crate) fn apply(&mut self, attr: &FdbAttribute) -> bool {
        match *attr {
            FdbAttribute::PortId(port) => {
                let moved = self.port != port;
                self.port = port;
                moved
            }
            FdbAttribute::Type(entry_type) => {
                self.entry_type = entry_type;
                false
            }
            FdbAttribute::PacketAction(action) => {
                self.action = action;
                false
            }
            FdbAttribute::MetaData(metadata) => {
                self.metadata = metadata;
                false
            }
        }
    }
}

/// `sai_fdb_entry_attr_t` ids.
pub mod attr_id {
    pub const TYPE: u32 = 0;
    pub const PORT_ID: u32 = 1;
    pub const PACKET_ACTION: u32 = 2;
    pub const META_DATA: u32 = 3;
}

/// Untyped attribute value as it crosses the SAI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaiAttributeValue {
    Oid(SaiObjectId),
    S32(i32),
    U32(u32),
}

/// Raw `sai_attribute_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaiAttribute {
    pub id: u32,
    pub value: SaiAttributeValue,
}

impl SaiAttribute {
    pub fn new(id: u32, value: SaiAttributeValue) -> Self {
        Self { id, value }
    }
}

/// A decoded FDB entry attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FdbAttribute {
    Type(FdbEntryType),
    PortId(SaiObjectId),
    PacketAction(PacketAction),
    MetaData(u32),
}

impl FdbAttribute {
    pub fn id(&self) -> u32 {
        match self {
            FdbAttribute::Type(_) => attr_id::TYPE,
            FdbAttribute::PortId(_) => attr_id::PORT_ID,
            FdbAttribute::PacketAction(_) => attr_id::PACKET_ACTION,
            FdbAttribute::MetaData(_) => attr_id::META_DATA,
        }
    }
}

impl TryFrom<&SaiAttribute> for FdbAttribute {
    type Error = SaiError;

    /// Decodes a raw attribute. Errors carry attribute index 0.
    fn try_from(attr: &SaiAttribute) -> Result<Self, Self::Error> {
        let mismatch = || {
            SaiError::invalid_attr_value(
                0,
                format!("attribute {} has value of the wrong kind", attr.id),
            )
        };
        match (attr.id, attr.value) {
            (attr_id::TYPE, SaiAttributeValue::S32(v)) => Ok(FdbAttribute::Type(v.try_into()?)),
            (attr_id::PORT_ID, SaiAttributeValue::Oid(oid)) => Ok(FdbAttribute::PortId(oid)),
            (attr_id::PACKET_ACTION, SaiAttributeValue::S32(v)) => {
                Ok(FdbAttribute::PacketAction(v.try_into()?))
            }
            (attr_id::META_DATA, SaiAttributeValue::U32(v)) => Ok(FdbAttribute::MetaData(v)),
            (attr_id::TYPE..=attr_id::META_DATA, _) => Err(mismatch()),
            (id, _) => Err(SaiError::UnknownAttribute {
                index: 0,
                attr_id: id,
            }),
        }
    }
}

/// One delivered change on a watched entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FdbNotification {
    pub key: FdbKey,
    pub port: SaiObjectId,
    pub event: FdbEvent,
}
