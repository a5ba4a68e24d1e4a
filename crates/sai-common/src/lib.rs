//! Common types shared by the SAI adapter modules.
//!
//! This crate holds the small vocabulary every adapter module speaks:
//!
//! - [`error`]: SAI status codes and the [`SaiError`] type returned by adapter
//!   operations
//! - [`oid`]: SAI object ids with the object type packed into the id, and the
//!   classification helpers used by attribute validation
//! - [`MacAddress`]: 48-bit Ethernet MAC addresses
//! - [`VlanId`]: IEEE 802.1Q VLAN identifiers
//!
//! # Example
//!
//! ```
//! use sai_common::{is_lag_object, MacAddress, SaiObjectId, SaiObjectType, VlanId};
//!
//! let lag = SaiObjectId::new(SaiObjectType::Lag, 7);
//! assert!(is_lag_object(lag));
//!
//! let mac: MacAddress = "aa:bb:cc:dd:ee:ff".parse().unwrap();
//! let vlan = VlanId::new(10).unwrap();
//! assert_eq!(format!("{} vlan {}", mac, vlan), "aa:bb:cc:dd:ee:ff vlan 10");
//! ```

pub mod error;
pub mod oid;

mod mac;
mod vlan;

pub use error::{SaiError, SaiResult, SaiStatus};
pub use mac::MacAddress;
pub use oid::{is_lag_object, is_port_object, RawSaiObjectId, SaiObjectId, SaiObjectType};
pub use vlan::{is_valid_vlan_id, VlanId};

/// Error returned when a textual MAC address or VLAN id cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid VLAN ID: {0} (must be 1-4094)")]
    InvalidVlanId(u16),

    #[error("invalid VLAN name: {0}")]
    InvalidVlanName(String),
}
