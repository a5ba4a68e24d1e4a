//! SAI FDB learning/aging cache.
//!
//! Keeps the forwarding database entries a switch has learned, keyed by
//! (MAC, VLAN), and tells one upper-layer subscriber when a watched entry is
//! learned, moves, ages out or is flushed.
//!
//! # Architecture
//!
//! - [`store`]: live entries in a crit-bit tree ([`radix`]) ordered by VLAN
//!   then MAC, so per-VLAN walks visit a contiguous key range
//! - [`shadow`]: watched keys and the changelist of keys with an undelivered
//!   event; repeated changes before a drain collapse to the latest event
//! - [`cache`]: the [`FdbCache`] context that ties both together under one
//!   lock, validates entries against [`SwitchObjects`], and drains the
//!   changelist to the subscriber in bounded batches
//! - [`flush`]: bulk removal by port, VLAN or both, filtered by entry type
//! - [`pump`]: tokio task that drains the cache as notifications queue up
//! - [`dump`]: debug views of both trees
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sai_common::{MacAddress, SaiObjectId, SaiObjectType, VlanId};
//! use sai_fdb::{FdbCache, FdbCacheConfig, FdbEntry, FdbKey, NotificationRecorder,
//!     SwitchObjectRegistry};
//!
//! let port = SaiObjectId::new(SaiObjectType::Port, 1);
//! let vlan = VlanId::new(10).unwrap();
//! let objects = SwitchObjectRegistry::new();
//! objects.add_port(port);
//! objects.create_vlan(vlan);
//!
//! let cache = FdbCache::new(FdbCacheConfig::default(), Arc::new(objects));
//! let recorder = Arc::new(NotificationRecorder::new());
//! cache.set_notification_handler(recorder.clone());
//!
//! let key = FdbKey::new("00:11:22:33:44:55".parse::<MacAddress>().unwrap(), vlan);
//! cache.register(key).unwrap();
//! cache.insert(FdbEntry::new(key, port)).unwrap();
//! assert_eq!(cache.send_notifications().unwrap(), 1);
//! assert_eq!(recorder.notifications()[0].port, port);
//! ```

pub mod audit;
pub mod cache;
pub mod config;
pub mod dump;
pub mod flush;
pub mod key;
pub mod notify;
pub mod objects;
pub mod pump;
pub mod radix;
pub mod shadow;
pub mod store;
pub mod types;
pub mod validate;

pub use cache::{FdbCache, FdbCacheGuard, FdbCacheStats};
pub use config::{ConfigError, FdbCacheConfig};
pub use dump::{render_entries, render_registered, FdbDumpRow, RegisteredDumpRow};
pub use flush::FlushScope;
pub use key::{FdbKey, FDB_KEY_SIZE};
pub use notify::{FdbNotificationHandler, NotificationRecorder};
pub use objects::{SwitchObjectRegistry, SwitchObjects};
pub use pump::NotificationPump;
pub use radix::InsertOutcome;
pub use shadow::RegisteredEntry;
pub use types::{
    attr_id, FdbAttribute, FdbEntry, FdbEntryType, FdbEvent, FdbNotification, FlushEntryType,
    PacketAction, SaiAttribute, SaiAttributeValue,
};
pub use validate::{validate_attribute, validate_attribute_list, validate_raw_attribute};
