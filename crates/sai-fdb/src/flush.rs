//! Bulk FDB flushes.
//!
//! A flush walks the store in key order, removes every entry that matches
//! its scope and entry-type filter, and records FLUSHED on each removed
//! entry's watch. Scopes that name a VLAN only visit that VLAN's key range.

use crate::audit::{AuditCategory, AuditRecord};
use crate::audit_log;
use crate::cache::FdbCacheGuard;
use crate::key::FdbKey;
use crate::types::{FdbEntry, FdbEntryType, FdbEvent, FlushEntryType};
use log::debug;
use sai_common::{SaiObjectId, VlanId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which entries a flush considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushScope {
    All,
    Port(SaiObjectId),
    Vlan(VlanId),
    PortVlan(SaiObjectId, VlanId),
}

impl FlushScope {
    fn port(&self) -> Option<SaiObjectId> {
        match *self {
            FlushScope::Port(port) | FlushScope::PortVlan(port, _) => Some(port),
            FlushScope::All | FlushScope::Vlan(_) => None,
        }
    }

    fn vlan(&self) -> Option<VlanId> {
        match *self {
            FlushScope::Vlan(vlan) | FlushScope::PortVlan(_, vlan) => Some(vlan),
            FlushScope::All | FlushScope::Port(_) => None,
        }
    }

    fn matches_port(&self, port: SaiObjectId) -> bool {
        match self.port() {
            Some(p) => p == port,
            None => true,
        }
    }
}

impl fmt::Display for FlushScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlushScope::All => write!(f, "all"),
            FlushScope::Port(port) => write!(f, "port:{}", port),
            FlushScope::Vlan(vlan) => write!(f, "vlan:{}", vlan),
            FlushScope::PortVlan(port, vlan) => write!(f, "port:{} vlan:{}", port, vlan),
        }
    }
}

type Cursor = (FdbKey, SaiObjectId, FdbEntryType);

fn cursor(entry: &FdbEntry) -> Cursor {
    (entry.key, entry.port, entry.entry_type)
}

impl FdbCacheGuard<'_> {
    /// Removes every entry in `scope` whose type passes `filter`. Returns the
    /// number of entries removed.
    pub fn flush(&mut self, scope: FlushScope, filter: FlushEntryType) -> usize {
        let vlan = scope.vlan();
        let mut next = match vlan {
            Some(vlan) => self.tables.store.seek(&FdbKey::vlan_start(vlan)),
            None => self.tables.store.first(),
        }
        .map(cursor);

        let mut removed = 0;
        while let Some((key, port, entry_type)) = next {
            if vlan.is_some_and(|vlan| vlan != key.vlan) {
                break;
            }
            if scope.matches_port(port) && filter.matches(entry_type) {
                self.remove_node(&key, FdbEvent::Flushed);
                removed += 1;
            }
            next = self.tables.store.next_after(&key).map(cursor);
        }

        self.tables.stats.flushes += 1;
        self.tables.stats.entries_flushed += removed as u64;
        debug!("Flushed {} FDB entries, scope {} type {}", removed, scope, filter);
        audit_log!(AuditRecord::new(AuditCategory::ResourceDelete, "FdbCache", "flush")
            .with_object_id(scope.to_string())
            .with_object_type("fdb_entry")
            .with_details(serde_json::json!({
                "entry_type": filter,
                "removed": removed,
            })));
        removed
    }

    pub fn flush_all(&mut self, filter: FlushEntryType) -> usize {
        self.flush(FlushScope::All, filter)
    }

    pub fn flush_port(&mut self, port: SaiObjectId, filter: FlushEntryType) -> usize {
        self.flush(FlushScope::Port(port), filter)
    }

    pub fn flush_vlan(&mut self, vlan: VlanId, filter: FlushEntryType) -> usize {
        self.flush(FlushScope::Vlan(vlan), filter)
    }

    pub fn flush_port_vlan(
        &mut self,
        port: SaiObjectId,
        vlan: VlanId,
        filter: FlushEntryType,
    ) -> usize {
        self.flush(FlushScope::PortVlan(port, vlan), filter)
    }
}
