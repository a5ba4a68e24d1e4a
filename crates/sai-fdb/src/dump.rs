//! Debug dumps of the entry store and the shadow table.
//!
//! Dumps are collected under the cache lock into serializable rows; the
//! `render_*` helpers turn them into fixed-width text tables.

use crate::cache::FdbCacheGuard;
use crate::key::FdbKey;
use crate::shadow::RegisteredEntry;
use crate::types::{FdbEntry, FdbEntryType, FdbEvent, PacketAction};
use log::warn;
use sai_common::{MacAddress, SaiObjectId, VlanId};
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FdbDumpRow {
    pub mac: MacAddress,
    pub vlan: VlanId,
    pub port: SaiObjectId,
    pub entry_type: FdbEntryType,
    pub action: PacketAction,
    pub pending: bool,
}

impl From<&FdbEntry> for FdbDumpRow {
    fn from(entry: &FdbEntry) -> Self {
        Self {
            mac: entry.key.mac,
            vlan: entry.key.vlan,
            port: entry.port,
            entry_type: entry.entry_type,
            action: entry.action,
            pending: entry.pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredDumpRow {
    pub mac: MacAddress,
    pub vlan: VlanId,
    pub port: SaiObjectId,
    pub in_changelist: bool,
    pub event: FdbEvent,
}

impl From<&RegisteredEntry> for RegisteredDumpRow {
    fn from(record: &RegisteredEntry) -> Self {
        Self {
            mac: record.key.mac,
            vlan: record.key.vlan,
            port: record.port,
            in_changelist: record.in_changelist,
            event: record.event,
        }
    }
}

impl FdbCacheGuard<'_> {
    pub fn dump_all(&self) -> Vec<FdbDumpRow> {
        self.tables.store.iter().map(FdbDumpRow::from).collect()
    }

    /// Number of entries found by a full walk of the store.
    pub fn entry_count(&self) -> usize {
        self.tables.store.iter().count()
    }

    pub fn dump_port(&self, port: SaiObjectId) -> Vec<FdbDumpRow> {
        self.tables
            .store
            .iter()
            .filter(|entry| entry.port == port)
            .map(FdbDumpRow::from)
            .collect()
    }

    pub fn dump_vlan(&self, vlan: VlanId) -> Vec<FdbDumpRow> {
        self.tables
            .store
            .vlan_entries(vlan)
            .map(FdbDumpRow::from)
            .collect()
    }

    pub fn dump_port_vlan(&self, port: SaiObjectId, vlan: VlanId) -> Vec<FdbDumpRow> {
        self.tables
            .store
            .vlan_entries(vlan)
            .filter(|entry| entry.port == port)
            .map(FdbDumpRow::from)
            .collect()
    }

    /// All watched keys in key order.
    pub fn dump_registered(&self) -> Vec<RegisteredDumpRow> {
        self.tables
            .shadow
            .iter()
            .map(RegisteredDumpRow::from)
            .collect()
    }

    /// Queued watches in delivery order.
    pub fn dump_pending(&self) -> Vec<RegisteredDumpRow> {
        self.tables
            .shadow
            .changelist()
            .filter_map(|key: &FdbKey| match self.tables.shadow.get(key) {
                Some(record) => Some(RegisteredDumpRow::from(record)),
                None => {
                    warn!("Changelist key {} has no registration", key);
                    None
                }
            })
            .collect()
    }
}

const RULE_WIDTH: usize = 80;

/// Renders entry rows as a text table.
pub fn render_entries(rows: &[FdbDumpRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<20} {:<5} {:<20} {:<8} {:<8} {:<7}",
        "MAC", "VLAN", "Port", "Type", "Action", "Pending"
    );
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
    for row in rows {
        let _ = writeln!(
            out,
            "{:<20} {:<5} {:<20} {:<8} {:<8} {:<7}",
            row.mac.to_string(),
            row.vlan.as_u16(),
            row.port.to_string(),
            row.entry_type.to_string(),
            row.action.to_string(),
            row.pending
        );
    }
    let _ = writeln!(out, "Total entries: {}", rows.len());
    out
}

/// Renders watch rows as a text table.
pub fn render_registered(rows: &[RegisteredDumpRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<20} {:<5} {:<20} {:<5} {:<8}",
        "MAC", "VLAN", "Port", "InCL", "Event"
    );
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
    for row in rows {
        let _ = writeln!(
            out,
            "{:<20} {:<5} {:<20} {:<5} {:<8}",
            row.mac.to_string(),
            row.vlan.as_u16(),
            row.port.to_string(),
            row.in_changelist,
            row.event.to_string()
        );
    }
    let _ = writeln!(out, "Total registered: {}", rows.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FdbCache;
    use crate::config::FdbCacheConfig;
    use crate::objects::SwitchObjectRegistry;
    use pretty_assertions::assert_eq;
    use sai_common::SaiObjectType;
    use std::sync::Arc;

    fn port(index: u64) -> SaiObjectId {
        SaiObjectId::new(SaiObjectType::Port, index)
    }

    fn vlan(id: u16) -> VlanId {
        VlanId::new(id).unwrap()
    }

    fn key(last: u8, v: u16) -> FdbKey {
        FdbKey::new(MacAddress::new([0x02, 0, 0, 0, 0, last]), vlan(v))
    }

    fn cache() -> FdbCache {
        let objects = SwitchObjectRegistry::new();
        objects.add_port(port(1));
        objects.add_port(port(2));
        objects.create_vlan(vlan(10));
        objects.create_vlan(vlan(20));
        let cache = FdbCache::new(FdbCacheConfig::default(), Arc::new(objects));
        cache.insert(FdbEntry::new(key(1, 10), port(1))).unwrap();
        cache.insert(FdbEntry::new(key(2, 10), port(2))).unwrap();
        cache
            .insert(FdbEntry::new(key(1, 20), port(1)).with_type(FdbEntryType::Static))
            .unwrap();
        cache
    }

    #[test]
    fn test_dump_filters() {
        let cache = cache();
        let guard = cache.lock();
        assert_eq!(guard.entry_count(), 3);
        assert_eq!(guard.dump_all().len(), 3);
        assert_eq!(guard.dump_port(port(1)).len(), 2);
        assert_eq!(guard.dump_vlan(vlan(10)).len(), 2);

        let rows = guard.dump_port_vlan(port(1), vlan(20));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].entry_type, FdbEntryType::Static);
    }

    #[test]
    fn test_dump_pending_in_delivery_order() {
        let cache = cache();
        cache.register(key(2, 10)).unwrap();
        cache.register(key(1, 10)).unwrap();
        cache.remove(&key(2, 10)).unwrap();
        cache.age_out(&key(1, 10)).unwrap();

        let guard = cache.lock();
        let pending = guard.dump_pending();
        let events: Vec<FdbEvent> = pending.iter().map(|row| row.event).collect();
        assert_eq!(events, vec![FdbEvent::Flushed, FdbEvent::Aged]);
        assert!(pending.iter().all(|row| row.in_changelist));
        assert_eq!(guard.dump_registered().len(), 2);
    }

    #[test]
    fn test_render_entries() {
        let cache = cache();
        let text = render_entries(&cache.lock().dump_vlan(vlan(20)));
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("MAC"));
        assert!(lines[2].starts_with("02:00:00:00:00:01"));
        assert!(lines[2].contains("static"));
        assert_eq!(lines[3], "Total entries: 1");
    }

    #[test]
    fn test_render_registered_empty() {
        let text = render_registered(&[]);
        assert!(text.contains("InCL"));
        assert!(text.ends_with("Total registered: 0\n"));
    }

    #[test]
    fn test_dump_rows_serialize() {
        let cache = cache();
        let rows = cache.lock().dump_vlan(vlan(20));
        let json = serde_json::to_value(&rows).unwrap();
        assert_eq!(json[0]["mac"], "02:00:00:00:00:01");
        assert_eq!(json[0]["vlan"], 20);
        assert_eq!(json[0]["entry_type"], "static");
    }
}
