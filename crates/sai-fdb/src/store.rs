//! Live FDB entries indexed by [`FdbKey`].

use crate::key::FdbKey;
use crate::radix::{InsertOutcome, RadixTree};
use crate::types::FdbEntry;
use sai_common::VlanId;

/// Prefix-tree store holding exactly one entry per (MAC, VLAN).
#[derive(Debug, Default)]
pub struct FdbStore {
    tree: RadixTree<FdbKey, FdbEntry>,
}

impl FdbStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn contains(&self, key: &FdbKey) -> bool {
        self.tree.contains_key(key)
    }

    pub fn lookup(&self, key: &FdbKey) -> Option<&FdbEntry> {
        self.tree.get(key)
    }

    pub fn lookup_mut(&mut self, key: &FdbKey) -> Option<&mut FdbEntry> {
        self.tree.get_mut(key)
    }

    /// Stores `entry` under its own key unless that key is taken.
    pub fn insert(&mut self, entry: FdbEntry) -> InsertOutcome<'_, FdbEntry> {
        self.tree.insert(entry.key, entry)
    }

    pub fn remove(&mut self, key: &FdbKey) -> Option<FdbEntry> {
        self.tree.remove(key)
    }

    pub fn first(&self) -> Option<&FdbEntry> {
        self.tree.first().map(|(_, entry)| entry)
    }

    /// First entry with a key `>= key`.
    pub fn seek(&self, key: &FdbKey) -> Option<&FdbEntry> {
        self.tree.seek(key).map(|(_, entry)| entry)
    }

    /// First entry with a key strictly greater than `key`.
    pub fn next_after(&self, key: &FdbKey) -> Option<&FdbEntry> {
        self.tree.next_after(key).map(|(_, entry)| entry)
    }

    /// All entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = &FdbEntry> + '_ {
        self.tree.iter().map(|(_, entry)| entry)
    }

    /// Entries of one VLAN in MAC order, visiting only that VLAN's key range.
    pub fn vlan_entries(&self, vlan: VlanId) -> impl Iterator<Item = &FdbEntry> + '_ {
        let mut next = self.seek(&FdbKey::vlan_start(vlan));
        std::iter::from_fn(move || {
            let entry = next.filter(|e| e.key.vlan == vlan)?;
            next = self.next_after(&entry.key);
            Some(entry)
        })
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sai_common::{MacAddress, SaiObjectId, SaiObjectType};

    fn entry(last: u8, vlan: u16) -> FdbEntry {
        let key = FdbKey::new(
            MacAddress::new([0, 0, 0, 0, 0, last]),
            VlanId::new(vlan).unwrap(),
        );
        FdbEntry::new(key, SaiObjectId::new(SaiObjectType::Port, 1))
    }

    #[test]
    fn test_insert_lookup_round_trip() {
        let mut store = FdbStore::new();
        let e = entry(1, 10);
        assert!(store.insert(e.clone()).is_inserted());
        assert_eq!(store.lookup(&e.key), Some(&e));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_second_insert_keeps_original() {
        let mut store = FdbStore::new();
        let original = entry(1, 10);
        store.insert(original.clone());

        let mut other = original.clone();
        other.metadata = 99;
        assert_eq!(store.insert(other), InsertOutcome::AlreadyExists(&original));
        assert_eq!(store.lookup(&original.key).map(|e| e.metadata), Some(0));
    }

    #[test]
    fn test_vlan_entries_stay_in_range() {
        let mut store = FdbStore::new();
        for (last, vlan) in [(1, 10), (2, 20), (3, 20), (0, 20), (4, 30)] {
            store.insert(entry(last, vlan));
        }

        let macs: Vec<u8> = store
            .vlan_entries(VlanId::new(20).unwrap())
            .map(|e| e.key.mac.octets()[5])
            .collect();
        assert_eq!(macs, vec![0, 2, 3]);
        assert_eq!(store.vlan_entries(VlanId::new(40).unwrap()).count(), 0);
    }

    #[test]
    fn test_iteration_is_key_ordered() {
        let mut store = FdbStore::new();
        for (last, vlan) in [(9, 30), (1, 10), (5, 20)] {
            store.insert(entry(last, vlan));
        }
        let vlans: Vec<u16> = store.iter().map(|e| e.key.vlan.as_u16()).collect();
        assert_eq!(vlans, vec![10, 20, 30]);
        assert_eq!(store.first().map(|e| e.key.vlan.as_u16()), Some(10));
    }
}
