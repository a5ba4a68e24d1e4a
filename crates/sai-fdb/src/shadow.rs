//! Registered-entry shadow tree and change tracking.
//!
//! Each watched (MAC, VLAN) has one [`RegisteredEntry`]. A change on a watched
//! key queues the key on the changelist once; later changes before the next
//! drain only overwrite the recorded event and port. The changelist length
//! is the pending-notification count, and every queued key has its
//! `in_changelist` flag set.

use crate::key::FdbKey;
use crate::radix::{InsertOutcome, RadixTree};
use crate::types::{FdbEvent, FdbNotification};
use log::{error, info, warn};
use sai_common::{SaiError, SaiObjectId, SaiResult};
use serde::Serialize;
use std::collections::{TryReserveError, VecDeque};

/// Watch record for one FDB key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredEntry {
    pub key: FdbKey,
    /// Last known owning port.
    pub port: SaiObjectId,
    /// Most recent event on the key.
    pub event: FdbEvent,
    pub in_changelist: bool,
}

#[derive(Debug, Default)]
pub struct ShadowTable {
    entries: RadixTree<FdbKey, RegisteredEntry>,
    changelist: VecDeque<FdbKey>,
}

impl ShadowTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts watching `key`. Returns false if it was already watched.
    pub fn register(&mut self, key: FdbKey, port: Option<SaiObjectId>) -> bool {
        let record = RegisteredEntry {
            key,
            port: port.unwrap_or(SaiObjectId::NULL),
            event: FdbEvent::Learned,
            in_changelist: false,
        };
        match self.entries.insert(key, record) {
            InsertOutcome::Inserted => true,
            InsertOutcome::AlreadyExists(_) => {
                info!("Duplicate add to the tree {}", key);
                false
            }
        }
    }

    /// Stops watching `key`.
    ///
    /// Fails with ADDR_NOT_FOUND if unwatched and OBJECT_IN_USE while a
    /// notification for it is still queued.
    pub fn unregister(&mut self, key: &FdbKey) -> SaiResult<()> {
        match self.entries.get(key) {
            None => {
                error!("FDB Entry not found {}", key);
                return Err(SaiError::addr_not_found(key.to_string()));
            }
            Some(record) if record.in_changelist => {
                warn!("Warning object is in CL {}", key);
                return Err(SaiError::object_in_use(key.to_string()));
            }
            Some(_) => {}
        }
        self.entries.remove(key);
        Ok(())
    }

    pub fn get(&self, key: &FdbKey) -> Option<&RegisteredEntry> {
        self.entries.get(key)
    }

    pub fn is_registered(&self, key: &FdbKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Records `event` on a watched key.
    ///
    /// No-op for unwatched keys. Returns true when the key was newly queued.
    pub fn mark_changed(&mut self, key: &FdbKey, event: FdbEvent, port: SaiObjectId) -> bool {
        let Some(record) = self.entries.get_mut(key) else {
            return false;
        };
        record.event = event;
        record.port = port;
        if record.in_changelist {
            return false;
        }
        record.in_changelist = true;
        self.changelist.push_back(*key);
        true
    }

    /// Number of queued notifications.
    pub fn pending_count(&self) -> usize {
        self.changelist.len()
    }

    pub fn is_pending(&self) -> bool {
        !self.changelist.is_empty()
    }

    /// Dequeues up to `max` changes in changelist order. A `max` of zero
    /// is treated as one.
    ///
    /// The batch buffer is reserved before anything is dequeued; when that
    /// fails nothing changes and `NoMemory` is returned.
    pub fn take_batch(&mut self, max: usize) -> SaiResult<Vec<FdbNotification>> {
        self.take_batch_with(max, |batch, count| batch.try_reserve_exact(count))
    }

    /// [`take_batch`](Self::take_batch) with the buffer reservation supplied
    /// by the caller.
    pub(crate) fn take_batch_with<R>(
        &mut self,
        max: usize,
        reserve: R,
    ) -> SaiResult<Vec<FdbNotification>>
    where
        R: FnOnce(&mut Vec<FdbNotification>, usize) -> Result<(), TryReserveError>,
    {
        let count = self.changelist.len().min(max.max(1));
        let mut batch = Vec::new();
        reserve(&mut batch, count).map_err(|e| {
            error!("Error- No memory to allocate for walk: {}", e);
            SaiError::no_memory(format!("{} FDB notifications", count))
        })?;

        for key in self.changelist.drain(..count) {
            let Some(record) = self.entries.get_mut(&key) else {
                warn!("Queued FDB key {} has no registration, skipping", key);
                continue;
            };
            record.in_changelist = false;
            info!(
                "FDB Node {} Event:{} port:{}",
                record.key, record.event, record.port
            );
            batch.push(FdbNotification {
                key: record.key,
                port: record.port,
                event: record.event,
            });
        }
        Ok(batch)
    }

    /// Watched entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredEntry> + '_ {
        self.entries.iter().map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queued keys in delivery order.
    pub fn changelist(&self) -> impl Iterator<Item = &FdbKey> + '_ {
        self.changelist.iter()
    }
}
