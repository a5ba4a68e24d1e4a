//! The FDB cache context object.
//!
//! [`FdbCache`] owns the entry store, the shadow table and the changelist
//! behind one mutex. [`FdbCache::lock`] hands out an [`FdbCacheGuard`]; every
//! call on the guard runs in the same critical section and the lock is
//! released when the guard drops. The single-shot methods on `FdbCache` lock
//! internally.
//!
//! Notifications are drained by [`FdbCache::send_notifications`], which moves
//! bounded batches out under the lock and calls the subscriber after
//! releasing it. Drains are serialized, so batches reach the subscriber in
//! changelist order even with several drainers.

use crate::audit::{AuditCategory, AuditRecord};
use crate::audit_log;
use crate::config::{ConfigError, FdbCacheConfig};
use crate::flush::FlushScope;
use crate::key::FdbKey;
use crate::notify::FdbNotificationHandler;
use crate::objects::SwitchObjects;
use crate::radix::InsertOutcome;
use crate::shadow::{RegisteredEntry, ShadowTable};
use crate::store::FdbStore;
use crate::types::{attr_id, FdbAttribute, FdbEntry, FdbEvent, FlushEntryType, SaiAttribute};
use crate::validate::{validate_attribute, validate_attribute_list};
use log::{debug, error, trace, warn};
use sai_common::{SaiError, SaiObjectId, SaiResult, SaiStatus};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::sync::Notify;

/// Counters kept by the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FdbCacheStats {
    pub entries_added: u64,
    pub entries_removed: u64,
    pub entries_updated: u64,
    pub flushes: u64,
    pub entries_flushed: u64,
    pub notifications_queued: u64,
    pub notifications_delivered: u64,
    pub drains: u64,
}

#[derive(Debug, Default)]
pub(crate) struct FdbTables {
    pub(crate) store: FdbStore,
    pub(crate) shadow: ShadowTable,
    pub(crate) stats: FdbCacheStats,
}

pub struct FdbCache {
    config: FdbCacheConfig,
    objects: Arc<dyn SwitchObjects>,
    tables: Mutex<FdbTables>,
    handler: RwLock<Option<Arc<dyn FdbNotificationHandler>>>,
    /// Held for a whole drain, never together with `tables` across a callback.
    drain: Mutex<()>,
    queued: Arc<Notify>,
}

impl std::fmt::Debug for FdbCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FdbCache")
            .field("config", &self.config)
            .field("has_handler", &self.has_notification_handler())
            .finish_non_exhaustive()
    }
}

impl FdbCache {
    /// Creates a cache without checking `config`.
    ///
    /// A zero `notification_batch_size` is treated as one. Use
    /// [`FdbCache::try_new`] to reject invalid configurations instead.
    pub fn new(config: FdbCacheConfig, objects: Arc<dyn SwitchObjects>) -> Self {
        Self {
            config,
            objects,
            tables: Mutex::new(FdbTables::default()),
            handler: RwLock::new(None),
            drain: Mutex::new(()),
            queued: Arc::new(Notify::new()),
        }
    }

    /// Creates a cache after validating `config`.
    pub fn try_new(
        config: FdbCacheConfig,
        objects: Arc<dyn SwitchObjects>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config, objects))
    }

    pub fn config(&self) -> &FdbCacheConfig {
        &self.config
    }

    pub fn objects(&self) -> &dyn SwitchObjects {
        self.objects.as_ref()
    }

    /// Takes the cache lock.
    pub fn lock(&self) -> FdbCacheGuard<'_> {
        FdbCacheGuard {
            cache: self,
            tables: self.lock_tables(),
            queued: false,
        }
    }

    fn lock_tables(&self) -> MutexGuard<'_, FdbTables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Installs the subscriber, replacing any previous one.
    pub fn set_notification_handler(&self, handler: Arc<dyn FdbNotificationHandler>) {
        let replaced = self
            .handler
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handler)
            .is_some();
        audit_log!(AuditRecord::new(
            AuditCategory::ConfigurationChange,
            "FdbCache",
            "set_notification_handler"
        )
        .with_object_type("fdb_notification_handler")
        .with_details(serde_json::json!({ "replaced": replaced })));
    }

    /// Removes the subscriber. Events keep accumulating until one is installed.
    pub fn clear_notification_handler(&self) {
        let removed = self
            .handler
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();
        audit_log!(AuditRecord::new(
            AuditCategory::ConfigurationChange,
            "FdbCache",
            "clear_notification_handler"
        )
        .with_object_type("fdb_notification_handler")
        .with_details(serde_json::json!({ "removed": removed })));
    }

    pub fn has_notification_handler(&self) -> bool {
        self.handler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn notification_handler(&self) -> Option<Arc<dyn FdbNotificationHandler>> {
        self.handler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Delivers every queued notification in batches of at most
    /// `notification_batch_size`, returning how many were delivered.
    ///
    /// Without a subscriber this is a no-op. Each batch is taken under the
    /// lock and handed to the subscriber after the lock is released. If a
    /// batch buffer cannot be allocated the drain stops with `NoMemory` and
    /// the undelivered events stay queued.
    ///
    /// Concurrent callers wait for the running drain to finish. The
    /// subscriber must not call back into `send_notifications`.
    pub fn send_notifications(&self) -> SaiResult<usize> {
        let Some(handler) = self.notification_handler() else {
            return Ok(0);
        };
        let _drain = self.drain.lock().unwrap_or_else(PoisonError::into_inner);

        let mut delivered = 0;
        loop {
            let batch = {
                let mut tables = self.lock_tables();
                if !tables.shadow.is_pending() {
                    break;
                }
                let before = tables.shadow.pending_count();
                let batch = tables.shadow.take_batch(self.config.notification_batch_size)?;
                if tables.shadow.pending_count() == before {
                    warn!("FDB changelist did not advance, stopping drain");
                    break;
                }
                tables.stats.drains += 1;
                tables.stats.notifications_delivered += batch.len() as u64;
                batch
            };
            // Only registrations dropped under us; the changelist still moved.
            if batch.is_empty() {
                continue;
            }
            handler.on_fdb_notifications(&batch);
            delivered += batch.len();
        }

        if delivered > 0 {
            debug!("Delivered {} FDB notifications", delivered);
        }
        Ok(delivered)
    }

    pub fn is_pending(&self) -> bool {
        self.lock_tables().shadow.is_pending()
    }

    pub fn pending_count(&self) -> usize {
        self.lock_tables().shadow.pending_count()
    }

    /// Signalled whenever a notification is newly queued.
    pub fn queued_signal(&self) -> Arc<Notify> {
        Arc::clone(&self.queued)
    }

    pub fn len(&self) -> usize {
        self.lock_tables().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> FdbCacheStats {
        self.lock_tables().stats.clone()
    }

    pub fn lookup(&self, key: &FdbKey) -> Option<FdbEntry> {
        self.lock().lookup(key).cloned()
    }

    pub fn get_port(&self, key: &FdbKey) -> SaiResult<SaiObjectId> {
        self.lock().get_port(key)
    }

    /// Inserts a new entry. Returns false if the key was already present, in
    /// which case nothing changed.
    pub fn insert(&self, entry: FdbEntry) -> SaiResult<bool> {
        Ok(self.lock().insert(entry)?.is_inserted())
    }

    pub fn insert_or_update(&self, entry: FdbEntry) -> SaiResult<()> {
        self.lock().insert_or_update(entry)
    }

    /// Creates an entry from a raw SAI attribute list.
    ///
    /// The port attribute is mandatory. An existing key fails with
    /// ITEM_ALREADY_EXISTS.
    pub fn create_entry(&self, key: FdbKey, attrs: &[SaiAttribute]) -> SaiResult<()> {
        let attrs = validate_attribute_list(attrs, self.objects())?;
        let port = attrs
            .iter()
            .find_map(|attr| match attr {
                FdbAttribute::PortId(port) => Some(*port),
                _ => None,
            })
            .ok_or_else(|| {
                error!("Mandatory attribute {} missing for {}", attr_id::PORT_ID, key);
                SaiError::from_status(SaiStatus::MandatoryAttributeMissing)
            })?;

        let mut entry = FdbEntry::new(key, port);
        for attr in &attrs {
            entry.apply(attr);
        }

        if self.lock().insert(entry)?.is_inserted() {
            Ok(())
        } else {
            Err(SaiError::AlreadyExists {
                item: key.to_string(),
            })
        }
    }

    pub fn update_attribute(&self, key: &FdbKey, attr: FdbAttribute) -> SaiResult<()> {
        self.lock().update_attribute(key, attr)
    }

    /// Removes an entry, recording FLUSHED on its watch.
    pub fn remove(&self, key: &FdbKey) -> SaiResult<FdbEntry> {
        self.lock().remove(key, FdbEvent::Flushed)
    }

    /// Removes an entry that aged out in hardware, recording AGED on its watch.
    pub fn age_out(&self, key: &FdbKey) -> SaiResult<FdbEntry> {
        self.lock().remove(key, FdbEvent::Aged)
    }

    pub fn set_pending(&self, key: &FdbKey, pending: bool) -> SaiResult<()> {
        self.lock().set_pending(key, pending)
    }

    pub fn register(&self, key: FdbKey) -> SaiResult<()> {
        self.lock().register(key)
    }

    pub fn unregister(&self, key: &FdbKey) -> SaiResult<()> {
        self.lock().unregister(key)
    }

    pub fn flush(&self, scope: FlushScope, filter: FlushEntryType) -> usize {
        self.lock().flush(scope, filter)
    }
}

/// Exclusive access to the cache tables for one critical section.
pub struct FdbCacheGuard<'a> {
    pub(crate) cache: &'a FdbCache,
    pub(crate) tables: MutexGuard<'a, FdbTables>,
    queued: bool,
}

impl Drop for FdbCacheGuard<'_> {
    fn drop(&mut self) {
        if self.queued {
            self.cache.queued.notify_one();
        }
    }
}

impl<'a> FdbCacheGuard<'a> {
    pub fn len(&self) -> usize {
        self.tables.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.store.is_empty()
    }

    pub fn contains(&self, key: &FdbKey) -> bool {
        self.tables.store.contains(key)
    }

    pub fn lookup(&self, key: &FdbKey) -> Option<&FdbEntry> {
        self.tables.store.lookup(key)
    }

    /// Owning port of a cached entry; ADDR_NOT_FOUND if absent.
    pub fn get_port(&self, key: &FdbKey) -> SaiResult<SaiObjectId> {
        self.lookup(key)
            .map(|entry| entry.port)
            .ok_or_else(|| SaiError::addr_not_found(key.to_string()))
    }

    /// Live entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = &FdbEntry> + '_ {
        self.tables.store.iter()
    }

    /// Watched keys in key order.
    pub fn registered(&self) -> impl Iterator<Item = &RegisteredEntry> + '_ {
        self.tables.shadow.iter()
    }

    pub fn stats(&self) -> &FdbCacheStats {
        &self.tables.stats
    }

    pub fn is_pending(&self) -> bool {
        self.tables.shadow.is_pending()
    }

    pub fn pending_count(&self) -> usize {
        self.tables.shadow.pending_count()
    }

    /// Inserts a new entry.
    ///
    /// An existing key yields [`InsertOutcome::AlreadyExists`] with the stored
    /// entry untouched and nothing queued.
    pub fn insert(&mut self, entry: FdbEntry) -> SaiResult<InsertOutcome<'_, FdbEntry>> {
        self.check_entry(&entry)?;
        let key = entry.key;
        if self.tables.store.contains(&key) {
            trace!("FDB Node already present. {}", key);
            return Ok(self.tables.store.insert(entry));
        }

        let port = entry.port;
        self.tables.store.insert(entry);
        self.tables.stats.entries_added += 1;
        self.notify_change(&key, FdbEvent::Learned, port);
        trace!("Added FDB Node {}", key);
        Ok(InsertOutcome::Inserted)
    }

    /// Hardware learn path: inserts, or overwrites the attributes of an
    /// existing entry. Watchers hear LEARNED for new entries and port moves.
    pub fn insert_or_update(&mut self, entry: FdbEntry) -> SaiResult<()> {
        self.check_entry(&entry)?;
        let key = entry.key;
        let port = entry.port;

        let moved = match self.tables.store.lookup_mut(&key) {
            Some(existing) => {
                trace!("FDB Node already present. {}", key);
                let moved = existing.port != port;
                existing.port = port;
                existing.entry_type = entry.entry_type;
                existing.action = entry.action;
                existing.metadata = entry.metadata;
                Some(moved)
            }
            None => None,
        };

        match moved {
            Some(false) => self.tables.stats.entries_updated += 1,
            Some(true) => {
                self.tables.stats.entries_updated += 1;
                self.notify_change(&key, FdbEvent::Learned, port);
            }
            None => {
                self.tables.store.insert(entry);
                self.tables.stats.entries_added += 1;
                self.notify_change(&key, FdbEvent::Learned, port);
            }
        }
        trace!("Added FDB Node {}", key);
        Ok(())
    }

    /// Sets one attribute on an existing entry. Only a port change notifies.
    pub fn update_attribute(&mut self, key: &FdbKey, attr: FdbAttribute) -> SaiResult<()> {
        validate_attribute(&attr, self.cache.objects())?;
        let Some(entry) = self.tables.store.lookup_mut(key) else {
            error!("FDB Entry not found {}", key);
            return Err(SaiError::addr_not_found(key.to_string()));
        };
        let moved = entry.apply(&attr);
        let port = entry.port;

        self.tables.stats.entries_updated += 1;
        if moved {
            self.notify_change(key, FdbEvent::Learned, port);
        }
        Ok(())
    }

    /// Removes an entry and records `event` on its watch.
    pub fn remove(&mut self, key: &FdbKey, event: FdbEvent) -> SaiResult<FdbEntry> {
        self.remove_node(key, event).ok_or_else(|| {
            error!("FDB Entry not found {}", key);
            SaiError::addr_not_found(key.to_string())
        })
    }

    pub fn set_pending(&mut self, key: &FdbKey, pending: bool) -> SaiResult<()> {
        let entry = self
            .tables
            .store
            .lookup_mut(key)
            .ok_or_else(|| SaiError::addr_not_found(key.to_string()))?;
        entry.pending = pending;
        Ok(())
    }

    /// Starts watching `key`; the watch takes the live entry's port if any.
    /// Registering a watched key again is a no-op.
    pub fn register(&mut self, key: FdbKey) -> SaiResult<()> {
        let port = self.tables.store.lookup(&key).map(|entry| entry.port);
        if self.tables.shadow.register(key, port) {
            trace!("Registered FDB watch {}", key);
            audit_log!(AuditRecord::new(AuditCategory::ResourceCreate, "FdbCache", "register")
                .with_object_id(key.to_string())
                .with_object_type("fdb_registered_entry"));
        }
        Ok(())
    }

    /// Stops watching `key`. Fails with OBJECT_IN_USE while a notification
    /// for it is queued.
    pub fn unregister(&mut self, key: &FdbKey) -> SaiResult<()> {
        self.tables.shadow.unregister(key)?;
        audit_log!(AuditRecord::new(AuditCategory::ResourceDelete, "FdbCache", "unregister")
            .with_object_id(key.to_string())
            .with_object_type("fdb_registered_entry"));
        Ok(())
    }

    /// The single removal path shared by delete, age-out and flush.
    pub(crate) fn remove_node(&mut self, key: &FdbKey, event: FdbEvent) -> Option<FdbEntry> {
        let entry = self.tables.store.remove(key)?;
        self.tables.stats.entries_removed += 1;
        self.notify_change(key, event, entry.port);
        Some(entry)
    }

    fn notify_change(&mut self, key: &FdbKey, event: FdbEvent, port: SaiObjectId) {
        if self.tables.shadow.mark_changed(key, event, port) {
            self.tables.stats.notifications_queued += 1;
            self.queued = true;
        }
    }

    fn check_entry(&self, entry: &FdbEntry) -> SaiResult<()> {
        let objects = self.cache.objects();
        validate_attribute(&FdbAttribute::PortId(entry.port), objects)?;
        validate_attribute(&FdbAttribute::PacketAction(entry.action), objects)?;
        if self.cache.config.validate_vlan_membership && !objects.is_vlan_created(entry.key.vlan) {
            error!("VLAN {} not created for {}", entry.key.vlan, entry.key);
            return Err(SaiError::from_status(SaiStatus::InvalidVlanId));
        }
        Ok(())
    }
}
