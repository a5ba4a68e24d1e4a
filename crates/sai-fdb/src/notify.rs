//! Notification subscriber interface.

use crate::types::FdbNotification;
use std::sync::{Mutex, PoisonError};

/// The single upper-layer subscriber of FDB change notifications.
///
/// Called with one batch at a time, never while the cache lock is held, so
/// implementations may call back into the cache.
pub trait FdbNotificationHandler: Send + Sync {
    fn on_fdb_notifications(&self, notifications: &[FdbNotification]);
}

impl<F> FdbNotificationHandler for F
where
    F: Fn(&[FdbNotification]) + Send + Sync,
{
    fn on_fdb_notifications(&self, notifications: &[FdbNotification]) {
        self(notifications)
    }
}

/// Handler that keeps every delivered batch.
#[derive(Debug, Default)]
pub struct NotificationRecorder {
    batches: Mutex<Vec<Vec<FdbNotification>>>,
}

impl NotificationRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches delivered so far, oldest first.
    pub fn batches(&self) -> Vec<Vec<FdbNotification>> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// All delivered notifications, flattened in delivery order.
    pub fn notifications(&self) -> Vec<FdbNotification> {
        self.batches().into_iter().flatten().collect()
    }

    /// Removes and returns everything recorded so far.
    pub fn take(&self) -> Vec<FdbNotification> {
        let mut batches = self.batches.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *batches).into_iter().flatten().collect()
    }
}

impl FdbNotificationHandler for NotificationRecorder {
    fn on_fdb_notifications(&self, notifications: &[FdbNotification]) {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notifications.to_vec());
    }
}
