//! Background notification delivery.
//!
//! The pump is a tokio task that drains the cache whenever a notification is
//! queued, and on a fixed interval as a fallback. It stops when its
//! cancellation token fires.

use crate::audit::{AuditCategory, AuditRecord};
use crate::audit_log;
use crate::cache::FdbCache;
use log::{debug, error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub struct NotificationPump {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl NotificationPump {
    /// Spawns the pump on the current tokio runtime.
    pub fn spawn(cache: Arc<FdbCache>) -> Self {
        Self::spawn_with_token(cache, CancellationToken::new())
    }

    /// Spawns the pump, stopping when `token` (or a parent of it) is cancelled.
    pub fn spawn_with_token(cache: Arc<FdbCache>, token: CancellationToken) -> Self {
        let handle = tokio::spawn(run(cache, token.clone()));
        Self { token, handle }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Stops the pump and waits for the task to finish.
    ///
    /// Notifications still queued at this point stay queued.
    pub async fn shutdown(self) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            error!("FDB notification pump task failed: {}", e);
        }
    }
}

async fn run(cache: Arc<FdbCache>, token: CancellationToken) {
    let signal = cache.queued_signal();
    // tokio rejects a zero period
    let period = cache.config().pump_interval().max(Duration::from_millis(1));
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!("FDB notification pump started, interval {:?}", period);

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                info!("FDB notification pump stopping");
                break;
            }
            _ = signal.notified() => {}
            _ = ticker.tick() => {}
        }

        if !cache.is_pending() {
            continue;
        }
        match cache.send_notifications() {
            Ok(count) => debug!("FDB notification pump delivered {}", count),
            Err(e) => {
                error!("FDB notification drain failed: {}", e);
                audit_log!(AuditRecord::new(
                    AuditCategory::NotificationDelivery,
                    "NotificationPump",
                    "drain"
                )
                .with_details(serde_json::json!({ "pending": cache.pending_count() }))
                .with_error(e.to_string()));
            }
        }
    }
}
