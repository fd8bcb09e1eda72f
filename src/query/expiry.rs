//! Sliding Cursor Expiration
//!
//! Reclaims idle cursors with a per-cursor self-renewing timer instead of a
//! background sweep: each live cursor owns one pending timer task, so the
//! steady-state cost is proportional to the number of live cursors and no
//! global lock is ever taken over the registry.
//!
//! ## Policy
//! At each check, `idle_timeout` after arming (or the previous check):
//! - if the cursor was touched since the last check, atomically clear the
//!   flag and schedule another check;
//! - otherwise remove it from the registry and close the engine-side
//!   handle.
//!
//! Registration marks the cursor touched, so eviction requires two
//! consecutive idle windows: one check to consume the creation/last-fetch
//! touch, a second to observe a full window with no use.

use super::registry::CursorRegistry;

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Owns one cancellable timer per live cursor.
pub struct ExpirationScheduler {
    registry: Arc<CursorRegistry>,
    idle_timeout: Duration,
    /// Structure: `Cursor ID -> pending timer`.
    timers: Arc<DashMap<String, JoinHandle<()>>>,
}

impl ExpirationScheduler {
    pub fn new(registry: Arc<CursorRegistry>, idle_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            registry,
            idle_timeout,
            timers: Arc::new(DashMap::new()),
        })
    }

    /// Arms (or re-arms) the expiration timer for a cursor id.
    ///
    /// Re-arming is cancel-then-reinsert: any previous timer for the id is
    /// aborted before the new one is spawned.
    pub fn arm(&self, id: &str) {
        if let Some((_, old)) = self.timers.remove(id) {
            old.abort();
        }

        let registry = self.registry.clone();
        let timers = self.timers.clone();
        let idle_timeout = self.idle_timeout;
        let key = id.to_string();
        let task_id = key.clone();

        let handle = tokio::spawn(async move {
            run_checks(&registry, idle_timeout, &task_id).await;
            timers.remove(&task_id);
        });

        self.timers.insert(key, handle);
    }

    /// Cancels the pending timer for a cursor id, if any.
    ///
    /// Used when a cursor is removed explicitly (exhausted or closed by the
    /// client) so no timer fires for a dead id.
    pub fn disarm(&self, id: &str) {
        if let Some((_, handle)) = self.timers.remove(id) {
            handle.abort();
            tracing::trace!("Disarmed expiration timer for cursor {}", id);
        }
    }

    /// Number of pending timers (equals the number of live armed cursors).
    pub fn armed_count(&self) -> usize {
        self.timers.len()
    }
}

/// The check loop for one cursor. Each iteration is one scheduled
/// expiration check; continuing the loop is the "reschedule".
async fn run_checks(registry: &CursorRegistry, idle_timeout: Duration, id: &str) {
    loop {
        tokio::time::sleep(idle_timeout).await;

        let Some(state) = registry.get(id) else {
            // Cursor already removed through another path.
            break;
        };

        if state.clear_touched() {
            tracing::trace!("Cursor {} touched since last check, rescheduling", id);
            continue;
        }

        // Two consecutive idle windows: evict and release the engine side
        // of the cursor.
        if let Some(state) = registry.remove(id) {
            state.lock_slot().await.close().await;
            tracing::info!("Evicted idle cursor {}", id);
        }

        break;
    }
}
