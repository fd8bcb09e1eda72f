//! Cursor Registry
//!
//! Node-local mapping from cursor id to the state of an open query cursor:
//! the engine-side handle, the buffered lookahead row and the `touched`
//! flag the sliding expiration keys off.
//!
//! ## Concurrency
//! Three actors hit this map: the query job that registers a cursor, the
//! page-fetch path that reads rows and marks the cursor touched, and the
//! expiration scheduler that reads-and-clears the flag or removes the
//! entry. `touched` is an `AtomicBool` and the expiration check clears it
//! with `swap`, so a concurrent touch is either observed by that check or
//! by the next one, never lost between a read and a clear. The handle and
//! lookahead sit behind an async mutex so a page fetch never holds a map
//! guard across an await.

use super::engine::CursorHandle;
use super::types::{ColumnMeta, QueryKind, Row};
use crate::grid::types::now_ms;

use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// The mutable part of a cursor: the engine handle plus the lookahead row
/// buffered between page fetches.
pub struct CursorSlot {
    pub handle: Box<dyn CursorHandle>,
    pub lookahead: Option<Row>,
}

impl CursorSlot {
    /// Closes the engine-side handle and drops the lookahead.
    pub async fn close(&mut self) {
        self.lookahead = None;
        self.handle.close().await;
    }
}

/// State of one open cursor.
pub struct CursorState {
    /// Scan or fields.
    pub kind: QueryKind,
    /// Result schema captured at open time.
    pub columns: Vec<ColumnMeta>,
    /// Timestamp (ms) the cursor was registered.
    pub created_at: u64,
    /// Set by every use of the cursor, cleared by each expiration check.
    touched: AtomicBool,
    slot: Mutex<CursorSlot>,
}

impl CursorState {
    /// Builds a fresh cursor state. Creation counts as the first touch, so
    /// a cursor always survives its first idle window.
    pub fn new(
        kind: QueryKind,
        columns: Vec<ColumnMeta>,
        handle: Box<dyn CursorHandle>,
        lookahead: Option<Row>,
    ) -> Self {
        Self {
            kind,
            columns,
            created_at: now_ms(),
            touched: AtomicBool::new(true),
            slot: Mutex::new(CursorSlot { handle, lookahead }),
        }
    }

    /// Marks the cursor as used within the current idle window.
    pub fn touch(&self) {
        self.touched.store(true, Ordering::Release);
    }

    /// Atomically reads and clears the touched flag.
    ///
    /// Returns the previous value: `true` means the cursor was used since
    /// the last check and must survive another window.
    pub fn clear_touched(&self) -> bool {
        self.touched.swap(false, Ordering::AcqRel)
    }

    /// Current flag value, without clearing it.
    pub fn is_touched(&self) -> bool {
        self.touched.load(Ordering::Acquire)
    }

    /// Locks the handle/lookahead for a page fetch or close.
    pub async fn lock_slot(&self) -> tokio::sync::MutexGuard<'_, CursorSlot> {
        self.slot.lock().await
    }
}

/// Per-node mapping of cursor id to open cursor state.
///
/// At most one entry per id; removal is the only way an id leaves the map,
/// and ids themselves are never reissued.
pub struct CursorRegistry {
    cursors: DashMap<String, Arc<CursorState>>,
}

impl CursorRegistry {
    pub fn new() -> Self {
        Self {
            cursors: DashMap::new(),
        }
    }

    /// Registers a cursor under a fresh id.
    pub fn insert(&self, id: &str, state: CursorState) {
        self.cursors.insert(id.to_string(), Arc::new(state));

        tracing::debug!("Registered cursor {}", id);
    }

    /// Looks up a cursor's state.
    pub fn get(&self, id: &str) -> Option<Arc<CursorState>> {
        self.cursors.get(id).map(|entry| entry.value().clone())
    }

    /// Removes a cursor from the registry, returning its state so the
    /// caller can close the engine-side handle.
    pub fn remove(&self, id: &str) -> Option<Arc<CursorState>> {
        let removed = self.cursors.remove(id).map(|(_, state)| state);

        if removed.is_some() {
            tracing::debug!("Removed cursor {}", id);
        }

        removed
    }

    pub fn contains(&self, id: &str) -> bool {
        self.cursors.contains_key(id)
    }

    /// Number of open cursors on this node.
    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }
}

impl Default for CursorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
