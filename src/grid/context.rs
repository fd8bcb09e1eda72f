//! Per-Node Runtime Context
//!
//! Bundles everything a job needs when it lands on a node: the node's
//! identity, its cache store, the query engine adapter, the cursor registry
//! and the expiration scheduler that reclaims idle cursors.
//!
//! The context is built once per node and injected into every job. There is
//! deliberately no ambient/static storage: all node-local mutable state
//! lives behind this struct, so tests can spin up as many independent
//! "nodes" as they like inside one process.

use super::store::CacheStore;
use super::types::{NodeId, NodeRecord};
use crate::query::engine::{MemoryQueryEngine, QueryEngine};
use crate::query::expiry::ExpirationScheduler;
use crate::query::registry::CursorRegistry;

use std::sync::Arc;
use std::time::{Duration, Instant};

/// Tunables for the diagnostics subsystem.
#[derive(Debug, Clone)]
pub struct InspectConfig {
    /// Idle window `D` for the cursor sliding expiration. A cursor untouched
    /// for two consecutive windows is evicted.
    pub cursor_idle_timeout: Duration,
    /// Page size used when a caller does not specify one.
    pub default_page_size: usize,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            cursor_idle_timeout: Duration::from_secs(300),
            default_page_size: 100,
        }
    }
}

/// The runtime context owned by a single node.
pub struct NodeContext {
    /// Identity of this node.
    pub id: NodeId,
    /// Caches hosted by this node.
    pub store: Arc<CacheStore>,
    /// Adapter to the query engine executing SCAN/SQL against the store.
    pub engine: Arc<dyn QueryEngine>,
    /// Open query cursors on this node.
    pub cursors: Arc<CursorRegistry>,
    /// Idle-timeout timers for the cursors above.
    pub expiry: Arc<ExpirationScheduler>,
    /// Subsystem configuration.
    pub config: InspectConfig,
    /// When this context was created (drives `uptime_ms`).
    started_at: Instant,
}

impl NodeContext {
    /// Creates a context backed by the in-memory query engine.
    pub fn new(config: InspectConfig) -> Arc<Self> {
        let store = Arc::new(CacheStore::new());
        let engine: Arc<dyn QueryEngine> = Arc::new(MemoryQueryEngine::new(store.clone()));

        Self::with_engine(store, engine, config)
    }

    /// Creates a context with a caller-provided query engine.
    ///
    /// Used when the node is wired to a real engine instead of the
    /// in-memory reference adapter.
    pub fn with_engine(
        store: Arc<CacheStore>,
        engine: Arc<dyn QueryEngine>,
        config: InspectConfig,
    ) -> Arc<Self> {
        let cursors = Arc::new(CursorRegistry::new());
        let expiry = ExpirationScheduler::new(cursors.clone(), config.cursor_idle_timeout);

        let id = NodeId::new();
        tracing::info!("Node context created: {}", id);

        Arc::new(Self {
            id,
            store,
            engine,
            cursors,
            expiry,
            config,
            started_at: Instant::now(),
        })
    }

    /// Milliseconds this context has been alive.
    pub fn uptime_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }

    /// Builds the diagnostic record reported by the collection task.
    pub fn record(&self) -> NodeRecord {
        NodeRecord {
            node_id: self.id.clone(),
            hostname: std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string()),
            uptime_ms: self.uptime_ms(),
            cache_names: self.store.cache_names(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
