//! Grid Module Tests
//!
//! Unit tests for node identity, the cache store and the node context.

#[cfg(test)]
mod tests {
    use crate::grid::context::{InspectConfig, NodeContext};
    use crate::grid::store::CacheStore;
    use crate::grid::types::NodeId;

    use serde_json::json;

    // ============================================================
    // TEST 1: NodeId
    // ============================================================

    #[test]
    fn test_node_id_is_unique() {
        let id1 = NodeId::new();
        let id2 = NodeId::new();

        assert_ne!(id1.0, id2.0);
    }

    #[test]
    fn test_node_id_display_matches_inner() {
        let id = NodeId::new();

        assert_eq!(format!("{}", id), id.0);
    }

    // ============================================================
    // TEST 2: CacheStore basics
    // ============================================================

    #[test]
    fn test_store_put_and_snapshot_preserve_order() {
        let store = CacheStore::new();

        store.put("books", json!("b1"), json!("Dune"));
        store.put("books", json!("b2"), json!("Solaris"));
        store.put("books", json!("b3"), json!("Neuromancer"));

        let snapshot = store.snapshot("books").unwrap();

        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[0], (json!("b1"), json!("Dune")));
        assert_eq!(snapshot[2], (json!("b3"), json!("Neuromancer")));
    }

    #[test]
    fn test_store_put_replaces_in_place() {
        let store = CacheStore::new();

        store.put("books", json!("b1"), json!("Dune"));
        store.put("books", json!("b2"), json!("Solaris"));
        store.put("books", json!("b1"), json!("Dune Messiah"));

        let snapshot = store.snapshot("books").unwrap();

        // Replacement keeps the original position, so open scans stay stable
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0], (json!("b1"), json!("Dune Messiah")));
        assert_eq!(store.entry_count("books"), 2);
    }

    #[test]
    fn test_store_snapshot_is_isolated_from_later_writes() {
        let store = CacheStore::new();
        store.put("books", json!("b1"), json!("Dune"));

        let snapshot = store.snapshot("books").unwrap();
        store.put("books", json!("b2"), json!("Solaris"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.entry_count("books"), 2);
    }

    #[test]
    fn test_store_missing_cache() {
        let store = CacheStore::new();

        assert!(store.snapshot("nope").is_none());
        assert!(!store.has_cache("nope"));
        assert_eq!(store.entry_count("nope"), 0);
    }

    #[test]
    fn test_store_cache_names() {
        let store = CacheStore::new();
        store.create_cache("a");
        store.put("b", json!(1), json!(2));

        let mut names = store.cache_names();
        names.sort();

        assert_eq!(names, vec!["a", "b"]);
    }

    // ============================================================
    // TEST 3: NodeContext and its record
    // ============================================================

    #[tokio::test]
    async fn test_context_record_reflects_the_node() {
        let ctx = NodeContext::new(InspectConfig::default());
        ctx.store.create_cache("orders");

        let record = ctx.record();

        assert_eq!(record.node_id, ctx.id);
        assert_eq!(record.cache_names, vec!["orders"]);
        assert_eq!(record.version, env!("CARGO_PKG_VERSION"));
        assert!(!record.hostname.is_empty());
    }

    #[test]
    fn test_default_config() {
        let config = InspectConfig::default();

        assert_eq!(config.cursor_idle_timeout.as_secs(), 300);
        assert_eq!(config.default_page_size, 100);
    }
}
