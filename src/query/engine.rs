//! Query Engine Adapter
//!
//! The seam between the diagnostics subsystem and whatever actually executes
//! SCAN/SQL queries. The subsystem only depends on the two traits below;
//! `MemoryQueryEngine` is a reference adapter over the node-local
//! `CacheStore`, good enough for wiring and tests but deliberately not a
//! query engine (its "SQL" support is a minimal `SELECT fields FROM cache`
//! projection).

use super::types::{ColumnMeta, Row};
use crate::grid::store::CacheStore;
use crate::grid::types::NodeId;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// An open, pageable query result on the engine side.
#[async_trait]
pub trait CursorHandle: Send {
    /// Pulls the next row, or `None` at end of data. Blocking from the
    /// caller's perspective.
    async fn next(&mut self) -> Result<Option<Row>>;

    /// Column metadata for the result, if the engine can report it.
    /// For fields queries this is only reliable after the first row has
    /// been pulled.
    fn metadata(&self) -> Option<Vec<ColumnMeta>>;

    /// Releases engine-side resources held by this cursor.
    async fn close(&mut self);
}

/// Executes queries against the node's data.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Opens a raw key/value scan over a cache.
    async fn open_scan_query(
        &self,
        cache_name: &str,
        page_size: usize,
        node_scope: &[NodeId],
    ) -> Result<Box<dyn CursorHandle>>;

    /// Opens a field-projection (SQL-like) query.
    async fn open_fields_query(
        &self,
        query_text: &str,
        page_size: usize,
        node_scope: &[NodeId],
    ) -> Result<Box<dyn CursorHandle>>;
}

/// Reference engine over the node-local cache store.
pub struct MemoryQueryEngine {
    store: Arc<CacheStore>,
    /// Live engine-side cursors, for leak checks.
    open_cursors: Arc<AtomicUsize>,
}

impl MemoryQueryEngine {
    pub fn new(store: Arc<CacheStore>) -> Self {
        Self {
            store,
            open_cursors: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of engine-side cursors not yet closed.
    pub fn open_cursor_count(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    fn snapshot(&self, cache: &str) -> Result<Vec<(Value, Value)>> {
        self.store
            .snapshot(cache)
            .ok_or_else(|| anyhow::anyhow!("cache not found: {}", cache))
    }
}

#[async_trait]
impl QueryEngine for MemoryQueryEngine {
    async fn open_scan_query(
        &self,
        cache_name: &str,
        _page_size: usize,
        node_scope: &[NodeId],
    ) -> Result<Box<dyn CursorHandle>> {
        tracing::debug!(
            "Opening scan over cache '{}' (scope: {} nodes)",
            cache_name,
            node_scope.len()
        );

        let rows: VecDeque<Row> = self
            .snapshot(cache_name)?
            .into_iter()
            .map(|(key, value)| vec![key, value])
            .collect();

        Ok(Box::new(MemoryCursor::open(
            rows,
            None,
            self.open_cursors.clone(),
        )))
    }

    async fn open_fields_query(
        &self,
        query_text: &str,
        _page_size: usize,
        node_scope: &[NodeId],
    ) -> Result<Box<dyn CursorHandle>> {
        tracing::debug!(
            "Opening fields query '{}' (scope: {} nodes)",
            query_text,
            node_scope.len()
        );

        let (projection, cache_name) = parse_fields_query(query_text)?;
        let entries = self.snapshot(&cache_name)?;

        let rows: VecDeque<Row> = match &projection {
            // `SELECT *` has no derivable column set in this minimal
            // engine, so rows carry the whole value and metadata stays
            // unavailable.
            Projection::Star => entries.into_iter().map(|(_, value)| vec![value]).collect(),
            Projection::Fields(fields) => entries
                .into_iter()
                .map(|(_, value)| {
                    fields
                        .iter()
                        .map(|field| value.get(field).cloned().unwrap_or(Value::Null))
                        .collect()
                })
                .collect(),
        };

        let columns = match projection {
            Projection::Star => None,
            Projection::Fields(fields) => Some(
                fields
                    .iter()
                    .enumerate()
                    .map(|(i, field)| {
                        let display_type = rows
                            .front()
                            .map(|row| json_type_name(&row[i]))
                            .unwrap_or("unknown");
                        ColumnMeta::new(display_type, field)
                    })
                    .collect(),
            ),
        };

        Ok(Box::new(MemoryCursor::open(
            rows,
            columns,
            self.open_cursors.clone(),
        )))
    }
}

/// Column list of a fields query.
enum Projection {
    Star,
    Fields(Vec<String>),
}

/// Parses `SELECT <fields|*> FROM <cache>` (case-insensitive keywords).
fn parse_fields_query(query_text: &str) -> Result<(Projection, String)> {
    let tokens: Vec<&str> = query_text.split_whitespace().collect();

    if tokens.len() < 4 || !tokens[0].eq_ignore_ascii_case("select") {
        anyhow::bail!("malformed query: {}", query_text);
    }

    let from_idx = tokens
        .iter()
        .position(|t| t.eq_ignore_ascii_case("from"))
        .ok_or_else(|| anyhow::anyhow!("malformed query (missing FROM): {}", query_text))?;

    if from_idx + 1 >= tokens.len() {
        anyhow::bail!("malformed query (missing cache name): {}", query_text);
    }

    let cache_name = tokens[from_idx + 1].to_string();

    let field_list = tokens[1..from_idx].join(" ");
    let projection = if field_list.trim() == "*" {
        Projection::Star
    } else {
        let fields: Vec<String> = field_list
            .split(',')
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();

        if fields.is_empty() {
            anyhow::bail!("malformed query (empty projection): {}", query_text);
        }

        Projection::Fields(fields)
    };

    Ok((projection, cache_name))
}

/// Display name for a JSON value's type.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// In-memory cursor over a snapshot of rows.
struct MemoryCursor {
    rows: VecDeque<Row>,
    columns: Option<Vec<ColumnMeta>>,
    open_cursors: Arc<AtomicUsize>,
    closed: bool,
}

impl MemoryCursor {
    fn open(
        rows: VecDeque<Row>,
        columns: Option<Vec<ColumnMeta>>,
        open_cursors: Arc<AtomicUsize>,
    ) -> Self {
        open_cursors.fetch_add(1, Ordering::SeqCst);
        Self {
            rows,
            columns,
            open_cursors,
            closed: false,
        }
    }
}

#[async_trait]
impl CursorHandle for MemoryCursor {
    async fn next(&mut self) -> Result<Option<Row>> {
        Ok(self.rows.pop_front())
    }

    fn metadata(&self) -> Option<Vec<ColumnMeta>> {
        self.columns.clone()
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.rows.clear();
            self.open_cursors.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
