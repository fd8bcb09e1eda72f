use crate::grid::types::NodeId;
use serde::{Deserialize, Serialize};

/// One result row: an ordered sequence of opaque values.
pub type Row = Vec<serde_json::Value>;

/// Describes one column of a query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMeta {
    /// Display name of the column's value type.
    pub display_type: String,
    /// Column name.
    pub name: String,
}

impl ColumnMeta {
    pub fn new(display_type: &str, name: &str) -> Self {
        Self {
            display_type: display_type.to_string(),
            name: name.to_string(),
        }
    }
}

/// The two flavors of ad-hoc query the subsystem runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryKind {
    /// Raw key/value retrieval from a cache, no projection.
    Scan,
    /// Field projection (SQL-like) returning named, typed columns.
    Fields,
}

impl QueryKind {
    /// Classifies query text by its case-insensitive prefix. Purely textual,
    /// done before the engine is ever contacted.
    pub fn classify(query_text: &str) -> Self {
        if query_text.trim_start().to_uppercase().starts_with("SCAN") {
            Self::Scan
        } else {
            Self::Fields
        }
    }

    /// Kind-specific prefix used when minting cursor ids.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Scan => "SCAN",
            Self::Fields => "SQL",
        }
    }
}

/// Mints a fresh cursor id: `{SCAN|SQL}-<random token>`.
///
/// The random token makes ids unique for the registry's lifetime; ids are
/// never reissued even after the cursor is removed.
pub fn new_cursor_id(kind: QueryKind) -> String {
    format!("{}-{}", kind.id_prefix(), uuid::Uuid::new_v4())
}

/// The fixed synthetic schema of a scan query: raw key and value columns.
pub fn scan_columns() -> Vec<ColumnMeta> {
    vec![
        ColumnMeta::new("", "Key"),
        ColumnMeta::new("", "Value"),
    ]
}

/// One page of query results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryPage {
    /// At most the requested page size worth of rows.
    pub rows: Vec<Row>,
    /// Whether another page can be fetched. Derived from the lookahead row,
    /// never from a second round trip.
    pub has_more: bool,
}

/// Successful outcome of opening a query and reading its first page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryPageResult {
    /// Node the query executes on (owns the cursor).
    pub executing_node: NodeId,
    /// Registry id for fetching subsequent pages.
    pub cursor_id: String,
    /// Result schema.
    pub columns: Vec<ColumnMeta>,
    /// First page of rows.
    pub rows: Vec<Row>,
    /// Whether more data is available past this page.
    pub has_more: bool,
}
