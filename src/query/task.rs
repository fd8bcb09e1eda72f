//! Query Dispatch Job and Paging
//!
//! Runs an ad-hoc SCAN or fields query on a node, reads the first page plus
//! one lookahead row, registers a cursor for follow-up pages and arms its
//! expiration timer. The lookahead row never reaches the caller: its mere
//! presence answers "is there more data?" in the same round trip, so no
//! second trip is needed just for `has_more`.
//!
//! Every engine fault is resolved inside the job and returned as a
//! `JobOutcome` error; nothing escapes as an unhandled fault.

use super::engine::CursorHandle;
use super::registry::CursorState;
use super::types::{
    new_cursor_id, scan_columns, ColumnMeta, QueryKind, QueryPage, QueryPageResult, Row,
};
use crate::compute::task::{Job, JobError, JobOutcome, Task};
use crate::grid::context::NodeContext;
use crate::grid::types::NodeId;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Arguments for a query task.
///
/// `target_nodes` scopes the underlying data query; the node the job itself
/// lands on is the query's executing node and owns the cursor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryArg {
    /// Nodes whose data the query covers.
    pub target_nodes: Vec<NodeId>,
    /// Cache to query (used by scans).
    pub cache_name: String,
    /// Query text; a case-insensitive `SCAN` prefix selects a scan query,
    /// anything else runs as a fields query.
    pub query_text: String,
    /// Rows per page; `None` uses the executing node's configured default.
    pub page_size: Option<usize>,
}

/// Job that opens a query and returns its first page.
pub struct QueryDispatchJob {
    arg: QueryArg,
}

impl QueryDispatchJob {
    pub fn new(arg: QueryArg) -> Self {
        Self { arg }
    }

    async fn run(&self, ctx: &NodeContext) -> JobOutcome<QueryPageResult> {
        let arg = &self.arg;
        let page_size = arg.page_size.unwrap_or(ctx.config.default_page_size);

        // Classification is purely textual, before the engine is contacted.
        let kind = QueryKind::classify(&arg.query_text);
        let cursor_id = new_cursor_id(kind);

        tracing::debug!(
            "Running {:?} query on cache '{}' as cursor {} (page size {})",
            kind,
            arg.cache_name,
            cursor_id,
            page_size
        );

        match kind {
            QueryKind::Scan => {
                let mut handle = ctx
                    .engine
                    .open_scan_query(&arg.cache_name, page_size, &arg.target_nodes)
                    .await
                    .map_err(|e| JobError::Engine(e.to_string()))?;

                let (rows, lookahead) = match fetch_page(handle.as_mut(), None, page_size).await
                {
                    Ok(page) => page,
                    Err(e) => {
                        handle.close().await;
                        return Err(JobError::Engine(e.to_string()));
                    }
                };

                Ok(self.register(ctx, cursor_id, kind, scan_columns(), handle, rows, lookahead))
            }
            QueryKind::Fields => {
                let mut handle = ctx
                    .engine
                    .open_fields_query(&arg.query_text, page_size, &arg.target_nodes)
                    .await
                    .map_err(|e| JobError::Engine(e.to_string()))?;

                // Metadata is only reliable once the first row has been
                // pulled, so read it before asking for columns.
                let first = match handle.next().await {
                    Ok(first) => first,
                    Err(e) => {
                        handle.close().await;
                        return Err(JobError::Engine(e.to_string()));
                    }
                };

                let Some(columns) = handle.metadata() else {
                    // The query itself is unusable; report the distinguished
                    // error and register nothing.
                    handle.close().await;
                    return Err(JobError::NoColumnMetadata);
                };

                let (rows, lookahead) =
                    match fetch_page(handle.as_mut(), first, page_size).await {
                        Ok(page) => page,
                        Err(e) => {
                            handle.close().await;
                            return Err(JobError::Engine(e.to_string()));
                        }
                    };

                Ok(self.register(ctx, cursor_id, kind, columns, handle, rows, lookahead))
            }
        }
    }

    /// Registers the cursor, arms its expiration timer and shapes the
    /// caller-visible result.
    fn register(
        &self,
        ctx: &NodeContext,
        cursor_id: String,
        kind: QueryKind,
        columns: Vec<ColumnMeta>,
        handle: Box<dyn CursorHandle>,
        rows: Vec<Row>,
        lookahead: Option<Row>,
    ) -> QueryPageResult {
        let has_more = lookahead.is_some();

        ctx.cursors.insert(
            &cursor_id,
            CursorState::new(kind, columns.clone(), handle, lookahead),
        );
        ctx.expiry.arm(&cursor_id);

        tracing::info!(
            "Opened cursor {} on node {}: {} rows, has_more={}",
            cursor_id,
            ctx.id,
            rows.len(),
            has_more
        );

        QueryPageResult {
            executing_node: ctx.id.clone(),
            cursor_id,
            columns,
            rows,
            has_more,
        }
    }
}

#[async_trait]
impl Job for QueryDispatchJob {
    type Output = QueryPageResult;

    async fn execute(
        &self,
        ctx: &NodeContext,
        cancel: &CancellationToken,
    ) -> JobOutcome<QueryPageResult> {
        if cancel.is_cancelled() {
            return Err(JobError::Failed("job cancelled before execution".into()));
        }

        self.run(ctx).await
    }
}

/// Task running an ad-hoc query on a single node of the scope.
///
/// Split yields one `QueryDispatchJob` for the first node of the target
/// set; reduce hands that node's outcome back unchanged, so the caller
/// always receives a well-formed per-call result.
pub struct RunFieldsQueryTask;

impl Task for RunFieldsQueryTask {
    type Arg = QueryArg;
    type Job = QueryDispatchJob;
    type Reduced = JobOutcome<QueryPageResult>;

    fn split(&self, arg: &QueryArg, nodes: &[NodeId]) -> Vec<(NodeId, QueryDispatchJob)> {
        nodes
            .first()
            .map(|node| vec![(node.clone(), QueryDispatchJob::new(arg.clone()))])
            .unwrap_or_default()
    }

    fn reduce(
        &self,
        mut results: Vec<(NodeId, JobOutcome<QueryPageResult>)>,
    ) -> JobOutcome<QueryPageResult> {
        match results.pop() {
            Some((_, outcome)) => outcome,
            None => Err(JobError::Failed("no nodes to execute query".into())),
        }
    }
}

/// Reads up to `page_size` rows plus one lookahead row from a cursor.
///
/// `buffered` is a row already pulled from the handle (the previous page's
/// lookahead, or the fields query's metadata-probe row); it becomes the
/// first row of the page. The returned lookahead is `None` exactly when the
/// cursor is exhausted.
async fn fetch_page(
    handle: &mut dyn CursorHandle,
    buffered: Option<Row>,
    page_size: usize,
) -> anyhow::Result<(Vec<Row>, Option<Row>)> {
    let mut rows = Vec::with_capacity(page_size);

    if let Some(row) = buffered {
        rows.push(row);
    }

    while rows.len() < page_size {
        match handle.next().await? {
            Some(row) => rows.push(row),
            // Ran out before filling the page: no lookahead to buffer.
            None => return Ok((rows, None)),
        }
    }

    let lookahead = handle.next().await?;

    Ok((rows, lookahead))
}

/// Fetches the next page of an open cursor.
///
/// The buffered lookahead becomes the first row of the page and a fresh
/// lookahead is pulled past it. The fetch marks the cursor touched, which
/// renews its idle window. An exhausted cursor is removed and its timer
/// disarmed; a missing id surfaces as `CursorNotFound`, distinct from any
/// engine fault. A cursor whose engine read fails is also removed: the
/// fault may have consumed rows, so a retry against the same handle would
/// skip data.
pub async fn fetch_next_page(
    ctx: &NodeContext,
    cursor_id: &str,
    page_size: usize,
) -> JobOutcome<QueryPage> {
    let Some(state) = ctx.cursors.get(cursor_id) else {
        return Err(JobError::CursorNotFound(cursor_id.to_string()));
    };

    // Renew the idle window up front, before the engine read: a slow fetch
    // must not leave the cursor looking untouched to a concurrent check.
    state.touch();

    let (rows, has_more) = {
        let mut slot = state.lock_slot().await;

        let buffered = slot.lookahead.take();
        match fetch_page(slot.handle.as_mut(), buffered, page_size).await {
            Ok((rows, lookahead)) => {
                slot.lookahead = lookahead;
                let has_more = slot.lookahead.is_some();
                (rows, has_more)
            }
            Err(e) => {
                slot.close().await;
                drop(slot);
                ctx.expiry.disarm(cursor_id);
                ctx.cursors.remove(cursor_id);

                tracing::warn!("Cursor {} failed mid-fetch, released: {}", cursor_id, e);
                return Err(JobError::Engine(e.to_string()));
            }
        }
    };

    if !has_more {
        // Client exhausted the cursor: release it eagerly instead of
        // waiting out the idle windows.
        ctx.expiry.disarm(cursor_id);
        if let Some(state) = ctx.cursors.remove(cursor_id) {
            state.lock_slot().await.close().await;
        }
    }

    tracing::debug!(
        "Fetched {} rows from cursor {} (has_more={})",
        rows.len(),
        cursor_id,
        has_more
    );

    Ok(QueryPage { rows, has_more })
}
