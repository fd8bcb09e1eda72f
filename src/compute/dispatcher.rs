//! Grid Dispatcher
//!
//! Runs a `Task` against a set of nodes and joins the per-node outcomes.
//!
//! ## Lifecycle
//! A submission moves through Created -> Dispatched -> Collecting -> Reduced;
//! each job through Scheduled -> Running -> (Completed | Failed). The states
//! are implicit in the control flow below, not reified enums.
//!
//! ## Failure containment
//! - A job that returns `Err` contributes that error as its outcome.
//! - A job that panics is caught at the join point and recorded as
//!   `JobError::Failed` for its node.
//! - A target node missing from the dispatcher's node set yields
//!   `JobError::NodeUnreachable`.
//!
//! No single node's failure blocks collection of the others, and there is no
//! retry at this layer.

use super::task::{Job, JobError, JobOutcome, Task};
use crate::grid::context::NodeContext;
use crate::grid::types::NodeId;

use dashmap::DashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Coordinator-side entry point for running tasks on the grid.
pub struct GridDispatcher {
    /// The node set jobs can be dispatched to.
    nodes: DashMap<NodeId, Arc<NodeContext>>,
    /// Root cancellation signal; every job observes a child of it.
    cancel: CancellationToken,
}

impl GridDispatcher {
    /// Creates a dispatcher with an empty node set.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            nodes: DashMap::new(),
            cancel: CancellationToken::new(),
        })
    }

    /// Adds a node to the dispatchable set.
    pub fn register_node(&self, ctx: Arc<NodeContext>) {
        tracing::info!("Registered node {}", ctx.id);
        self.nodes.insert(ctx.id.clone(), ctx);
    }

    /// Returns the ids of all registered nodes.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Looks up a node's context by id.
    pub fn node(&self, id: &NodeId) -> Option<Arc<NodeContext>> {
        self.nodes.get(id).map(|entry| entry.value().clone())
    }

    /// Number of registered nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Signals cancellation to every running job.
    pub fn shutdown(&self) {
        tracing::info!("Dispatcher shutdown requested");
        self.cancel.cancel();
    }

    /// Runs `task` with `arg` on `targets` and returns the reduced result.
    ///
    /// Jobs are spawned concurrently, one per target node; the reduce step
    /// is a join point that waits for every outcome (success or failure)
    /// before running.
    pub async fn submit<T: Task>(
        &self,
        task: &T,
        arg: &T::Arg,
        targets: &[NodeId],
    ) -> T::Reduced {
        let jobs = task.split(arg, targets);

        tracing::debug!("Dispatching {} jobs to {} targets", jobs.len(), targets.len());

        // Dispatch: spawn one job per target node. Unknown nodes are kept in
        // the result set with a placeholder so reduce still sees one entry
        // per job.
        let mut handles: Vec<(NodeId, Option<JoinHandle<JobOutcome<_>>>)> =
            Vec::with_capacity(jobs.len());

        for (node_id, job) in jobs {
            match self.node(&node_id) {
                Some(ctx) => {
                    let cancel = self.cancel.child_token();
                    handles.push((
                        node_id,
                        Some(tokio::spawn(async move {
                            job.execute(&ctx, &cancel).await
                        })),
                    ));
                }
                None => {
                    tracing::warn!("Job targets unknown node {}", node_id);
                    handles.push((node_id, None));
                }
            }
        }

        // Collect: join every job, converting panics into per-node failures.
        let mut results = Vec::with_capacity(handles.len());

        for (node_id, handle) in handles {
            let outcome = match handle {
                None => Err(JobError::NodeUnreachable(node_id.clone())),
                Some(handle) => match handle.await {
                    Ok(outcome) => outcome,
                    Err(join_err) => {
                        tracing::error!("Job on node {} panicked: {}", node_id, join_err);
                        Err(JobError::Failed(join_err.to_string()))
                    }
                },
            };

            if let Err(e) = &outcome {
                tracing::debug!("Job on node {} resolved to error: {}", node_id, e);
            }

            results.push((node_id, outcome));
        }

        // Reduce: total over any ok/err mix.
        task.reduce(results)
    }
}
