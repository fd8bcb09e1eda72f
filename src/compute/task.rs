//! Task and Job Contracts
//!
//! Capability interfaces for the dispatch-reduce framework. A `Task` is the
//! distributable operation: it splits an argument into per-node `Job`s and
//! reduces the collected outcomes into one aggregate result. A `Job` is the
//! unit of work that runs on exactly one node.
//!
//! Failures are data, not faults: every job resolves to a `JobOutcome` and
//! the framework guarantees `reduce` always receives one outcome per
//! dispatched job, success or not.

use crate::grid::context::NodeContext;
use crate::grid::types::NodeId;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Errors a job can resolve to.
///
/// Everything in this taxonomy is returned as data across the job boundary.
/// Nothing here is allowed to become an unhandled fault that tears down a
/// node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum JobError {
    /// A fields query was opened but the engine could not describe its
    /// columns. The query itself is unusable, this is not a transient fault.
    #[error("no column metadata available")]
    NoColumnMetadata,

    /// The requested cursor id is not (or no longer) in the registry.
    /// Distinct from an engine fault so callers can tell "expired" from
    /// "broken".
    #[error("cursor not found: {0}")]
    CursorNotFound(String),

    /// The named cache does not exist on the executing node.
    #[error("cache not found: {0}")]
    CacheNotFound(String),

    /// The query engine failed while opening or reading a cursor
    /// (bad query text, engine-internal fault, ...).
    #[error("query engine error: {0}")]
    Engine(String),

    /// The target node is not part of the dispatcher's node set.
    #[error("node not reachable: {0}")]
    NodeUnreachable(NodeId),

    /// Catch-all for unexpected job failures, including panics caught by
    /// the framework.
    #[error("job failed: {0}")]
    Failed(String),
}

/// The two-case outcome of running one job on one node.
pub type JobOutcome<T> = Result<T, JobError>;

/// A single-node unit of work.
///
/// The job is owned by the node that executes it; its computation is
/// sequential on that node. Jobs on different nodes run concurrently with
/// no ordering guarantee between them.
#[async_trait]
pub trait Job: Send + Sync + 'static {
    /// Value produced on success.
    type Output: Send + 'static;

    /// Runs the job on the node owning `ctx`.
    ///
    /// `cancel` is signalled when the dispatcher shuts down; long-running
    /// jobs should check it and abort engine-side work promptly.
    async fn execute(
        &self,
        ctx: &NodeContext,
        cancel: &CancellationToken,
    ) -> JobOutcome<Self::Output>;
}

/// A distributable operation: split into per-node jobs, reduce the outcomes.
pub trait Task: Send + Sync {
    /// Argument the caller submits.
    type Arg;
    /// Job type instantiated per target node.
    type Job: Job;
    /// Aggregate result produced by `reduce`.
    type Reduced;

    /// Splits the argument into one job per target node.
    ///
    /// Must be a pure function of `(arg, nodes)`.
    fn split(&self, arg: &Self::Arg, nodes: &[NodeId]) -> Vec<(NodeId, Self::Job)>;

    /// Combines the collected per-node outcomes into the aggregate result.
    ///
    /// Total by construction: there is no error channel in the signature,
    /// so an individual `Err` entry can never make the reduction itself
    /// fail.
    fn reduce(
        &self,
        results: Vec<(NodeId, JobOutcome<<Self::Job as Job>::Output>)>,
    ) -> Self::Reduced;
}
