//! Record Collection Task
//!
//! The minimal use of the dispatch-reduce framework: ask every node for its
//! diagnostic record and map the outcomes per node. Mostly here to keep the
//! generic Task contract honest with a trivial implementation.

use crate::compute::task::{Job, JobOutcome, Task};
use crate::grid::context::NodeContext;
use crate::grid::types::{NodeId, NodeRecord};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Job returning the local node's diagnostic record.
pub struct InfoCollectionJob;

#[async_trait]
impl Job for InfoCollectionJob {
    type Output = NodeRecord;

    async fn execute(
        &self,
        ctx: &NodeContext,
        _cancel: &CancellationToken,
    ) -> JobOutcome<NodeRecord> {
        Ok(ctx.record())
    }
}

/// Collects a record from every target node.
///
/// Reduce preserves per-node identity: each entry maps to
/// `(node_id, Some(record))` on success or `(node_id, None)` on failure,
/// so a broken node never hides the healthy ones.
pub struct CollectRecordsTask;

impl Task for CollectRecordsTask {
    type Arg = ();
    type Job = InfoCollectionJob;
    type Reduced = Vec<(NodeId, Option<NodeRecord>)>;

    fn split(&self, _arg: &(), nodes: &[NodeId]) -> Vec<(NodeId, InfoCollectionJob)> {
        nodes
            .iter()
            .map(|node| (node.clone(), InfoCollectionJob))
            .collect()
    }

    fn reduce(
        &self,
        results: Vec<(NodeId, JobOutcome<NodeRecord>)>,
    ) -> Vec<(NodeId, Option<NodeRecord>)> {
        results
            .into_iter()
            .map(|(node_id, outcome)| {
                if let Err(e) = &outcome {
                    tracing::warn!("No record from node {}: {}", node_id, e);
                }

                (node_id, outcome.ok())
            })
            .collect()
    }
}
