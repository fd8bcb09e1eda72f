//! Compute Framework Tests
//!
//! Unit tests for the dispatch-reduce framework.
//!
//! ## Test Scopes
//! - **Partial failure**: reduce always sees one correctly tagged outcome per
//!   dispatched job, whatever mix of successes, errors and panics occurred.
//! - **Dispatch mechanics**: concurrency between jobs, unknown target nodes,
//!   cancellation visibility.

#[cfg(test)]
mod tests {
    use crate::compute::dispatcher::GridDispatcher;
    use crate::compute::task::{Job, JobError, JobOutcome, Task};
    use crate::grid::context::{InspectConfig, NodeContext};
    use crate::grid::types::NodeId;

    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    /// How a probe job should behave on its node.
    #[derive(Debug, Clone)]
    enum ProbeMode {
        Succeed(String),
        Fail(String),
        Panic,
    }

    struct ProbeJob {
        mode: ProbeMode,
    }

    #[async_trait]
    impl Job for ProbeJob {
        type Output = String;

        async fn execute(
            &self,
            _ctx: &NodeContext,
            _cancel: &CancellationToken,
        ) -> JobOutcome<String> {
            match &self.mode {
                ProbeMode::Succeed(value) => Ok(value.clone()),
                ProbeMode::Fail(reason) => Err(JobError::Failed(reason.clone())),
                ProbeMode::Panic => panic!("probe job panic"),
            }
        }
    }

    /// Identity-reduce task: hands back the tagged outcomes untouched so
    /// tests can inspect exactly what the framework collected.
    struct ProbeTask;

    impl Task for ProbeTask {
        type Arg = HashMap<NodeId, ProbeMode>;
        type Job = ProbeJob;
        type Reduced = Vec<(NodeId, JobOutcome<String>)>;

        fn split(&self, arg: &Self::Arg, nodes: &[NodeId]) -> Vec<(NodeId, ProbeJob)> {
            nodes
                .iter()
                .map(|node| {
                    let mode = arg
                        .get(node)
                        .cloned()
                        .unwrap_or(ProbeMode::Succeed("default".to_string()));
                    (node.clone(), ProbeJob { mode })
                })
                .collect()
        }

        fn reduce(
            &self,
            results: Vec<(NodeId, JobOutcome<String>)>,
        ) -> Vec<(NodeId, JobOutcome<String>)> {
            results
        }
    }

    fn grid_with_nodes(count: usize) -> (Arc<GridDispatcher>, Vec<NodeId>) {
        let dispatcher = GridDispatcher::new();
        let mut ids = Vec::new();

        for _ in 0..count {
            let ctx = NodeContext::new(InspectConfig::default());
            ids.push(ctx.id.clone());
            dispatcher.register_node(ctx);
        }

        (dispatcher, ids)
    }

    // ============================================================
    // TEST 1: Mixed success/failure never aborts the reduce
    // ============================================================

    #[tokio::test]
    async fn test_reduce_sees_every_outcome_tagged_by_node() {
        // ARRANGE: 4 nodes, one succeeding, one failing, one panicking,
        // one running the default
        let (dispatcher, ids) = grid_with_nodes(4);

        let mut modes = HashMap::new();
        modes.insert(ids[0].clone(), ProbeMode::Succeed("ok-0".to_string()));
        modes.insert(ids[1].clone(), ProbeMode::Fail("boom".to_string()));
        modes.insert(ids[2].clone(), ProbeMode::Panic);

        // ACT
        let results = dispatcher.submit(&ProbeTask, &modes, &ids).await;

        // ASSERT: exactly one entry per dispatched job, in target order
        assert_eq!(results.len(), 4);
        for (i, (node_id, _)) in results.iter().enumerate() {
            assert_eq!(node_id, &ids[i]);
        }

        assert_eq!(results[0].1, Ok("ok-0".to_string()));
        assert_eq!(results[1].1, Err(JobError::Failed("boom".to_string())));

        // The panic was caught by the framework, not propagated
        match &results[2].1 {
            Err(JobError::Failed(reason)) => assert!(reason.contains("panic")),
            other => panic!("Expected caught panic, got {:?}", other),
        }

        assert_eq!(results[3].1, Ok("default".to_string()));
    }

    // ============================================================
    // TEST 2: Unknown target nodes
    // ============================================================

    #[tokio::test]
    async fn test_unknown_node_yields_unreachable_outcome() {
        // ARRANGE: one real node, one id the dispatcher never saw
        let (dispatcher, ids) = grid_with_nodes(1);
        let ghost = NodeId::new();
        let targets = vec![ids[0].clone(), ghost.clone()];

        // ACT
        let results = dispatcher
            .submit(&ProbeTask, &HashMap::new(), &targets)
            .await;

        // ASSERT: the healthy node still produced its result
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].1, Ok("default".to_string()));
        assert_eq!(results[1].1, Err(JobError::NodeUnreachable(ghost)));
    }

    // ============================================================
    // TEST 3: Jobs on different nodes run concurrently
    // ============================================================

    struct BarrierJob {
        barrier: Arc<tokio::sync::Barrier>,
    }

    #[async_trait]
    impl Job for BarrierJob {
        type Output = ();

        async fn execute(
            &self,
            _ctx: &NodeContext,
            _cancel: &CancellationToken,
        ) -> JobOutcome<()> {
            // Only completes if the sibling job reaches the barrier too,
            // i.e. both jobs are in flight at the same time.
            self.barrier.wait().await;
            Ok(())
        }
    }

    struct BarrierTask {
        barrier: Arc<tokio::sync::Barrier>,
    }

    impl Task for BarrierTask {
        type Arg = ();
        type Job = BarrierJob;
        type Reduced = usize;

        fn split(&self, _arg: &(), nodes: &[NodeId]) -> Vec<(NodeId, BarrierJob)> {
            nodes
                .iter()
                .map(|node| {
                    (
                        node.clone(),
                        BarrierJob {
                            barrier: self.barrier.clone(),
                        },
                    )
                })
                .collect()
        }

        fn reduce(&self, results: Vec<(NodeId, JobOutcome<()>)>) -> usize {
            results.iter().filter(|(_, outcome)| outcome.is_ok()).count()
        }
    }

    #[tokio::test]
    async fn test_jobs_run_concurrently() {
        // ARRANGE
        let (dispatcher, ids) = grid_with_nodes(2);
        let task = BarrierTask {
            barrier: Arc::new(tokio::sync::Barrier::new(2)),
        };

        // ACT: would deadlock (and hit the timeout) under sequential execution
        let reduced = tokio::time::timeout(
            Duration::from_secs(5),
            dispatcher.submit(&task, &(), &ids),
        )
        .await
        .expect("jobs did not run concurrently");

        // ASSERT
        assert_eq!(reduced, 2);
    }

    // ============================================================
    // TEST 4: Cancellation signal is visible to jobs
    // ============================================================

    struct CancelProbeJob;

    #[async_trait]
    impl Job for CancelProbeJob {
        type Output = bool;

        async fn execute(
            &self,
            _ctx: &NodeContext,
            cancel: &CancellationToken,
        ) -> JobOutcome<bool> {
            Ok(cancel.is_cancelled())
        }
    }

    struct CancelProbeTask;

    impl Task for CancelProbeTask {
        type Arg = ();
        type Job = CancelProbeJob;
        type Reduced = Vec<bool>;

        fn split(&self, _arg: &(), nodes: &[NodeId]) -> Vec<(NodeId, CancelProbeJob)> {
            nodes.iter().map(|node| (node.clone(), CancelProbeJob)).collect()
        }

        fn reduce(&self, results: Vec<(NodeId, JobOutcome<bool>)>) -> Vec<bool> {
            results
                .into_iter()
                .map(|(_, outcome)| outcome.unwrap_or(false))
                .collect()
        }
    }

    #[tokio::test]
    async fn test_shutdown_is_observed_by_jobs() {
        // ARRANGE
        let (dispatcher, ids) = grid_with_nodes(1);

        // ACT: cancel before submitting
        dispatcher.shutdown();
        let observed = dispatcher.submit(&CancelProbeTask, &(), &ids).await;

        // ASSERT: the job saw the cancellation signal
        assert_eq!(observed, vec![true]);
    }

    // ============================================================
    // TEST 5: Split is a pure function of (arg, nodes)
    // ============================================================

    #[test]
    fn test_split_is_deterministic() {
        let nodes = vec![NodeId::new(), NodeId::new(), NodeId::new()];
        let arg = HashMap::new();

        let first: Vec<NodeId> = ProbeTask
            .split(&arg, &nodes)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        let second: Vec<NodeId> = ProbeTask
            .split(&arg, &nodes)
            .into_iter()
            .map(|(id, _)| id)
            .collect();

        assert_eq!(first, second);
        assert_eq!(first, nodes);
    }

    // ============================================================
    // TEST 6: Empty target set reduces to an empty result
    // ============================================================

    #[tokio::test]
    async fn test_empty_target_set() {
        let (dispatcher, _) = grid_with_nodes(1);

        let results = dispatcher.submit(&ProbeTask, &HashMap::new(), &[]).await;

        assert!(results.is_empty());
    }
}
