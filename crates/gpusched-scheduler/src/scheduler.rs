use crate::accounting::ResourceAccounting;
use crate::config::SchedulerConfig;
use crate::filter::{default_filters, FilterPredicate};
use crate::queue::QueueConsumer;
use crate::score::{default_scores, select_best_node, total_score, ScoreFunction};
use crate::traits::{Binder, EventRecorder, NodeCatalog};
use crate::types::{AttemptOutcome, NodeInfo, PlacementDecision, SchedulingContext, ScoreResult};
use crate::{Result, SchedulerError};
use gpusched_core::{Pod, WorkloadKey};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Pod scheduler.
///
/// Decisions are strictly serialized: the queue consumer sits behind a mutex
/// that is held from dequeue until the bind and record calls return, so two
/// attempts can never pick the same free node concurrently.
pub struct Scheduler {
    scheduler_name: String,
    accounting: ResourceAccounting,
    queue: Mutex<QueueConsumer>,
    catalog: Arc<dyn NodeCatalog>,
    binder: Arc<dyn Binder>,
    recorder: Arc<dyn EventRecorder>,
    filters: Vec<Box<dyn FilterPredicate>>,
    scorers: Vec<Box<dyn ScoreFunction>>,
}

impl Scheduler {
    /// Create a new scheduler with the default filters and scorers
    pub fn new(
        config: &SchedulerConfig,
        queue: QueueConsumer,
        catalog: Arc<dyn NodeCatalog>,
        binder: Arc<dyn Binder>,
        recorder: Arc<dyn EventRecorder>,
    ) -> Self {
        Self {
            scheduler_name: config.scheduler_name.clone(),
            accounting: ResourceAccounting::new(config.resource_name.clone()),
            queue: Mutex::new(queue),
            catalog,
            binder,
            recorder,
            filters: default_filters(),
            scorers: default_scores(),
        }
    }

    /// Replace the filter and scorer pipelines.
    ///
    /// Filters run in the given order and stop at the first rejection;
    /// scorer outputs are summed.
    pub fn with_plugins(
        mut self,
        filters: Vec<Box<dyn FilterPredicate>>,
        scorers: Vec<Box<dyn ScoreFunction>>,
    ) -> Self {
        self.filters = filters;
        self.scorers = scorers;
        self
    }

    /// Run the scheduler loop until `token` is cancelled or the queue closes.
    ///
    /// Cancellation is only observed while waiting for the next pod; an
    /// attempt in progress always runs to completion.
    pub async fn run(&self, token: CancellationToken) -> Result<()> {
        info!(
            scheduler = %self.scheduler_name,
            resource = %self.accounting.resource_name(),
            filters = self.filters.len(),
            scorers = self.scorers.len(),
            "Starting scheduler"
        );

        let mut queue = self.queue.lock().await;

        loop {
            let pod = tokio::select! {
                _ = token.cancelled() => {
                    info!("Scheduler shutting down");
                    break;
                }
                pod = queue.dequeue() => pod,
            };

            match pod {
                Some(pod) => {
                    self.attempt(pod).await;
                }
                None => {
                    info!("Workload queue closed, scheduler stopping");
                    break;
                }
            }
        }

        queue.close();
        if !queue.is_empty() {
            info!(
                pending = queue.len(),
                "Discarding queued pods; they stay unassigned until observed again"
            );
        }

        Ok(())
    }

    /// Dequeue one pod and run a full attempt for it.
    ///
    /// Returns `None` once the queue is closed and drained.
    pub async fn schedule_one(&self) -> Option<AttemptOutcome> {
        let mut queue = self.queue.lock().await;
        let pod = queue.dequeue().await?;
        Some(self.attempt(pod).await)
    }

    async fn attempt(&self, pod: Pod) -> AttemptOutcome {
        let workload = WorkloadKey::from_pod(&pod)
            .map(|key| key.to_string())
            .unwrap_or_else(|_| "<unnamed>".to_string());

        info!("Found a pod to schedule: {}", workload);

        match self.schedule_pod(pod).await {
            Ok(decision) => AttemptOutcome::Bound(decision),
            Err(e) => {
                match &e {
                    SchedulerError::NoFeasibleNode { .. } => {
                        warn!("Cannot find node that fits pod {}: {}", workload, e)
                    }
                    _ => error!("Failed to schedule pod {}: {}", workload, e),
                }
                AttemptOutcome::Dropped { workload, error: e }
            }
        }
    }

    /// Filter, score, select, bind and record for a single pod
    async fn schedule_pod(&self, pod: Pod) -> Result<PlacementDecision> {
        let workload = WorkloadKey::from_pod(&pod)?;
        let requested = self.accounting.pod_request(&pod).ok_or_else(|| {
            SchedulerError::no_feasible_node(
                workload.to_string(),
                format!(
                    "Requested {} exceeds the largest representable quantity",
                    self.accounting.resource_name()
                ),
            )
        })?;
        let context = SchedulingContext::new(
            pod,
            workload,
            self.accounting.resource_name(),
            requested,
        );

        debug!(
            pod = %context.workload,
            requested,
            resource = %context.resource_name,
            "Computed resource request"
        );

        // Phase 1: Snapshot nodes
        let nodes = self.snapshot_nodes()?;

        // Phase 2: Filter nodes
        let feasible = self.filter_nodes(&context, &nodes)?;

        info!(
            "Pod {} has {} feasible nodes: {}",
            context.workload,
            feasible.len(),
            feasible
                .iter()
                .map(|n| n.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        // Phase 3: Score nodes
        let scores = self.score_nodes(&context, &feasible);

        // Phase 4: Select best node
        let best = select_best_node(&scores).cloned().ok_or_else(|| {
            SchedulerError::no_feasible_node(context.workload.to_string(), "No nodes scored")
        })?;

        info!(
            "Selected node {} for pod {} with score {}",
            best.node_name, context.workload, best.score
        );

        // Phase 5: Bind pod to node
        self.binder.bind(&context.pod, &best.node_name).await?;

        // Phase 6: Record the outcome
        let message = format!("Placed pod [{}] on {}", context.workload, best.node_name);
        if let Err(e) = self.recorder.record(&context.pod, &message).await {
            warn!(
                "Failed to emit scheduled event for pod {}: {}",
                context.workload, e
            );
        }
        info!("{}", message);

        Ok(PlacementDecision {
            workload: context.workload,
            node_name: best.node_name,
            score: best.score,
        })
    }

    /// Read nodes and their occupancy from the catalog
    fn snapshot_nodes(&self) -> Result<Vec<NodeInfo>> {
        let nodes = self.catalog.list_nodes()?;
        let mut infos = Vec::with_capacity(nodes.len());

        for node in nodes {
            let Some(name) = node.metadata.name.clone() else {
                warn!("Skipping node without a name");
                continue;
            };

            let capacity = self.accounting.node_capacity(&node);
            let occupied = self
                .catalog
                .list_running_pods(&name)?
                .iter()
                .any(|pod| self.accounting.pod_holds_resource(pod));

            infos.push(NodeInfo {
                name,
                capacity,
                occupied,
                node,
            });
        }

        Ok(infos)
    }

    fn filter_nodes(
        &self,
        context: &SchedulingContext,
        nodes: &[NodeInfo],
    ) -> Result<Vec<NodeInfo>> {
        let mut feasible = Vec::new();
        let mut rejections = Vec::new();

        for node in nodes {
            let rejection = self.filters.iter().find_map(|filter| {
                let result = filter.filter(context, node);
                (!result.passed).then(|| (filter.name(), result.reason.unwrap_or_default()))
            });

            match rejection {
                None => feasible.push(node.clone()),
                Some((filter_name, reason)) => {
                    debug!(
                        "Node {} filtered out by {}: {}",
                        node.name, filter_name, reason
                    );
                    rejections.push(format!("{}: {}", node.name, reason));
                }
            }
        }

        if feasible.is_empty() {
            let mut reason = format!("0/{} nodes are available", nodes.len());
            if !rejections.is_empty() {
                reason.push_str(": ");
                reason.push_str(&rejections.join("; "));
            }
            return Err(SchedulerError::no_feasible_node(
                context.workload.to_string(),
                reason,
            ));
        }

        Ok(feasible)
    }

    fn score_nodes(&self, context: &SchedulingContext, feasible: &[NodeInfo]) -> Vec<ScoreResult> {
        let scores: Vec<ScoreResult> = feasible
            .iter()
            .map(|node| {
                let per_scorer: Vec<ScoreResult> = self
                    .scorers
                    .iter()
                    .map(|scorer| scorer.score(context, node))
                    .collect();
                ScoreResult::new(node.name.clone(), total_score(&per_scorer))
            })
            .collect();

        debug!(
            "Calculated scores for pod {}: {:?}",
            context.workload,
            scores
                .iter()
                .map(|s| (s.node_name.as_str(), s.score))
                .collect::<Vec<_>>()
        );

        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::GpuMemoryFits;
    use crate::mock::{
        running_on, test_node, test_pod, with_container_limit, MockBinder, MockCatalog,
        MockRecorder,
    };
    use crate::queue::{QueueProducer, WorkloadQueue};
    use crate::score::TightestFit;
    use crate::types::FilterResult;
    use gpusched_core::Node;
    use std::time::Duration;

    const RESOURCE: &str = "nvidia.com/gpu-memory";

    struct Harness {
        scheduler: Arc<Scheduler>,
        producer: QueueProducer,
        catalog: Arc<MockCatalog>,
        binder: Arc<MockBinder>,
        recorder: Arc<MockRecorder>,
    }

    fn config() -> SchedulerConfig {
        SchedulerConfig {
            resource_name: RESOURCE.to_string(),
            ..Default::default()
        }
    }

    fn harness_with(catalog: Arc<MockCatalog>, binder: MockBinder) -> Harness {
        let binder = Arc::new(binder);
        let recorder = Arc::new(MockRecorder::new());
        let (producer, consumer) = WorkloadQueue::bounded(16).unwrap();

        let scheduler = Scheduler::new(
            &config(),
            consumer,
            catalog.clone(),
            binder.clone(),
            recorder.clone(),
        );

        Harness {
            scheduler: Arc::new(scheduler),
            producer,
            catalog,
            binder,
            recorder,
        }
    }

    fn harness(nodes: Vec<Node>) -> Harness {
        harness_with(Arc::new(MockCatalog::with_nodes(nodes)), MockBinder::new())
    }

    async fn schedule(h: &Harness, pod: Pod) -> AttemptOutcome {
        h.producer.enqueue(pod).await.unwrap();
        h.scheduler.schedule_one().await.unwrap()
    }

    fn bound_node(outcome: &AttemptOutcome) -> &str {
        match outcome {
            AttemptOutcome::Bound(decision) => &decision.node_name,
            AttemptOutcome::Dropped { error, .. } => panic!("pod was dropped: {}", error),
        }
    }

    #[tokio::test]
    async fn test_tightest_fit_end_to_end() {
        let h = harness(vec![
            test_node("node1", RESOURCE, 8),
            test_node("node2", RESOURCE, 16),
        ]);

        let outcome = schedule(&h, test_pod("default", "p", RESOURCE, 4)).await;

        match &outcome {
            AttemptOutcome::Bound(decision) => {
                assert_eq!(decision.node_name, "node1");
                assert_eq!(decision.score, 4);
                assert_eq!(decision.workload, WorkloadKey::new("default", "p"));
            }
            AttemptOutcome::Dropped { error, .. } => panic!("unexpected drop: {}", error),
        }

        assert_eq!(
            h.binder.bindings().await,
            vec![(WorkloadKey::new("default", "p"), "node1".to_string())]
        );

        let records = h.recorder.records().await;
        assert_eq!(records.len(), 1);
        assert!(records[0].1.contains("default/p"));
        assert!(records[0].1.contains("node1"));
    }

    #[tokio::test]
    async fn test_occupied_node_excluded() {
        let h = harness(vec![
            test_node("node1", RESOURCE, 8),
            test_node("node2", RESOURCE, 16),
        ]);
        h.catalog
            .add_pod(running_on(test_pod("other", "busy", RESOURCE, 1), "node1"));

        let outcome = schedule(&h, test_pod("default", "p", RESOURCE, 4)).await;

        assert_eq!(bound_node(&outcome), "node2");
    }

    #[tokio::test]
    async fn test_running_pod_without_resource_does_not_occupy() {
        let h = harness(vec![
            test_node("node1", RESOURCE, 8),
            test_node("node2", RESOURCE, 16),
        ]);
        h.catalog.add_pod(running_on(
            test_pod("other", "cpu-only", "example.com/other", 1),
            "node1",
        ));

        let outcome = schedule(&h, test_pod("default", "p", RESOURCE, 4)).await;

        assert_eq!(bound_node(&outcome), "node1");
    }

    #[tokio::test]
    async fn test_assigned_but_not_running_pod_does_not_occupy() {
        let h = harness(vec![test_node("node1", RESOURCE, 8)]);
        let mut pending = running_on(test_pod("other", "starting", RESOURCE, 4), "node1");
        pending.status = None;
        h.catalog.add_pod(pending);

        let outcome = schedule(&h, test_pod("default", "p", RESOURCE, 4)).await;

        assert_eq!(bound_node(&outcome), "node1");
    }

    #[tokio::test]
    async fn test_no_capacity_anywhere_drops_without_binding() {
        let h = harness(vec![
            test_node("node1", "example.com/other", 8),
            test_node("node2", RESOURCE, 0),
        ]);

        let outcome = schedule(&h, test_pod("default", "p", RESOURCE, 4)).await;

        match outcome {
            AttemptOutcome::Dropped { workload, error } => {
                assert_eq!(workload, "default/p");
                assert!(matches!(error, SchedulerError::NoFeasibleNode { .. }));
                assert!(error.to_string().contains("0/2 nodes are available"));
            }
            AttemptOutcome::Bound(_) => panic!("pod must not be bound"),
        }
        assert!(h.binder.bindings().await.is_empty());
        assert!(h.recorder.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_capacity_drops() {
        let h = harness(vec![test_node("node1", RESOURCE, 8)]);

        let outcome = schedule(&h, test_pod("default", "big", RESOURCE, 32)).await;

        assert!(!outcome.is_bound());
        assert!(h.binder.bindings().await.is_empty());
    }

    #[tokio::test]
    async fn test_overflowing_request_drops() {
        let h = harness(vec![test_node("node1", RESOURCE, 9_000_000_000_000_000_000)]);
        let pod = with_container_limit(test_pod("default", "huge", RESOURCE, 1), RESOURCE, "8E");
        let pod = with_container_limit(pod, RESOURCE, "8E");

        let outcome = schedule(&h, pod).await;

        match outcome {
            AttemptOutcome::Dropped { workload, error } => {
                assert_eq!(workload, "default/huge");
                assert!(matches!(error, SchedulerError::NoFeasibleNode { .. }));
                assert!(error.to_string().contains("largest representable"));
            }
            AttemptOutcome::Bound(_) => panic!("pod must not be bound"),
        }
        assert!(h.binder.bindings().await.is_empty());
    }

    #[tokio::test]
    async fn test_nodes_added_later_are_considered() {
        let h = harness_with(Arc::new(MockCatalog::new()), MockBinder::new());

        let early = schedule(&h, test_pod("default", "early", RESOURCE, 4)).await;
        assert!(!early.is_bound());

        h.catalog.add_node(test_node("node1", RESOURCE, 8));
        let late = schedule(&h, test_pod("default", "late", RESOURCE, 4)).await;

        assert_eq!(bound_node(&late), "node1");
    }

    #[tokio::test]
    async fn test_no_nodes_drops() {
        let h = harness(vec![]);

        let outcome = schedule(&h, test_pod("default", "p", RESOURCE, 1)).await;

        assert!(matches!(
            outcome,
            AttemptOutcome::Dropped {
                error: SchedulerError::NoFeasibleNode { .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_catalog_failure_drops() {
        let h = harness(vec![test_node("node1", RESOURCE, 8)]);
        h.catalog.set_failing(true);

        let outcome = schedule(&h, test_pod("default", "p", RESOURCE, 4)).await;

        assert!(matches!(
            outcome,
            AttemptOutcome::Dropped {
                error: SchedulerError::CatalogQueryFailure { .. },
                ..
            }
        ));
        assert!(h.binder.bindings().await.is_empty());
    }

    #[tokio::test]
    async fn test_bind_failure_skips_record() {
        let h = harness(vec![test_node("node1", RESOURCE, 8)]);
        h.binder
            .fail_next(SchedulerError::bind_conflict(
                "default/p",
                "node1",
                "pod already assigned",
            ))
            .await;

        let outcome = schedule(&h, test_pod("default", "p", RESOURCE, 4)).await;

        assert!(matches!(
            outcome,
            AttemptOutcome::Dropped {
                error: SchedulerError::BindConflict { .. },
                ..
            }
        ));
        assert!(h.recorder.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_record_failure_keeps_binding() {
        let h = harness(vec![test_node("node1", RESOURCE, 8)]);
        h.recorder.set_failing(true);

        let outcome = schedule(&h, test_pod("default", "p", RESOURCE, 4)).await;

        assert_eq!(bound_node(&outcome), "node1");
        assert_eq!(h.binder.bindings().await.len(), 1);
        assert!(h.recorder.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_tie_break_by_node_name() {
        let h = harness(vec![
            test_node("node-b", RESOURCE, 8),
            test_node("node-c", RESOURCE, 8),
            test_node("node-a", RESOURCE, 8),
        ]);

        let outcome = schedule(&h, test_pod("default", "p", RESOURCE, 4)).await;

        assert_eq!(bound_node(&outcome), "node-a");
    }

    #[tokio::test]
    async fn test_bound_node_becomes_exclusive_once_visible() {
        let catalog = Arc::new(MockCatalog::with_nodes(vec![
            test_node("node1", RESOURCE, 8),
            test_node("node2", RESOURCE, 16),
        ]));
        let binder = MockBinder::new().reflecting_into(catalog.clone());
        let h = harness_with(catalog, binder);

        let first = schedule(&h, test_pod("default", "p1", RESOURCE, 4)).await;
        let second = schedule(&h, test_pod("default", "p2", RESOURCE, 4)).await;
        let third = schedule(&h, test_pod("default", "p3", RESOURCE, 4)).await;

        assert_eq!(bound_node(&first), "node1");
        assert_eq!(bound_node(&second), "node2");
        assert!(!third.is_bound());
    }

    #[tokio::test]
    async fn test_requests_are_per_attempt() {
        let catalog = Arc::new(MockCatalog::with_nodes(vec![
            test_node("node1", RESOURCE, 8),
            test_node("node2", RESOURCE, 16),
        ]));
        let binder = MockBinder::new().reflecting_into(catalog.clone());
        let h = harness_with(catalog, binder);

        let large = schedule(&h, test_pod("default", "large", RESOURCE, 12)).await;
        let small = schedule(&h, test_pod("default", "small", RESOURCE, 2)).await;

        assert_eq!(bound_node(&large), "node2");
        assert_eq!(bound_node(&small), "node1");
        match small {
            AttemptOutcome::Bound(decision) => assert_eq!(decision.score, 6),
            AttemptOutcome::Dropped { .. } => unreachable!(),
        }
    }

    struct RequireLabel(&'static str);

    impl FilterPredicate for RequireLabel {
        fn filter(&self, _context: &SchedulingContext, node: &NodeInfo) -> FilterResult {
            let labelled = node
                .node
                .metadata
                .labels
                .as_ref()
                .is_some_and(|labels| labels.contains_key(self.0));
            if labelled {
                FilterResult::pass(node.name.clone())
            } else {
                FilterResult::fail(node.name.clone(), format!("missing label {}", self.0))
            }
        }

        fn name(&self) -> &str {
            "RequireLabel"
        }
    }

    fn labelled(mut node: Node, key: &str) -> Node {
        node.metadata.labels = Some([(key.to_string(), "true".to_string())].into());
        node
    }

    struct PreferLarge;

    impl ScoreFunction for PreferLarge {
        fn score(&self, _context: &SchedulingContext, node: &NodeInfo) -> ScoreResult {
            ScoreResult::new(node.name.clone(), -2 * node.capacity)
        }

        fn name(&self) -> &str {
            "PreferLarge"
        }
    }

    #[tokio::test]
    async fn test_custom_plugins_are_combined() {
        let nodes = vec![
            labelled(test_node("node1", RESOURCE, 8), "gpu.example.com/pool"),
            labelled(test_node("node2", RESOURCE, 16), "gpu.example.com/pool"),
            test_node("node3", RESOURCE, 32),
        ];
        let catalog = Arc::new(MockCatalog::with_nodes(nodes));
        let binder = Arc::new(MockBinder::new());
        let recorder = Arc::new(MockRecorder::new());
        let (producer, consumer) = WorkloadQueue::bounded(4).unwrap();

        let scheduler = Scheduler::new(&config(), consumer, catalog, binder, recorder)
            .with_plugins(
                vec![Box::new(GpuMemoryFits), Box::new(RequireLabel("gpu.example.com/pool"))],
                vec![Box::new(TightestFit), Box::new(PreferLarge)],
            );

        producer
            .enqueue(test_pod("default", "p", RESOURCE, 4))
            .await
            .unwrap();
        let outcome = scheduler.schedule_one().await.unwrap();

        // node1: 4 - 16 = -12, node2: 12 - 32 = -20, node3 filtered out
        match outcome {
            AttemptOutcome::Bound(decision) => {
                assert_eq!(decision.node_name, "node2");
                assert_eq!(decision.score, -20);
            }
            AttemptOutcome::Dropped { error, .. } => panic!("unexpected drop: {}", error),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_bind_in_flight_under_concurrent_producers() {
        let catalog = Arc::new(MockCatalog::with_nodes(vec![test_node(
            "node1", RESOURCE, 64,
        )]));
        let binder = MockBinder::new().with_delay(Duration::from_millis(2));
        let h = harness_with(catalog, binder);

        let token = CancellationToken::new();
        let loop_handle = {
            let scheduler = h.scheduler.clone();
            let token = token.clone();
            tokio::spawn(async move { scheduler.run(token).await })
        };

        let producers: Vec<_> = (0..4)
            .map(|p| {
                let producer = h.producer.clone();
                tokio::spawn(async move {
                    for i in 0..5 {
                        let pod = test_pod("default", &format!("p{}-{}", p, i), RESOURCE, 4);
                        producer.enqueue(pod).await.unwrap();
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.await.unwrap();
        }

        tokio::time::timeout(Duration::from_secs(10), async {
            while h.binder.bindings().await.len() < 20 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("every pod should be bound");

        token.cancel();
        loop_handle.await.unwrap().unwrap();

        assert_eq!(h.binder.max_in_flight(), 1);
        assert_eq!(h.recorder.records().await.len(), 20);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_schedule_one_calls_serialize() {
        let catalog = Arc::new(MockCatalog::with_nodes(vec![test_node(
            "node1", RESOURCE, 8,
        )]));
        let binder = MockBinder::new().with_delay(Duration::from_millis(20));
        let h = harness_with(catalog, binder);

        h.producer
            .enqueue(test_pod("default", "a", RESOURCE, 1))
            .await
            .unwrap();
        h.producer
            .enqueue(test_pod("default", "b", RESOURCE, 1))
            .await
            .unwrap();

        let first = {
            let scheduler = h.scheduler.clone();
            tokio::spawn(async move { scheduler.schedule_one().await })
        };
        let second = {
            let scheduler = h.scheduler.clone();
            tokio::spawn(async move { scheduler.schedule_one().await })
        };

        assert!(first.await.unwrap().unwrap().is_bound());
        assert!(second.await.unwrap().unwrap().is_bound());
        assert_eq!(h.binder.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel_and_closes_queue() {
        let h = harness(vec![]);
        let token = CancellationToken::new();

        let loop_handle = {
            let scheduler = h.scheduler.clone();
            let token = token.clone();
            tokio::spawn(async move { scheduler.run(token).await })
        };

        token.cancel();
        loop_handle.await.unwrap().unwrap();

        assert!(h.producer.is_closed());
        assert!(matches!(
            h.producer.try_enqueue(test_pod("default", "late", RESOURCE, 1)),
            Err(SchedulerError::QueueClosed)
        ));
    }

    #[tokio::test]
    async fn test_run_stops_when_producers_gone() {
        let h = harness(vec![test_node("node1", RESOURCE, 8)]);
        h.producer
            .enqueue(test_pod("default", "p", RESOURCE, 4))
            .await
            .unwrap();

        let Harness {
            scheduler,
            producer,
            binder,
            ..
        } = h;
        drop(producer);

        scheduler.run(CancellationToken::new()).await.unwrap();

        assert_eq!(binder.bindings().await.len(), 1);
    }
}
