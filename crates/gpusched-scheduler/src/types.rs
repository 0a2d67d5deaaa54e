use crate::error::SchedulerError;
use gpusched_core::{Node, Pod, WorkloadKey};

/// Per-attempt scheduling context.
///
/// Built once for every dequeued pod and handed by reference to each filter
/// and scorer; it is dropped when the attempt ends, so a computed request is
/// never visible to a later attempt.
#[derive(Debug, Clone)]
pub struct SchedulingContext {
    /// Pod to be scheduled
    pub pod: Pod,
    /// Identity of the pod
    pub workload: WorkloadKey,
    /// Name of the tracked resource
    pub resource_name: String,
    /// Resource request of the pod, summed over its containers' limits
    pub requested: i64,
}

impl SchedulingContext {
    /// Create a new scheduling context
    pub fn new(
        pod: Pod,
        workload: WorkloadKey,
        resource_name: impl Into<String>,
        requested: i64,
    ) -> Self {
        Self {
            pod,
            workload,
            resource_name: resource_name.into(),
            requested,
        }
    }
}

/// Point-in-time view of a node, recomputed from the catalog on every attempt
#[derive(Debug, Clone)]
pub struct NodeInfo {
    /// Node name
    pub name: String,
    /// Advertised capacity of the tracked resource
    pub capacity: i64,
    /// Whether a running pod on the node already holds the tracked resource
    pub occupied: bool,
    /// The node object as seen in the catalog
    pub node: Node,
}

/// Result of filtering a node
#[derive(Debug, Clone)]
pub struct FilterResult {
    /// Node name
    pub node_name: String,
    /// Whether the node passed the filter
    pub passed: bool,
    /// Reason for failure (if any)
    pub reason: Option<String>,
}

impl FilterResult {
    /// Create a passing filter result
    pub fn pass(node_name: String) -> Self {
        Self {
            node_name,
            passed: true,
            reason: None,
        }
    }

    /// Create a failing filter result
    pub fn fail(node_name: String, reason: String) -> Self {
        Self {
            node_name,
            passed: false,
            reason: Some(reason),
        }
    }
}

/// Result of scoring a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreResult {
    /// Node name
    pub node_name: String,
    /// Score (lower is better)
    pub score: i64,
}

impl ScoreResult {
    /// Create a new score result
    pub fn new(node_name: String, score: i64) -> Self {
        Self { node_name, score }
    }
}

/// The node chosen for a pod in one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementDecision {
    pub workload: WorkloadKey,
    pub node_name: String,
    pub score: i64,
}

/// What became of one dequeued pod
#[derive(Debug)]
pub enum AttemptOutcome {
    /// The pod was bound to a node
    Bound(PlacementDecision),
    /// The attempt was abandoned; the pod stays unassigned
    Dropped {
        workload: String,
        error: SchedulerError,
    },
}

impl AttemptOutcome {
    pub fn is_bound(&self) -> bool {
        matches!(self, Self::Bound(_))
    }
}
