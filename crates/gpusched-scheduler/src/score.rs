use crate::types::{NodeInfo, SchedulingContext, ScoreResult};
use tracing::debug;

/// Scoring function trait
pub trait ScoreFunction: Send + Sync {
    /// Score a node for the pod in `context` (lower is better)
    fn score(&self, context: &SchedulingContext, node: &NodeInfo) -> ScoreResult;

    /// Name of the scoring function
    fn name(&self) -> &str;
}

/// Score by leftover capacity after placement, so the tightest fit wins
pub struct TightestFit;

impl ScoreFunction for TightestFit {
    fn score(&self, context: &SchedulingContext, node: &NodeInfo) -> ScoreResult {
        let leftover = node.capacity.saturating_sub(context.requested);

        debug!(
            "Node {} leftover {}: {} ({} - {})",
            node.name, context.resource_name, leftover, node.capacity, context.requested
        );

        ScoreResult::new(node.name.clone(), leftover)
    }

    fn name(&self) -> &str {
        "TightestFit"
    }
}

/// Get default scoring functions
pub fn default_scores() -> Vec<Box<dyn ScoreFunction>> {
    vec![Box::new(TightestFit)]
}

/// Sum the scores every scorer gave one node
pub fn total_score(scores: &[ScoreResult]) -> i64 {
    scores
        .iter()
        .fold(0i64, |total, s| total.saturating_add(s.score))
}

/// Pick the lowest score; ties go to the lexicographically smallest node name
pub fn select_best_node(scores: &[ScoreResult]) -> Option<&ScoreResult> {
    scores
        .iter()
        .min_by(|a, b| a.score.cmp(&b.score).then_with(|| a.node_name.cmp(&b.node_name)))
}
