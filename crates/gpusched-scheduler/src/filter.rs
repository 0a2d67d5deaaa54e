use crate::types::{FilterResult, NodeInfo, SchedulingContext};
use tracing::debug;

/// Filter predicate trait
pub trait FilterPredicate: Send + Sync {
    /// Filter a node for the pod in `context`
    fn filter(&self, context: &SchedulingContext, node: &NodeInfo) -> FilterResult;

    /// Name of the filter
    fn name(&self) -> &str;
}

/// Filter for exclusive GPU memory placement.
///
/// A node is rejected when it advertises none of the tracked resource, when
/// a running pod already holds some of it, or when its capacity is below the
/// pod's request.
pub struct GpuMemoryFits;

impl FilterPredicate for GpuMemoryFits {
    fn filter(&self, context: &SchedulingContext, node: &NodeInfo) -> FilterResult {
        debug!(
            "Node {} has {} {}, occupied: {}",
            node.name, node.capacity, context.resource_name, node.occupied
        );

        if node.capacity <= 0 {
            return FilterResult::fail(
                node.name.clone(),
                format!("Node advertises no {}", context.resource_name),
            );
        }

        if node.occupied {
            return FilterResult::fail(
                node.name.clone(),
                format!(
                    "Node already runs a pod holding {}",
                    context.resource_name
                ),
            );
        }

        if node.capacity < context.requested {
            return FilterResult::fail(
                node.name.clone(),
                format!(
                    "Insufficient {}: requested {}, available {}",
                    context.resource_name, context.requested, node.capacity
                ),
            );
        }

        FilterResult::pass(node.name.clone())
    }

    fn name(&self) -> &str {
        "GpuMemoryFits"
    }
}

/// Get default filter predicates
pub fn default_filters() -> Vec<Box<dyn FilterPredicate>> {
    vec![Box::new(GpuMemoryFits)]
}
