use gpusched_core::{quantity_value, Node, Pod, Quantity};
use std::collections::BTreeMap;
use tracing::warn;

/// Reads the tracked device resource off nodes and pods.
///
/// Every capacity and request the scheduler looks at goes through the single
/// resource name held here.
#[derive(Debug, Clone)]
pub struct ResourceAccounting {
    resource_name: String,
}

impl ResourceAccounting {
    pub fn new(resource_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
        }
    }

    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    /// Total request of a pod: the sum of its containers' limits.
    ///
    /// `None` when the sum overflows; no node can satisfy such a request.
    pub fn pod_request(&self, pod: &Pod) -> Option<i64> {
        container_limits(pod)
            .map(|limits| self.value_in(limits))
            .try_fold(0i64, i64::checked_add)
    }

    /// Whether any container of the pod holds a nonzero limit
    pub fn pod_holds_resource(&self, pod: &Pod) -> bool {
        container_limits(pod).any(|limits| self.value_in(limits) != 0)
    }

    /// Capacity the node advertises in `status.capacity`
    pub fn node_capacity(&self, node: &Node) -> i64 {
        self.value_in(node.status.as_ref().and_then(|s| s.capacity.as_ref()))
    }

    fn value_in(&self, resources: Option<&BTreeMap<String, Quantity>>) -> i64 {
        let Some(quantity) = resources.and_then(|r| r.get(&self.resource_name)) else {
            return 0;
        };

        match quantity_value(quantity) {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    resource = %self.resource_name,
                    error = %e,
                    "Ignoring unparseable quantity"
                );
                0
            }
        }
    }
}

fn container_limits(pod: &Pod) -> impl Iterator<Item = Option<&BTreeMap<String, Quantity>>> {
    pod.spec
        .iter()
        .flat_map(|spec| spec.containers.iter())
        .map(|c| c.resources.as_ref().and_then(|r| r.limits.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{test_node, test_pod, with_container_limit};

    const RESOURCE: &str = "nvidia.com/gpu-memory";

    #[test]
    fn test_pod_request_sums_container_limits() {
        let pod = with_container_limit(test_pod("default", "p", RESOURCE, 4), RESOURCE, "3");
        let accounting = ResourceAccounting::new(RESOURCE);

        assert_eq!(accounting.pod_request(&pod), Some(7));
        assert!(accounting.pod_holds_resource(&pod));
    }

    #[test]
    fn test_pod_without_limit_requests_nothing() {
        let pod = test_pod("default", "p", "example.com/other", 4);
        let accounting = ResourceAccounting::new(RESOURCE);

        assert_eq!(accounting.pod_request(&pod), Some(0));
        assert!(!accounting.pod_holds_resource(&pod));
    }

    #[test]
    fn test_node_capacity() {
        let accounting = ResourceAccounting::new(RESOURCE);

        assert_eq!(accounting.node_capacity(&test_node("n1", RESOURCE, 16)), 16);
        assert_eq!(
            accounting.node_capacity(&test_node("n2", "example.com/other", 16)),
            0
        );
        assert_eq!(accounting.node_capacity(&Node::default()), 0);
    }

    #[test]
    fn test_unparseable_limit_counts_as_zero() {
        let pod = with_container_limit(Pod::default(), RESOURCE, "lots");
        let accounting = ResourceAccounting::new(RESOURCE);

        assert_eq!(accounting.pod_request(&pod), Some(0));
    }

    #[test]
    fn test_pod_request_overflow_is_none() {
        let pod = with_container_limit(Pod::default(), RESOURCE, "8E");
        let pod = with_container_limit(pod, RESOURCE, "8E");
        let accounting = ResourceAccounting::new(RESOURCE);

        assert_eq!(accounting.pod_request(&pod), None);
        assert!(accounting.pod_holds_resource(&pod));
    }
}
