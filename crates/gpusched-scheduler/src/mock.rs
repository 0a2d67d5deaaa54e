//! In-memory collaborators for exercising the decision loop without a cluster.

use crate::error::{Result, SchedulerError};
use crate::traits::{Binder, EventRecorder, NodeCatalog};
use async_trait::async_trait;
use gpusched_core::{Node, Pod, Quantity, WorkloadKey};
use k8s_openapi::api::core::v1::{Container, NodeStatus, PodStatus, ResourceRequirements};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Build a node advertising `capacity` of `resource_name`
pub fn test_node(name: &str, resource_name: &str, capacity: i64) -> Node {
    let mut node = Node::default();
    node.metadata.name = Some(name.to_string());
    node.status = Some(NodeStatus {
        capacity: Some(BTreeMap::from([(
            resource_name.to_string(),
            Quantity(capacity.to_string()),
        )])),
        ..Default::default()
    });
    node
}

/// Build an unassigned pod with one container limited to `request`
pub fn test_pod(namespace: &str, name: &str, resource_name: &str, request: i64) -> Pod {
    let mut pod = Pod::default();
    pod.metadata.name = Some(name.to_string());
    pod.metadata.namespace = Some(namespace.to_string());
    pod.metadata.uid = Some(format!("uid-{}-{}", namespace, name));
    with_container_limit(pod, resource_name, &request.to_string())
}

/// Append a container whose limit for `resource_name` is `value`
pub fn with_container_limit(mut pod: Pod, resource_name: &str, value: &str) -> Pod {
    let spec = pod.spec.get_or_insert_with(Default::default);
    let index = spec.containers.len();
    spec.containers.push(Container {
        name: format!("c{}", index),
        resources: Some(ResourceRequirements {
            limits: Some(BTreeMap::from([(
                resource_name.to_string(),
                Quantity(value.to_string()),
            )])),
            ..Default::default()
        }),
        ..Default::default()
    });
    pod
}

/// Mark a pod as Running on `node_name`
pub fn running_on(mut pod: Pod, node_name: &str) -> Pod {
    pod.spec.get_or_insert_with(Default::default).node_name = Some(node_name.to_string());
    pod.status = Some(PodStatus {
        phase: Some("Running".to_string()),
        ..Default::default()
    });
    pod
}

/// Node catalog backed by in-memory lists
#[derive(Default)]
pub struct MockCatalog {
    nodes: RwLock<Vec<Node>>,
    pods: RwLock<Vec<Pod>>,
    failing: AtomicBool,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nodes(nodes: Vec<Node>) -> Self {
        Self {
            nodes: RwLock::new(nodes),
            ..Default::default()
        }
    }

    pub fn add_node(&self, node: Node) {
        if let Ok(mut nodes) = self.nodes.write() {
            nodes.push(node);
        }
    }

    pub fn add_pod(&self, pod: Pod) {
        if let Ok(mut pods) = self.pods.write() {
            pods.push(pod);
        }
    }

    /// Make every subsequent query fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SchedulerError::catalog_query_failure(
                "mock catalog unavailable",
            ));
        }
        Ok(())
    }
}

impl NodeCatalog for MockCatalog {
    fn list_nodes(&self) -> Result<Vec<Node>> {
        self.check()?;
        let nodes = self
            .nodes
            .read()
            .map_err(|_| SchedulerError::catalog_query_failure("node list lock poisoned"))?;
        Ok(nodes.clone())
    }

    fn list_running_pods(&self, node_name: &str) -> Result<Vec<Pod>> {
        self.check()?;
        let pods = self
            .pods
            .read()
            .map_err(|_| SchedulerError::catalog_query_failure("pod list lock poisoned"))?;

        Ok(pods
            .iter()
            .filter(|p| {
                p.spec.as_ref().and_then(|s| s.node_name.as_deref()) == Some(node_name)
                    && p.status.as_ref().and_then(|s| s.phase.as_deref()) == Some("Running")
            })
            .cloned()
            .collect())
    }
}

/// Binder that records calls and can fail on demand.
///
/// When built with [`MockBinder::reflecting_into`], every successful binding
/// also shows up in the catalog as a Running pod, emulating a cache that has
/// caught up.
#[derive(Default)]
pub struct MockBinder {
    bindings: Mutex<Vec<(WorkloadKey, String)>>,
    failure: Mutex<Option<SchedulerError>>,
    delay: Option<Duration>,
    catalog: Option<Arc<MockCatalog>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep inside every bind call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Publish successful bindings into `catalog`
    pub fn reflecting_into(mut self, catalog: Arc<MockCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Fail the next bind call with `error`
    pub async fn fail_next(&self, error: SchedulerError) {
        *self.failure.lock().await = Some(error);
    }

    pub async fn bindings(&self) -> Vec<(WorkloadKey, String)> {
        self.bindings.lock().await.clone()
    }

    /// Highest number of bind calls ever observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Binder for MockBinder {
    async fn bind(&self, pod: &Pod, node_name: &str) -> Result<()> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failure.lock().await.take();
        let result = match failure {
            Some(error) => Err(error),
            None => self.commit(pod, node_name).await,
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl MockBinder {
    async fn commit(&self, pod: &Pod, node_name: &str) -> Result<()> {
        let key = WorkloadKey::from_pod(pod)?;
        debug!("Mock: bound {} to {}", key, node_name);
        self.bindings
            .lock()
            .await
            .push((key, node_name.to_string()));
        if let Some(catalog) = &self.catalog {
            catalog.add_pod(running_on(pod.clone(), node_name));
        }
        Ok(())
    }
}

/// Event recorder that keeps every message
#[derive(Default)]
pub struct MockRecorder {
    records: Mutex<Vec<(WorkloadKey, String)>>,
    failing: AtomicBool,
}

impl MockRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn records(&self) -> Vec<(WorkloadKey, String)> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl EventRecorder for MockRecorder {
    async fn record(&self, pod: &Pod, message: &str) -> Result<()> {
        let key = WorkloadKey::from_pod(pod)?;
        if self.failing.load(Ordering::SeqCst) {
            return Err(SchedulerError::record_failure(
                key.to_string(),
                "mock recorder unavailable",
            ));
        }
        self.records.lock().await.push((key, message.to_string()));
        Ok(())
    }
}
