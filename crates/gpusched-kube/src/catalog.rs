//! Node catalog backed by reflector caches.
//!
//! Reads never hit the API server: both lists come from the in-memory stores
//! kept current by the cluster watcher, so a fresh bind only becomes visible
//! here once the pod watch delivers it.

use crate::error::{KubeError, Result};
use gpusched_core::{Node, Pod};
use gpusched_scheduler::NodeCatalog;
use kube::runtime::reflector::Store;
use std::time::Duration;
use tracing::info;

/// Pod phase that marks a pod as holding node resources
const RUNNING_PHASE: &str = "Running";

#[derive(Clone)]
pub struct KubeCatalog {
    nodes: Store<Node>,
    pods: Store<Pod>,
}

impl KubeCatalog {
    pub fn new(nodes: Store<Node>, pods: Store<Pod>) -> Self {
        Self { nodes, pods }
    }

    /// Wait until both caches have completed their initial list
    pub async fn wait_until_ready(&self, timeout: Duration) -> Result<()> {
        let ready = async {
            self.nodes.wait_until_ready().await?;
            self.pods.wait_until_ready().await
        };

        match tokio::time::timeout(timeout, ready).await {
            Ok(Ok(())) => {
                info!(
                    nodes = self.nodes.state().len(),
                    pods = self.pods.state().len(),
                    "Cluster caches synced"
                );
                Ok(())
            }
            Ok(Err(e)) => Err(KubeError::watch_failed(format!(
                "reflector stopped before the initial list completed: {}",
                e
            ))),
            Err(_) => Err(KubeError::CacheSyncTimeout {
                timeout_secs: timeout.as_secs(),
            }),
        }
    }
}

impl NodeCatalog for KubeCatalog {
    fn list_nodes(&self) -> gpusched_scheduler::Result<Vec<Node>> {
        let mut nodes: Vec<Node> = self
            .nodes
            .state()
            .iter()
            .map(|node| node.as_ref().clone())
            .collect();
        nodes.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));
        Ok(nodes)
    }

    fn list_running_pods(&self, node_name: &str) -> gpusched_scheduler::Result<Vec<Pod>> {
        Ok(self
            .pods
            .state()
            .iter()
            .filter(|pod| {
                pod.spec.as_ref().and_then(|s| s.node_name.as_deref()) == Some(node_name)
                    && pod.status.as_ref().and_then(|s| s.phase.as_deref())
                        == Some(RUNNING_PHASE)
            })
            .map(|pod| pod.as_ref().clone())
            .collect())
    }
}
