use crate::error::Result;
use async_trait::async_trait;
use gpusched_core::{Node, Pod};

/// Read-only view over the locally cached cluster state.
///
/// Implementations answer from a cache that is updated asynchronously, so
/// results may lag behind bindings committed moments earlier.
pub trait NodeCatalog: Send + Sync {
    /// List every node currently known
    fn list_nodes(&self) -> Result<Vec<Node>>;

    /// List pods in phase Running that are assigned to `node_name`
    fn list_running_pods(&self, node_name: &str) -> Result<Vec<Pod>>;
}

/// Commits a placement to the orchestrator
#[async_trait]
pub trait Binder: Send + Sync {
    /// Assign `pod` to `node_name`. Called once per decision, never retried.
    async fn bind(&self, pod: &Pod, node_name: &str) -> Result<()>;
}

/// Publishes a human-readable status note about a pod
#[async_trait]
pub trait EventRecorder: Send + Sync {
    /// Best effort; failures must not affect the placement.
    async fn record(&self, pod: &Pod, message: &str) -> Result<()>;
}
