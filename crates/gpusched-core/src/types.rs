use crate::error::{GpuschedError, Result};
use k8s_openapi::api::core::v1::Pod;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace assumed for pods that do not carry one
pub const DEFAULT_NAMESPACE: &str = "default";

/// WorkloadKey identifies a pod by namespace and name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkloadKey {
    /// Namespace of the pod
    pub namespace: String,
    /// Name of the pod
    pub name: String,
}

impl WorkloadKey {
    /// Create a new workload key
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Build the key for a pod, defaulting the namespace
    pub fn from_pod(pod: &Pod) -> Result<Self> {
        let name = pod.metadata.name.as_deref().ok_or_else(|| {
            GpuschedError::invalid_resource(
                "Pod has no name",
                "Pods delivered to the scheduler must carry metadata.name",
            )
        })?;
        let namespace = pod
            .metadata
            .namespace
            .as_deref()
            .unwrap_or(DEFAULT_NAMESPACE);

        Ok(Self::new(namespace, name))
    }
}

impl fmt::Display for WorkloadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
