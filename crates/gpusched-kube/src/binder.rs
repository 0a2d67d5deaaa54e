use async_trait::async_trait;
use gpusched_core::{ObjectMeta, Pod, WorkloadKey};
use gpusched_scheduler::{Binder, SchedulerError};
use k8s_openapi::api::core::v1::{Binding, ObjectReference};
use kube::api::PostParams;
use kube::{Api, Client};
use tracing::debug;

/// HTTP status the API server returns when the pod is already bound
const CONFLICT: u16 = 409;

/// Binds pods through the `pods/binding` subresource
pub struct KubeBinder {
    client: Client,
}

impl KubeBinder {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Build the `Binding` that assigns `pod` to `node_name`
pub fn build_binding(workload: &WorkloadKey, node_name: &str) -> Binding {
    Binding {
        metadata: ObjectMeta {
            name: Some(workload.name.clone()),
            namespace: Some(workload.namespace.clone()),
            ..Default::default()
        },
        target: ObjectReference {
            api_version: Some("v1".to_string()),
            kind: Some("Node".to_string()),
            name: Some(node_name.to_string()),
            ..Default::default()
        },
    }
}

#[async_trait]
impl Binder for KubeBinder {
    async fn bind(&self, pod: &Pod, node_name: &str) -> gpusched_scheduler::Result<()> {
        let workload = WorkloadKey::from_pod(pod)?;
        let binding = build_binding(&workload, node_name);
        let body = serde_json::to_vec(&binding).map_err(|e| {
            SchedulerError::bind_failure(
                workload.to_string(),
                node_name,
                format!("failed to encode binding: {}", e),
            )
        })?;

        debug!("POST binding {} -> {}", workload, node_name);

        let api: Api<Pod> = Api::namespaced(self.client.clone(), &workload.namespace);
        match api
            .create_subresource::<serde_json::Value>(
                "binding",
                &workload.name,
                &PostParams::default(),
                body,
            )
            .await
        {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(response)) if response.code == CONFLICT => Err(
                SchedulerError::bind_conflict(workload.to_string(), node_name, response.message),
            ),
            Err(e) => Err(SchedulerError::bind_failure(
                workload.to_string(),
                node_name,
                e.to_string(),
            )),
        }
    }
}
