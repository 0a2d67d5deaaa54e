use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gpusched_core::{ObjectMeta, Pod, WorkloadKey};
use gpusched_scheduler::{EventRecorder, SchedulerError};
use k8s_openapi::api::core::v1::{Event, EventSource, ObjectReference};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::api::PostParams;
use kube::{Api, Client};
use tracing::debug;

const SCHEDULED_REASON: &str = "Scheduled";
const NORMAL_EVENT_TYPE: &str = "Normal";

/// Publishes `Scheduled` events against placed pods
pub struct KubeEventRecorder {
    client: Client,
    component: String,
}

impl KubeEventRecorder {
    /// `component` is reported as the event source, normally the scheduler name
    pub fn new(client: Client, component: impl Into<String>) -> Self {
        Self {
            client,
            component: component.into(),
        }
    }
}

/// Build a `Scheduled` event for `pod` stamped with `now`
pub fn build_event(
    workload: &WorkloadKey,
    pod: &Pod,
    message: &str,
    component: &str,
    now: DateTime<Utc>,
) -> Event {
    Event {
        metadata: ObjectMeta {
            generate_name: Some(format!("{}-", workload.name)),
            namespace: Some(workload.namespace.clone()),
            ..Default::default()
        },
        involved_object: ObjectReference {
            api_version: Some("v1".to_string()),
            kind: Some("Pod".to_string()),
            name: Some(workload.name.clone()),
            namespace: Some(workload.namespace.clone()),
            uid: pod.metadata.uid.clone(),
            ..Default::default()
        },
        reason: Some(SCHEDULED_REASON.to_string()),
        message: Some(message.to_string()),
        type_: Some(NORMAL_EVENT_TYPE.to_string()),
        count: Some(1),
        first_timestamp: Some(Time(now)),
        last_timestamp: Some(Time(now)),
        source: Some(EventSource {
            component: Some(component.to_string()),
            host: None,
        }),
        ..Default::default()
    }
}

#[async_trait]
impl EventRecorder for KubeEventRecorder {
    async fn record(&self, pod: &Pod, message: &str) -> gpusched_scheduler::Result<()> {
        let workload = WorkloadKey::from_pod(pod)?;
        let event = build_event(&workload, pod, message, &self.component, Utc::now());

        let api: Api<Event> = Api::namespaced(self.client.clone(), &workload.namespace);
        api.create(&PostParams::default(), &event)
            .await
            .map_err(|e| SchedulerError::record_failure(workload.to_string(), e.to_string()))?;

        debug!("Recorded {} event for {}", SCHEDULED_REASON, workload);
        Ok(())
    }
}
