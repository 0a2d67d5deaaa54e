//! Cluster watcher: keeps the node and pod caches current and feeds the
//! workload queue with pods this scheduler owns.
//!
//! A pod is enqueued the first time it is seen unassigned; later updates of
//! the same pod (tracked by UID) are ignored until it is deleted. Pods whose
//! attempt was dropped are picked up again by the periodic resync.

use crate::catalog::KubeCatalog;
use crate::error::{KubeError, Result};
use futures_util::{future, StreamExt};
use gpusched_core::{Node, Pod, WorkloadKey};
use gpusched_scheduler::{QueueProducer, SchedulerConfig, SchedulerError};
use kube::runtime::reflector::{store::Writer, Store};
use kube::runtime::{reflector, watcher, WatchStreamExt};
use kube::{Api, Client};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;
use tracing::{debug, info, warn};

/// Configuration for the cluster watcher
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Only pods requesting this scheduler are enqueued
    pub scheduler_name: String,
    /// How often pending pods are enqueued again (None disables)
    pub resync_interval: Option<Duration>,
}

impl From<&SchedulerConfig> for WatcherConfig {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            scheduler_name: config.scheduler_name.clone(),
            resync_interval: config.resync_interval(),
        }
    }
}

/// Whether `pod` is unassigned, alive and addressed to `scheduler_name`
pub fn is_schedulable(pod: &Pod, scheduler_name: &str) -> bool {
    let Some(spec) = pod.spec.as_ref() else {
        return false;
    };

    let unassigned = spec.node_name.as_deref().map_or(true, str::is_empty);
    let ours = spec.scheduler_name.as_deref() == Some(scheduler_name);
    let terminating = pod.metadata.deletion_timestamp.is_some();
    let finished = matches!(
        pod.status.as_ref().and_then(|s| s.phase.as_deref()),
        Some("Succeeded") | Some("Failed")
    );

    unassigned && ours && !terminating && !finished
}

fn pod_uid(pod: &Pod) -> Option<&str> {
    pod.metadata.uid.as_deref()
}

fn pod_label(pod: &Pod) -> String {
    WorkloadKey::from_pod(pod)
        .map(|key| key.to_string())
        .unwrap_or_else(|_| "<unnamed>".to_string())
}

/// Decides which pod events turn into queue entries
pub struct PodTracker {
    scheduler_name: String,
    producer: QueueProducer,
    seen: HashSet<String>,
}

impl PodTracker {
    pub fn new(scheduler_name: impl Into<String>, producer: QueueProducer) -> Self {
        Self {
            scheduler_name: scheduler_name.into(),
            producer,
            seen: HashSet::new(),
        }
    }

    /// Handle one pod watch event.
    ///
    /// Returns `QueueClosed` once the scheduler has stopped consuming.
    pub async fn on_event(&mut self, event: &watcher::Event<Pod>) -> gpusched_scheduler::Result<()> {
        match event {
            watcher::Event::Apply(pod) | watcher::Event::InitApply(pod) => {
                self.observe(pod).await?;
            }
            watcher::Event::Delete(pod) => {
                if let Some(uid) = pod_uid(pod) {
                    self.seen.remove(uid);
                }
            }
            watcher::Event::Init => {
                // Relist: forget everything, the list replays every live pod
                self.seen.clear();
            }
            watcher::Event::InitDone => {
                debug!(tracked = self.seen.len(), "Pod list complete");
            }
        }
        Ok(())
    }

    async fn observe(&mut self, pod: &Pod) -> gpusched_scheduler::Result<()> {
        let Some(uid) = pod_uid(pod) else {
            return Ok(());
        };

        if !is_schedulable(pod, &self.scheduler_name) {
            self.seen.remove(uid);
            return Ok(());
        }

        if self.seen.insert(uid.to_string()) {
            info!("Enqueueing pod {}", pod_label(pod));
            self.producer.enqueue(pod.clone()).await?;
        }
        Ok(())
    }

    /// Enqueue every cached pod that is still waiting for placement.
    ///
    /// Uses the non-blocking policy: when the queue fills up the rest wait
    /// for the next resync. Returns the number of pods enqueued.
    pub fn resync(&mut self, pods: &[Arc<Pod>]) -> gpusched_scheduler::Result<usize> {
        let mut enqueued = 0;

        for pod in pods
            .iter()
            .filter(|pod| is_schedulable(pod, &self.scheduler_name))
        {
            match self.producer.try_enqueue(pod.as_ref().clone()) {
                Ok(()) => {
                    if let Some(uid) = pod_uid(pod) {
                        self.seen.insert(uid.to_string());
                    }
                    enqueued += 1;
                }
                Err(SchedulerError::QueueFull { capacity }) => {
                    debug!(capacity, "Workload queue full, deferring remaining pods");
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(enqueued)
    }
}

/// Watches nodes and pods cluster-wide
pub struct ClusterWatcher {
    client: Client,
    config: WatcherConfig,
    producer: QueueProducer,
    nodes: Store<Node>,
    pods: Store<Pod>,
    node_writer: Writer<Node>,
    pod_writer: Writer<Pod>,
}

impl ClusterWatcher {
    pub fn new(client: Client, config: WatcherConfig, producer: QueueProducer) -> Self {
        let (nodes, node_writer) = reflector::store();
        let (pods, pod_writer) = reflector::store();

        Self {
            client,
            config,
            producer,
            nodes,
            pods,
            node_writer,
            pod_writer,
        }
    }

    /// Catalog reading from this watcher's caches
    pub fn catalog(&self) -> KubeCatalog {
        KubeCatalog::new(self.nodes.clone(), self.pods.clone())
    }

    /// Run until cancelled or until the scheduler stops consuming.
    ///
    /// Each reflector is driven on its own task, so the caches keep following
    /// the cluster while this loop waits for room in a full queue.
    pub async fn run(self, token: CancellationToken) -> Result<()> {
        let Self {
            client,
            config,
            producer,
            pods,
            node_writer,
            pod_writer,
            ..
        } = self;

        info!(
            scheduler = %config.scheduler_name,
            resync = ?config.resync_interval,
            "Starting cluster watcher"
        );

        let node_api: Api<Node> = Api::all(client.clone());
        let pod_api: Api<Pod> = Api::all(client);

        let mut known_nodes = HashSet::new();
        let mut node_reflector = AbortOnDropHandle::new(tokio::spawn(
            reflector(node_writer, watcher(node_api, watcher::Config::default()))
                .default_backoff()
                .for_each(move |event| {
                    match event {
                        Ok(event) => observe_node(&mut known_nodes, &event),
                        Err(e) => warn!("Node watch error: {} - will retry", e),
                    }
                    future::ready(())
                }),
        ));

        let (pod_tx, mut pod_events) = mpsc::unbounded_channel();
        let scheduler_name = config.scheduler_name.clone();
        let mut pod_reflector = AbortOnDropHandle::new(tokio::spawn(
            reflector(pod_writer, watcher(pod_api, watcher::Config::default()))
                .default_backoff()
                .for_each(move |event| {
                    match event {
                        Ok(event) => {
                            if is_relevant(&event, &scheduler_name) {
                                let _ = pod_tx.send(event);
                            }
                        }
                        Err(e) => warn!("Pod watch error: {} - will retry", e),
                    }
                    future::ready(())
                }),
        ));

        let mut tracker = PodTracker::new(config.scheduler_name.clone(), producer);
        let mut resync = config.resync_interval.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!("Cluster watcher shutting down");
                    return Ok(());
                }
                result = &mut node_reflector => return Err(reflector_stopped("node", result)),
                result = &mut pod_reflector => return Err(reflector_stopped("pod", result)),
                event = pod_events.recv() => {
                    let Some(event) = event else {
                        return Err(KubeError::watch_failed("pod event channel closed"));
                    };

                    // Enqueue may wait for room; stay responsive to shutdown
                    let handled = tokio::select! {
                        _ = token.cancelled() => {
                            info!("Cluster watcher shutting down");
                            return Ok(());
                        }
                        result = tracker.on_event(&event) => result,
                    };
                    if stop_on_closed(handled)? {
                        return Ok(());
                    }
                }
                _ = next_tick(&mut resync) => {
                    let result = tracker.resync(&pods.state());
                    if let Ok(count) = &result {
                        if *count > 0 {
                            info!("Resync enqueued {} pending pods", count);
                        }
                    }
                    if stop_on_closed(result.map(|_| ()))? {
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Whether the tracker needs to see `event`.
///
/// Updates of pods that are not ours or already assigned are dropped here so
/// the hand-off channel only grows with pending pods.
fn is_relevant(event: &watcher::Event<Pod>, scheduler_name: &str) -> bool {
    match event {
        watcher::Event::Apply(pod) | watcher::Event::InitApply(pod) => {
            is_schedulable(pod, scheduler_name)
        }
        watcher::Event::Delete(_) | watcher::Event::Init | watcher::Event::InitDone => true,
    }
}

fn reflector_stopped(kind: &str, result: std::result::Result<(), JoinError>) -> KubeError {
    match result {
        Ok(()) => KubeError::watch_failed(format!("{} watch stream ended", kind)),
        Err(e) => KubeError::watch_failed(format!("{} reflector task failed: {}", kind, e)),
    }
}

/// `Ok(true)` when the queue has been closed by the scheduler
fn stop_on_closed(result: gpusched_scheduler::Result<()>) -> Result<bool> {
    match result {
        Ok(()) => Ok(false),
        Err(SchedulerError::QueueClosed) => {
            info!("Workload queue closed, cluster watcher stopping");
            Ok(true)
        }
        Err(e) => Err(e.into()),
    }
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn observe_node(known: &mut HashSet<String>, event: &watcher::Event<Node>) {
    match event {
        watcher::Event::Apply(node) | watcher::Event::InitApply(node) => {
            if let Some(name) = node.metadata.name.as_deref() {
                if known.insert(name.to_string()) {
                    info!("Observed node {}", name);
                }
            }
        }
        watcher::Event::Delete(node) => {
            if let Some(name) = node.metadata.name.as_deref() {
                known.remove(name);
                info!("Node {} removed", name);
            }
        }
        watcher::Event::Init => {}
        watcher::Event::InitDone => {
            debug!(nodes = known.len(), "Node list complete");
        }
    }
}
