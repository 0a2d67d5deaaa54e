//! Cluster adapters for the gpusched decision loop: reflector-backed node
//! catalog, binding and event clients, and the watcher feeding the queue.

// Allow unused assignments for diagnostic fields - they're used by the thiserror/miette macros
#![allow(unused_assignments)]

pub mod binder;
pub mod catalog;
pub mod client;
pub mod error;
pub mod recorder;
pub mod watch;

pub use binder::KubeBinder;
pub use catalog::KubeCatalog;
pub use client::init_kube_client;
pub use error::{KubeError, Result};
pub use recorder::KubeEventRecorder;
pub use watch::{is_schedulable, ClusterWatcher, PodTracker, WatcherConfig};
