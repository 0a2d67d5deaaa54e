// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Scheduler error type
#[derive(Error, Debug, Diagnostic)]
pub enum SchedulerError {
    /// Listing nodes or pods from the catalog failed
    #[error("Catalog query failed: {message}")]
    #[diagnostic(
        code(scheduler::catalog_query_failure),
        help("Check that the node and pod caches are synced and the API server is reachable")
    )]
    CatalogQueryFailure { message: String },

    /// No node passed the filters
    #[error("No feasible node for pod {pod_name}: {reason}")]
    #[diagnostic(
        code(scheduler::no_feasible_node),
        help("Check node capacity for the tracked resource and whether GPU nodes are already occupied")
    )]
    NoFeasibleNode { pod_name: String, reason: String },

    /// The pod was already bound or changed underneath us
    #[error("Binding pod {pod_name} to node {node_name} conflicted: {message}")]
    #[diagnostic(
        code(scheduler::bind_conflict),
        help("The pod was assigned concurrently or recreated; it will be re-observed if still unassigned")
    )]
    BindConflict {
        pod_name: String,
        node_name: String,
        message: String,
    },

    /// The binding call failed
    #[error("Binding pod {pod_name} to node {node_name} failed: {message}")]
    #[diagnostic(
        code(scheduler::bind_failure),
        help("Check that the pod still exists and the scheduler has permission to create pods/binding")
    )]
    BindFailure {
        pod_name: String,
        node_name: String,
        message: String,
    },

    /// Publishing the scheduling event failed
    #[error("Recording event for pod {pod_name} failed: {message}")]
    #[diagnostic(
        code(scheduler::record_failure),
        help("Check that the scheduler has permission to create events")
    )]
    RecordFailure { pod_name: String, message: String },

    /// The queue is at capacity
    #[error("Workload queue is full (capacity {capacity})")]
    #[diagnostic(
        code(scheduler::queue_full),
        help("Use the blocking enqueue or raise queueCapacity")
    )]
    QueueFull { capacity: usize },

    /// The queue has been closed
    #[error("Workload queue is closed")]
    #[diagnostic(
        code(scheduler::queue_closed),
        help("The scheduler is shutting down and no longer accepts workloads")
    )]
    QueueClosed,

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(scheduler::invalid_config), help("{suggestion}"))]
    InvalidConfig { message: String, suggestion: String },

    /// Core error
    #[error("Core error: {0}")]
    #[diagnostic(code(scheduler::core_error), help("This is an internal error"))]
    CoreError(#[from] gpusched_core::GpuschedError),
}

/// Result type for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;

impl SchedulerError {
    /// Create a CatalogQueryFailure error
    pub fn catalog_query_failure(message: impl Into<String>) -> Self {
        Self::CatalogQueryFailure {
            message: message.into(),
        }
    }

    /// Create a NoFeasibleNode error
    pub fn no_feasible_node(pod_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NoFeasibleNode {
            pod_name: pod_name.into(),
            reason: reason.into(),
        }
    }

    /// Create a BindConflict error
    pub fn bind_conflict(
        pod_name: impl Into<String>,
        node_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::BindConflict {
            pod_name: pod_name.into(),
            node_name: node_name.into(),
            message: message.into(),
        }
    }

    /// Create a BindFailure error
    pub fn bind_failure(
        pod_name: impl Into<String>,
        node_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::BindFailure {
            pod_name: pod_name.into(),
            node_name: node_name.into(),
            message: message.into(),
        }
    }

    /// Create a RecordFailure error
    pub fn record_failure(pod_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RecordFailure {
            pod_name: pod_name.into(),
            message: message.into(),
        }
    }

    /// Create an InvalidConfig error
    pub fn invalid_config(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }
}
