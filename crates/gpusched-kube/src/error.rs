use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while talking to the cluster
#[derive(Error, Debug, Diagnostic)]
pub enum KubeError {
    /// Could not build a client
    #[error("Failed to connect to the cluster: {message}")]
    #[diagnostic(
        code(gpusched::kube::connection_failed),
        help("Check the kubeconfig path (--kubeconfig or KUBECONFIG) or run inside the cluster with a service account")
    )]
    ConnectionFailed {
        #[allow(unused)]
        message: String,
    },

    /// A watch stream stopped for good
    #[error("Watch failed: {message}")]
    #[diagnostic(
        code(gpusched::kube::watch_failed),
        help("Verify the service account may list and watch nodes and pods cluster-wide")
    )]
    WatchFailed {
        #[allow(unused)]
        message: String,
    },

    /// Reflectors did not finish their initial list in time
    #[error("Node and pod caches did not sync within {timeout_secs}s")]
    #[diagnostic(
        code(gpusched::kube::cache_sync_timeout),
        help("The API server may be slow or unreachable. Check connectivity and RBAC for list/watch on nodes and pods")
    )]
    CacheSyncTimeout {
        #[allow(unused)]
        timeout_secs: u64,
    },

    /// Scheduler error
    #[error(transparent)]
    #[diagnostic(transparent)]
    SchedulerError(#[from] gpusched_scheduler::SchedulerError),
}

/// Result type alias for cluster operations
pub type Result<T> = std::result::Result<T, KubeError>;

impl KubeError {
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
        }
    }

    pub fn watch_failed(message: impl Into<String>) -> Self {
        Self::WatchFailed {
            message: message.into(),
        }
    }
}
