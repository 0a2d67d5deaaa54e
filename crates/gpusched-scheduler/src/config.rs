use crate::error::{Result, SchedulerError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_SCHEDULER_NAME: &str = "vgpu-scheduler";
pub const DEFAULT_RESOURCE_NAME: &str = "nvidia.com/gpu-memory";
pub const DEFAULT_QUEUE_CAPACITY: usize = 300;
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 60;

/// Configuration for the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Pods whose `spec.schedulerName` matches this are ours
    pub scheduler_name: String,
    /// Extended resource read from node capacity and container limits
    pub resource_name: String,
    /// Maximum number of pods waiting for a decision
    pub queue_capacity: usize,
    /// Seconds between re-enqueues of still-pending pods (0 disables)
    pub resync_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            scheduler_name: DEFAULT_SCHEDULER_NAME.to_string(),
            resource_name: DEFAULT_RESOURCE_NAME.to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            resync_interval_secs: DEFAULT_RESYNC_INTERVAL_SECS,
        }
    }
}

impl SchedulerConfig {
    /// Load a YAML configuration file; missing fields take their defaults
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            SchedulerError::invalid_config(
                format!("cannot read config file '{}': {}", path.display(), e),
                "Check the --config path and file permissions",
            )
        })?;

        let config: Self = gpusched_core::from_yaml(&data)?;
        Ok(config)
    }

    /// Reject configurations the scheduler cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.scheduler_name.trim().is_empty() {
            return Err(SchedulerError::invalid_config(
                "schedulerName is empty",
                "Set schedulerName to the value pods use in spec.schedulerName",
            ));
        }

        if self.resource_name.trim().is_empty() {
            return Err(SchedulerError::invalid_config(
                "resourceName is empty",
                "Set resourceName to the extended resource nodes advertise, e.g. nvidia.com/gpu-memory",
            ));
        }

        if self.queue_capacity == 0 {
            return Err(SchedulerError::invalid_config(
                "queueCapacity must be greater than zero",
                "Use the default of 300 unless producers need a larger buffer",
            ));
        }

        Ok(())
    }

    /// Resync period, or `None` when resync is disabled
    pub fn resync_interval(&self) -> Option<Duration> {
        (self.resync_interval_secs > 0).then(|| Duration::from_secs(self.resync_interval_secs))
    }
}
