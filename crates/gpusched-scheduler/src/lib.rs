//! gpusched Scheduler - GPU-memory aware pod placement
//!
//! This crate provides:
//! - A bounded workload queue with explicit shutdown
//! - Filter predicates (GPU memory fit, node exclusivity)
//! - Scoring functions (tightest fit)
//! - The serialized decision loop: filter, score, bind, record
//! - In-memory catalog, binder and recorder mocks

pub mod accounting;
pub mod config;
pub mod error;
pub mod filter;
pub mod mock;
pub mod queue;
pub mod scheduler;
pub mod score;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use accounting::ResourceAccounting;
pub use config::SchedulerConfig;
pub use error::{Result, SchedulerError};
pub use queue::{QueueConsumer, QueueProducer, WorkloadQueue};
pub use scheduler::Scheduler;
pub use traits::{Binder, EventRecorder, NodeCatalog};
pub use types::{
    AttemptOutcome, FilterResult, NodeInfo, PlacementDecision, SchedulingContext, ScoreResult,
};
