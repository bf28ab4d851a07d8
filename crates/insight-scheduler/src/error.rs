//! Error types for task scheduling
//!
//! These are the structural failures of a scheduling call. A task that fails
//! while running is never reported here; it becomes a
//! [`TaskOutcome::Failed`](crate::TaskOutcome::Failed) entry in the result map.

use thiserror::Error;

/// Fatal scheduling error, propagated to the caller
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// Tasks remain but none of them can ever become ready
    #[error("Unsatisfiable task graph: {stuck:?} can never run (unknown dependencies: {missing:?})")]
    Unsatisfiable {
        /// Task ids left incomplete, sorted
        stuck: Vec<String>,
        /// Dependency ids that do not name any task in the graph, sorted
        missing: Vec<String>,
    },

    /// Two tasks share an id within one graph or batch
    #[error("Duplicate task id: {0}")]
    DuplicateTask(String),

    /// Invalid scheduler configuration
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The worker pool could not be created
    #[error("Thread pool error: {0}")]
    Pool(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, SchedulerError>;
