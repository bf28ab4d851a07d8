//! Error types for pipeline runs

use crate::stage::Stage;
use insight_scheduler::SchedulerError;
use insight_validate::ValidationError;
use thiserror::Error;

/// Terminal failure of a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A stage task failed; later stages never see its output
    #[error("Stage '{stage}' failed: {message}")]
    StageFailed { stage: Stage, message: String },

    /// The stage graph could not be scheduled
    #[error("Scheduling error: {0}")]
    Scheduling(#[from] SchedulerError),

    /// The plan provider could not produce a plan
    #[error("Planning failed: {0}")]
    Plan(String),

    /// Invalid analysis configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Dataset or window error
    #[error(transparent)]
    Core(#[from] insight_core::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A run log sink failed
    #[error("Run log error: {0}")]
    RunLog(String),

    /// Threading or event dispatch error
    #[error("Execution error: {0}")]
    Execution(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    /// Stage named by a `StageFailed` error
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::StageFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub(crate) fn lock<E: std::fmt::Display>(what: &str, e: E) -> Self {
        Self::Execution(format!("Failed to lock {what}: {e}"))
    }
}
