//! Error types for hypothesis validation

use insight_scheduler::SchedulerError;
use thiserror::Error;

/// Error type for hypothesis validation
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid validator configuration
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A hypothesis that cannot be scored
    #[error("Invalid hypothesis '{id}': {reason}")]
    InvalidHypothesis { id: String, reason: String },

    /// Numerical computation error
    #[error("Computation error: {0}")]
    Computation(String),

    /// The validation task for one hypothesis failed inside a batch
    #[error("Validation of hypothesis '{hypothesis_id}' failed: {message}")]
    TaskFailed {
        hypothesis_id: String,
        message: String,
    },

    /// Batch scheduling error
    #[error(transparent)]
    Scheduling(#[from] SchedulerError),

    /// Dataset or window error
    #[error(transparent)]
    Core(#[from] insight_core::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, ValidationError>;

impl ValidationError {
    /// Create an error for a probability-like parameter outside its range
    pub fn out_of_range(name: &str, value: f64, range: &str) -> Self {
        Self::InvalidParameter(format!("{name} = {value} must be in {range}"))
    }

    pub fn invalid_hypothesis(id: &str, reason: impl Into<String>) -> Self {
        Self::InvalidHypothesis {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}
