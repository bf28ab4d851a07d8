//! Error types for campaign insight analysis
//!
//! Provides the shared error type for dataset handling, time windows and
//! configuration across the insight crates.

use chrono::NaiveDate;
use thiserror::Error;

/// Core error type for dataset and configuration operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid parameter provided to a function
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A required column is absent from the input
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// The comparison window does not end before the current window starts
    #[error(
        "Overlapping windows: comparison ends {comparison_end}, current starts {current_start}"
    )]
    OverlappingWindows {
        comparison_end: NaiveDate,
        current_start: NaiveDate,
    },

    /// CSV decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (for file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error for a value that could not be parsed in a given row
    pub fn unparsable(column: &str, value: &str, line: usize) -> Self {
        Self::InvalidInput(format!(
            "Cannot parse '{value}' in column '{column}' at line {line}"
        ))
    }

    /// Create an error for a probability-like parameter outside its range
    pub fn out_of_unit_range(name: &str, value: f64) -> Self {
        Self::InvalidParameter(format!("{name} = {value} must be in [0, 1]"))
    }

    /// Create an error for an empty dataset where rows are required
    pub fn empty_dataset(operation: &str) -> Self {
        Self::InvalidInput(format!("{operation} requires at least one row"))
    }
}
