//! Validator configuration

use crate::{Result, ValidationError};
use serde::{Deserialize, Serialize};

/// Which two-sample t-test to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    /// Pooled-variance Student t-test
    #[default]
    Student,
    /// Unequal-variance Welch t-test
    Welch,
}

/// Thresholds used when scoring hypotheses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Confidence at or above which a hypothesis is actionable
    pub retry_threshold: f64,
    /// p-value below which a test is significant
    pub significance_level: f64,
    /// Observations required in each sample before a test is run
    pub min_test_observations: usize,
    /// Observations in each window for the sample to count as sufficient
    pub sufficient_sample: usize,
    /// Control observations required before segment specificity is reported
    pub min_control_observations: usize,
    pub test_kind: TestKind,
}

impl ValidationConfig {
    pub fn with_retry_threshold(mut self, threshold: f64) -> Self {
        self.retry_threshold = threshold;
        self
    }

    pub fn with_test_kind(mut self, kind: TestKind) -> Self {
        self.test_kind = kind;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.retry_threshold) {
            return Err(ValidationError::out_of_range(
                "retry_threshold",
                self.retry_threshold,
                "[0, 1]",
            ));
        }
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(ValidationError::out_of_range(
                "significance_level",
                self.significance_level,
                "(0, 1)",
            ));
        }
        if self.min_test_observations < 2 {
            return Err(ValidationError::InvalidParameter(
                "min_test_observations must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            retry_threshold: 0.6,
            significance_level: 0.05,
            min_test_observations: 6,
            sufficient_sample: 10,
            min_control_observations: 6,
            test_kind: TestKind::Student,
        }
    }
}
