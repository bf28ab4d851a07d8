//! Batch validation and its summary

use crate::hypothesis::Hypothesis;
use crate::validator::{ConfidenceTier, StatisticalValidator, ValidatedHypothesis};
use crate::{Result, ValidationError};
use insight_core::math::round_to;
use insight_core::TabularDataset;
use insight_scheduler::{Task, TaskOutcome};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const SUGGESTED_ALTERNATIVE: &str = "Consider alternative explanations or gather more data";
const ADDITIONAL_ANALYSIS: &str = "More granular segment analysis";

/// Counts over a batch of validated hypotheses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total_hypotheses: usize,
    pub high_confidence: usize,
    pub medium_confidence: usize,
    pub low_confidence: usize,
    pub actionable_insights: usize,
}

impl ValidationSummary {
    pub fn of(validated: &[ValidatedHypothesis]) -> Self {
        validated.iter().fold(
            Self {
                total_hypotheses: validated.len(),
                ..Self::default()
            },
            |mut summary, v| {
                match v.tier() {
                    ConfidenceTier::High => summary.high_confidence += 1,
                    ConfidenceTier::Medium => summary.medium_confidence += 1,
                    ConfidenceTier::Low => summary.low_confidence += 1,
                }
                if v.actionable {
                    summary.actionable_insights += 1;
                }
                summary
            },
        )
    }
}

/// Follow-up for a hypothesis that fell short of the retry threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryRecommendation {
    pub hypothesis_id: String,
    pub confidence: f64,
    /// Threshold minus confidence, rounded to 2 decimals
    pub shortfall: f64,
    pub issue: String,
    pub suggested_alternative: String,
    pub additional_analysis_needed: String,
}

impl RetryRecommendation {
    fn for_hypothesis(validated: &ValidatedHypothesis, threshold: f64) -> Self {
        Self {
            hypothesis_id: validated.id.clone(),
            confidence: validated.confidence,
            shortfall: round_to(threshold - validated.confidence, 2),
            issue: format!("Low confidence ({:.2})", validated.confidence),
            suggested_alternative: SUGGESTED_ALTERNATIVE.to_string(),
            additional_analysis_needed: ADDITIONAL_ANALYSIS.to_string(),
        }
    }
}

/// Result of [`StatisticalValidator::validate_all`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Sorted by descending confidence; ties keep input order
    pub validated_hypotheses: Vec<ValidatedHypothesis>,
    pub summary: ValidationSummary,
    /// In input order
    pub retry_recommendations: Vec<RetryRecommendation>,
}

impl ValidationReport {
    /// Build a report from records in input order
    pub fn from_validated(mut validated: Vec<ValidatedHypothesis>, retry_threshold: f64) -> Self {
        let retry_recommendations = validated
            .iter()
            .filter(|v| v.confidence < retry_threshold)
            .map(|v| RetryRecommendation::for_hypothesis(v, retry_threshold))
            .collect();
        validated.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        let summary = ValidationSummary::of(&validated);
        Self {
            validated_hypotheses: validated,
            summary,
            retry_recommendations,
        }
    }

    pub fn actionable(&self) -> impl Iterator<Item = &ValidatedHypothesis> + '_ {
        self.validated_hypotheses.iter().filter(|v| v.actionable)
    }
}

fn task_name(index: usize, id: &str) -> String {
    format!("{index}:{id}")
}

impl StatisticalValidator {
    /// Validate every hypothesis as an independent scheduler task
    ///
    /// Hypotheses are scheduled by position, so repeated ids are validated
    /// independently.
    ///
    /// # Errors
    ///
    /// Returns `Scheduling` if the worker pool cannot be built, and
    /// `TaskFailed` for the first hypothesis (in input order) whose
    /// validation failed.
    #[instrument(skip_all, fields(hypotheses = hypotheses.len(), metric = metric))]
    pub fn validate_all(
        &self,
        hypotheses: &[Hypothesis],
        current: &TabularDataset,
        comparison: &TabularDataset,
        metric: &str,
    ) -> Result<ValidationReport> {
        let tasks: Vec<Task<ValidatedHypothesis>> = hypotheses
            .iter()
            .enumerate()
            .map(|(index, hypothesis)| {
                let validator = self.clone();
                let hypothesis = hypothesis.clone();
                let current = current.clone();
                let comparison = comparison.clone();
                let metric = metric.to_string();
                Task::new(task_name(index, &hypothesis.id), move || {
                    validator.validate(&hypothesis, &current, &comparison, &metric)
                })
            })
            .collect();

        let mut outcomes = self.scheduler.run_batch(tasks)?;

        let mut validated = Vec::with_capacity(hypotheses.len());
        for (index, hypothesis) in hypotheses.iter().enumerate() {
            match outcomes.remove(&task_name(index, &hypothesis.id)) {
                Some(TaskOutcome::Success(v)) => validated.push(v),
                Some(TaskOutcome::Failed(failure)) => {
                    return Err(ValidationError::TaskFailed {
                        hypothesis_id: hypothesis.id.clone(),
                        message: failure.message,
                    })
                }
                None => {
                    return Err(ValidationError::TaskFailed {
                        hypothesis_id: hypothesis.id.clone(),
                        message: "no result recorded".to_string(),
                    })
                }
            }
        }

        let report = ValidationReport::from_validated(validated, self.config.retry_threshold);
        debug!(
            actionable = report.summary.actionable_insights,
            retries = report.retry_recommendations.len(),
            "Batch validated"
        );
        Ok(report)
    }
}
