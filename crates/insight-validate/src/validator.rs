//! Hypothesis validation: significance, effect size and confidence scoring

use crate::config::{TestKind, ValidationConfig};
use crate::effect::{EffectMagnitude, EffectSize};
use crate::evidence::{MetricChange, QuantitativeEvidence, SampleSize, SegmentSpecificity, StatisticalTest};
use crate::hypothesis::{Hypothesis, SegmentFilter};
use crate::ttest::two_sample_t_test;
use crate::{Result, ValidationError};
use insight_core::math::round_to;
use insight_core::TabularDataset;
use insight_scheduler::DependencyTaskScheduler;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};

const LARGE_EFFECT_BONUS: f64 = 0.10;
const MEDIUM_EFFECT_BONUS: f64 = 0.05;
const STRONG_P_VALUE: f64 = 0.01;
const STRONG_P_BONUS: f64 = 0.05;
const INSUFFICIENT_SAMPLE_PENALTY: f64 = 0.15;

/// Below this confidence the action is always to keep monitoring
pub const MONITOR_BELOW: f64 = 0.6;

const VALIDATION_METHOD: &str = "Statistical testing + segment comparison";
const LIMITATIONS: [&str; 2] = [
    "Limited to available data dimensions",
    "Cannot account for external factors",
];

/// Next step suggested for a validated hypothesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    Monitor,
    RefreshCreative,
    AdjustTargeting,
    PlatformTest,
    Investigate,
}

impl RecommendedAction {
    /// Pick an action from the confidence and the hypothesis wording
    pub fn choose(statement: &str, confidence: f64) -> Self {
        if confidence < MONITOR_BELOW {
            return Self::Monitor;
        }
        let text = statement.to_lowercase();
        if text.contains("creative") || text.contains("fatigue") {
            Self::RefreshCreative
        } else if text.contains("audience") || text.contains("saturation") {
            Self::AdjustTargeting
        } else if text.contains("platform") {
            Self::PlatformTest
        } else {
            Self::Investigate
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Monitor => "Monitor trend; gather more data before taking action",
            Self::RefreshCreative => "Refresh creative with new messaging and visuals",
            Self::AdjustTargeting => "Expand audience targeting or reduce frequency",
            Self::PlatformTest => "Test platform-optimized creative variations",
            Self::Investigate => "Investigate further and test solutions",
        }
    }
}

impl fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Confidence band used in batch summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    /// confidence >= 0.7
    High,
    /// 0.5 <= confidence < 0.7
    Medium,
    /// confidence < 0.5
    Low,
}

impl ConfidenceTier {
    pub fn of(confidence: f64) -> Self {
        if confidence >= 0.7 {
            Self::High
        } else if confidence >= 0.5 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// A hypothesis with its evidence and final confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedHypothesis {
    pub id: String,
    pub statement: String,
    pub validation_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<SegmentFilter>,
    pub statistical_tests: Vec<StatisticalTest>,
    pub quantitative_evidence: QuantitativeEvidence,
    /// Final confidence in [0, 1], rounded to 2 decimals
    pub confidence: f64,
    pub confidence_rationale: String,
    pub limitations: Vec<String>,
    pub actionable: bool,
    pub recommended_action: RecommendedAction,
}

impl ValidatedHypothesis {
    pub fn tier(&self) -> ConfidenceTier {
        ConfidenceTier::of(self.confidence)
    }
}

/// Scores hypotheses against a current and a comparison window
///
/// Pure with respect to I/O: validating the same hypothesis on the same
/// rows always yields the same record.
#[derive(Debug, Clone, Default)]
pub struct StatisticalValidator {
    pub(crate) config: ValidationConfig,
    pub(crate) scheduler: DependencyTaskScheduler,
}

impl StatisticalValidator {
    pub fn new(config: ValidationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            scheduler: DependencyTaskScheduler::default(),
        })
    }

    /// Use `scheduler` for [`validate_all`](Self::validate_all) batches
    pub fn with_scheduler(mut self, scheduler: DependencyTaskScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate one hypothesis
    ///
    /// `current` and `comparison` are the rows of the two windows. The
    /// first affected segment, if any, restricts both windows; the rest of
    /// the current window becomes the control group.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHypothesis` for a non-finite prior and `Computation`
    /// if the t distribution cannot be built.
    #[instrument(skip_all, fields(hypothesis = %hypothesis.id, metric = metric))]
    pub fn validate(
        &self,
        hypothesis: &Hypothesis,
        current: &TabularDataset,
        comparison: &TabularDataset,
        metric: &str,
    ) -> Result<ValidatedHypothesis> {
        if !hypothesis.prior_confidence.is_finite() {
            return Err(ValidationError::invalid_hypothesis(
                &hypothesis.id,
                "prior confidence must be finite",
            ));
        }

        let segment = hypothesis.segment();
        let (current_segment, control, comparison_segment) = match &segment {
            Some(filter) => {
                let (inside, rest) = current.partition(&filter.dimension, &filter.value);
                let previous = comparison.where_eq(&filter.dimension, &filter.value);
                (inside, Some(rest), previous)
            }
            None => (current.clone(), None, comparison.clone()),
        };

        let current_values = current_segment.values(metric);
        let comparison_values = comparison_segment.values(metric);

        let mut statistical_tests = Vec::new();
        if current_values.len() >= self.config.min_test_observations
            && comparison_values.len() >= self.config.min_test_observations
        {
            let label = segment.as_ref().map_or("Overall", |f| f.value.as_str());
            statistical_tests.push(self.significance_test(
                &current_values,
                &comparison_values,
                format!("{label} {} (current vs previous)", metric.to_uppercase()),
            )?);
        }

        let current_mean = current_segment.mean(metric);
        let sample_size = SampleSize {
            current_n: current_values.len(),
            previous_n: comparison_values.len(),
            sufficient: current_values.len() >= self.config.sufficient_sample
                && comparison_values.len() >= self.config.sufficient_sample,
        };

        let segment_specificity = match (&segment, &control, current_mean) {
            (Some(filter), Some(control), Some(affected))
                if control.count(metric) >= self.config.min_control_observations =>
            {
                control.mean(metric).map(|control_mean| SegmentSpecificity {
                    affected_segment: filter.value.clone(),
                    affected_value: round_to(affected, 2),
                    control_segment: format!("other {}", filter.dimension),
                    control_value: round_to(control_mean, 2),
                    differential: round_to(affected - control_mean, 2),
                })
            }
            _ => None,
        };

        let quantitative_evidence = QuantitativeEvidence {
            metric_change: MetricChange::between(metric, current_mean, comparison_segment.mean(metric)),
            sample_size,
            segment_specificity,
        };

        let confidence = score_confidence(
            hypothesis.prior_confidence,
            statistical_tests.first(),
            &sample_size,
        );
        debug!(confidence, tests = statistical_tests.len(), "Hypothesis scored");

        Ok(ValidatedHypothesis {
            id: hypothesis.id.clone(),
            statement: hypothesis.statement.clone(),
            validation_method: VALIDATION_METHOD.to_string(),
            segment,
            statistical_tests,
            quantitative_evidence,
            confidence,
            confidence_rationale: rationale(confidence).to_string(),
            limitations: LIMITATIONS.iter().map(|s| s.to_string()).collect(),
            actionable: confidence >= self.config.retry_threshold,
            recommended_action: RecommendedAction::choose(&hypothesis.statement, confidence),
        })
    }

    fn significance_test(
        &self,
        current: &[f64],
        comparison: &[f64],
        description: String,
    ) -> Result<StatisticalTest> {
        let result = two_sample_t_test(current, comparison, self.config.test_kind)?;
        let name = match self.config.test_kind {
            TestKind::Student => "Two-sample t-test",
            TestKind::Welch => "Welch t-test",
        };
        Ok(StatisticalTest::new(
            name,
            description,
            result,
            self.config.significance_level,
            EffectSize::between(current, comparison),
        ))
    }
}

/// Additive confidence score from the prior, the first test and the sample size
///
/// Rounded to 2 decimals, then clamped to [0, 1].
pub fn score_confidence(prior: f64, test: Option<&StatisticalTest>, sample_size: &SampleSize) -> f64 {
    let mut score = prior;
    if let Some(test) = test.filter(|t| t.significant) {
        score += match test.effect_size.magnitude {
            EffectMagnitude::Large => LARGE_EFFECT_BONUS,
            EffectMagnitude::Medium => MEDIUM_EFFECT_BONUS,
            EffectMagnitude::Small => 0.0,
        };
        if test.p_value < STRONG_P_VALUE {
            score += STRONG_P_BONUS;
        }
    }
    if !sample_size.sufficient {
        score -= INSUFFICIENT_SAMPLE_PENALTY;
    }
    round_to(score, 2).clamp(0.0, 1.0)
}

fn rationale(confidence: f64) -> &'static str {
    if confidence >= 0.8 {
        "Strong statistical evidence with large effect size and sufficient sample"
    } else if confidence >= 0.6 {
        "Moderate statistical evidence with adequate sample size"
    } else {
        "Limited statistical evidence or insufficient sample size"
    }
}
