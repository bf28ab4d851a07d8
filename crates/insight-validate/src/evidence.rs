//! Test results and quantitative evidence attached to a validated hypothesis

use crate::effect::EffectSize;
use crate::ttest::TTestResult;
use insight_core::math::{percent_change, round_to};
use serde::{Deserialize, Serialize};

/// Direction of the metric move from the comparison window to the current one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Decline,
    Increase,
}

/// One significance test on the segment, current vs comparison window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalTest {
    pub test_name: String,
    /// What was compared, e.g. `Image ROAS (current vs previous)`
    pub comparison: String,
    pub statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom: f64,
    pub significant: bool,
    pub effect_size: EffectSize,
}

impl StatisticalTest {
    pub(crate) fn new(
        test_name: &str,
        comparison: String,
        result: TTestResult,
        significance_level: f64,
        effect_size: EffectSize,
    ) -> Self {
        Self {
            test_name: test_name.to_string(),
            comparison,
            statistic: result.statistic,
            p_value: result.p_value,
            degrees_of_freedom: result.degrees_of_freedom,
            significant: result.p_value < significance_level,
            effect_size,
        }
    }
}

/// Means of the primary metric in both windows
///
/// Values are rounded for reporting: means and absolute change to 2
/// decimals, percent change to 1. Every field but `metric` is absent when
/// either window has no observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricChange {
    pub metric: String,
    pub current: Option<f64>,
    pub previous: Option<f64>,
    pub absolute_change: Option<f64>,
    pub percent_change: Option<f64>,
    pub direction: Option<Direction>,
}

impl MetricChange {
    pub fn between(metric: &str, current: Option<f64>, previous: Option<f64>) -> Self {
        let both = current.zip(previous);
        Self {
            metric: metric.to_uppercase(),
            current: current.map(|v| round_to(v, 2)),
            previous: previous.map(|v| round_to(v, 2)),
            absolute_change: both.map(|(c, p)| round_to(c - p, 2)),
            percent_change: both.map(|(c, p)| round_to(percent_change(c, p), 1)),
            direction: both.map(|(c, p)| {
                if c < p {
                    Direction::Decline
                } else {
                    Direction::Increase
                }
            }),
        }
    }
}

/// Observation counts behind the evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleSize {
    pub current_n: usize,
    pub previous_n: usize,
    /// Both windows reached the sufficiency threshold
    pub sufficient: bool,
}

/// Segment mean against the rest of the current window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSpecificity {
    pub affected_segment: String,
    pub affected_value: f64,
    /// e.g. `other platform`
    pub control_segment: String,
    pub control_value: f64,
    pub differential: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantitativeEvidence {
    pub metric_change: MetricChange,
    pub sample_size: SampleSize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_specificity: Option<SegmentSpecificity>,
}
