//! Candidate explanations and their segment filters

use crate::{Result, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A `dimension=value` filter naming the segment a hypothesis is about
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentFilter {
    pub dimension: String,
    pub value: String,
}

impl SegmentFilter {
    pub fn new(dimension: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            value: value.into(),
        }
    }

    /// Parse `dimension=value`, splitting at the first `=`
    ///
    /// Returns `None` for text without `=` (such as `all`) or with an empty
    /// dimension name.
    pub fn parse(text: &str) -> Option<Self> {
        let (dimension, value) = text.split_once('=')?;
        let dimension = dimension.trim();
        if dimension.is_empty() {
            return None;
        }
        Some(Self::new(dimension, value.trim()))
    }
}

impl fmt::Display for SegmentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.dimension, self.value)
    }
}

/// A candidate explanation to be scored against the data
///
/// Never mutated once built; validation produces a separate
/// [`ValidatedHypothesis`](crate::ValidatedHypothesis).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    pub id: String,
    pub statement: String,
    /// Segment filters as written, e.g. `creative_type=Image` or `all`
    #[serde(default)]
    pub affected_segments: Vec<String>,
    /// Prior confidence in [0, 1]
    pub prior_confidence: f64,
    pub primary_metric: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supporting_evidence: Option<String>,
}

impl Hypothesis {
    /// Create a hypothesis tested on `roas` with no segment
    pub fn new(id: impl Into<String>, statement: impl Into<String>, prior_confidence: f64) -> Result<Self> {
        let id = id.into();
        if !(0.0..=1.0).contains(&prior_confidence) {
            return Err(ValidationError::invalid_hypothesis(
                &id,
                format!("prior confidence {prior_confidence} must be in [0, 1]"),
            ));
        }
        Ok(Self {
            id,
            statement: statement.into(),
            affected_segments: Vec::new(),
            prior_confidence,
            primary_metric: "roas".to_string(),
            reasoning: None,
            supporting_evidence: None,
        })
    }

    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.affected_segments.push(segment.into());
        self
    }

    pub fn with_metric(mut self, metric: impl Into<String>) -> Self {
        self.primary_metric = metric.into();
        self
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    pub fn with_supporting_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.supporting_evidence = Some(evidence.into());
        self
    }

    /// Segment named by the first affected-segment filter, if any
    pub fn segment(&self) -> Option<SegmentFilter> {
        self.affected_segments.first().and_then(|s| SegmentFilter::parse(s))
    }
}
