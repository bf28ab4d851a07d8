//! Cohen's d and its magnitude classes

use insight_core::math::{mean, variance};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Magnitude class of a standardized mean difference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectMagnitude {
    Small,
    Medium,
    Large,
}

impl EffectMagnitude {
    /// Classify `|d|`: small below 0.5, medium below 0.8, large otherwise
    pub fn from_d(d: f64) -> Self {
        let d = d.abs();
        if d >= 0.8 {
            Self::Large
        } else if d >= 0.5 {
            Self::Medium
        } else {
            Self::Small
        }
    }
}

impl fmt::Display for EffectMagnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Small => write!(f, "small"),
            Self::Medium => write!(f, "medium"),
            Self::Large => write!(f, "large"),
        }
    }
}

/// Cohen's d with its magnitude class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectSize {
    pub cohens_d: f64,
    pub magnitude: EffectMagnitude,
}

impl EffectSize {
    /// Effect size of the difference between two samples
    pub fn between(a: &[f64], b: &[f64]) -> Self {
        let d = cohens_d(a, b);
        Self {
            cohens_d: d,
            magnitude: EffectMagnitude::from_d(d),
        }
    }
}

impl fmt::Display for EffectSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Cohen's d = {:.2})", self.magnitude, self.cohens_d)
    }
}

/// Absolute Cohen's d using the pooled sample standard deviation
///
/// d = |mean(a) - mean(b)| / sqrt(((n1-1)s1² + (n2-1)s2²) / (n1+n2-2))
///
/// Returns 0.0 when the pooled standard deviation is zero or either sample
/// has fewer than two values.
pub fn cohens_d(a: &[f64], b: &[f64]) -> f64 {
    let (n1, n2) = (a.len(), b.len());
    if n1 < 2 || n2 < 2 {
        return 0.0;
    }
    let (n1f, n2f) = (n1 as f64, n2 as f64);
    let pooled_variance =
        ((n1f - 1.0) * variance(a) + (n2f - 1.0) * variance(b)) / (n1f + n2f - 2.0);
    let pooled_sd = pooled_variance.sqrt();
    if pooled_sd <= 0.0 {
        return 0.0;
    }
    ((mean(a) - mean(b)) / pooled_sd).abs()
}
