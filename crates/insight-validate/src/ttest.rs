//! Two-sample t-tests with two-sided p-values

use crate::config::TestKind;
use crate::{Result, ValidationError};
use insight_core::math::{mean, variance};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Outcome of a two-sample t-test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TTestResult {
    /// t statistic of `a - b`
    pub statistic: f64,
    /// Two-sided p-value
    pub p_value: f64,
    pub degrees_of_freedom: f64,
}

/// Compare the means of two independent samples
///
/// With zero standard error the statistic is 0 (p = 1) for equal means and
/// infinite (p = 0) otherwise.
///
/// # Errors
///
/// Returns `InvalidParameter` if either sample has fewer than two values.
pub fn two_sample_t_test(a: &[f64], b: &[f64], kind: TestKind) -> Result<TTestResult> {
    let (n1, n2) = (a.len(), b.len());
    if n1 < 2 || n2 < 2 {
        return Err(ValidationError::InvalidParameter(format!(
            "t-test needs at least 2 values per sample, got {n1} and {n2}"
        )));
    }

    let (m1, m2) = (mean(a), mean(b));
    let (v1, v2) = (variance(a), variance(b));
    let (n1f, n2f) = (n1 as f64, n2 as f64);

    let (standard_error, df) = match kind {
        TestKind::Student => {
            let df = n1f + n2f - 2.0;
            let pooled = ((n1f - 1.0) * v1 + (n2f - 1.0) * v2) / df;
            ((pooled * (1.0 / n1f + 1.0 / n2f)).sqrt(), df)
        }
        TestKind::Welch => {
            let (s1, s2) = (v1 / n1f, v2 / n2f);
            let se2 = s1 + s2;
            let denom = s1 * s1 / (n1f - 1.0) + s2 * s2 / (n2f - 1.0);
            let df = if denom > 0.0 { se2 * se2 / denom } else { n1f + n2f - 2.0 };
            (se2.sqrt(), df)
        }
    };

    let diff = m1 - m2;
    if standard_error == 0.0 {
        let (statistic, p_value) = if diff == 0.0 {
            (0.0, 1.0)
        } else {
            (diff.signum() * f64::INFINITY, 0.0)
        };
        return Ok(TTestResult {
            statistic,
            p_value,
            degrees_of_freedom: df,
        });
    }

    let statistic = diff / standard_error;
    let t_dist = StudentsT::new(0.0, 1.0, df).map_err(|e| {
        ValidationError::Computation(format!("Failed to create t-distribution: {}", e))
    })?;
    let p_value = (2.0 * (1.0 - t_dist.cdf(statistic.abs()))).clamp(0.0, 1.0);

    Ok(TTestResult {
        statistic,
        p_value,
        degrees_of_freedom: df,
    })
}
