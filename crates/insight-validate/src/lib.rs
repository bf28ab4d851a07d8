//! # insight-validate
//!
//! Turns a candidate explanation of a performance change into a scored,
//! evidence-backed verdict.
//!
//! For each [`Hypothesis`] the [`StatisticalValidator`] restricts the current
//! and comparison windows to the hypothesis segment, runs a two-sample t-test
//! when both samples are large enough, measures Cohen's d, and adjusts the
//! prior confidence by fixed increments:
//!
//! - +0.10 for a significant large effect, else +0.05 for a significant medium one
//! - +0.05 more when that test has p < 0.01
//! - -0.15 when either window has fewer than 10 observations
//!
//! The score is rounded to 2 decimals and clamped to [0, 1].
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use insight_core::{Row, TabularDataset};
//! use insight_validate::{Hypothesis, StatisticalValidator};
//!
//! let day = |d| NaiveDate::from_ymd_opt(2025, 3, d).unwrap();
//! let window = |days: std::ops::RangeInclusive<u32>, roas: f64| -> TabularDataset {
//!     days.map(|d| Row::new(day(d)).with_measure("roas", roas + (d % 2) as f64 * 0.1))
//!         .collect()
//! };
//!
//! let hypothesis = Hypothesis::new("H1", "Overall ROAS declined", 0.75)?;
//! let verdict = StatisticalValidator::default().validate(
//!     &hypothesis,
//!     &window(15..=28, 2.0),
//!     &window(1..=14, 4.0),
//!     "roas",
//! )?;
//! assert_eq!(verdict.confidence, 0.9);
//! assert!(verdict.actionable);
//! # Ok::<(), insight_validate::ValidationError>(())
//! ```

pub mod config;
pub mod effect;
pub mod error;
pub mod evidence;
pub mod hypothesis;
pub mod report;
pub mod ttest;
pub mod validator;

pub use config::{TestKind, ValidationConfig};
pub use effect::{cohens_d, EffectMagnitude, EffectSize};
pub use error::{Result, ValidationError};
pub use evidence::{
    Direction, MetricChange, QuantitativeEvidence, SampleSize, SegmentSpecificity, StatisticalTest,
};
pub use hypothesis::{Hypothesis, SegmentFilter};
pub use report::{RetryRecommendation, ValidationReport, ValidationSummary};
pub use ttest::{two_sample_t_test, TTestResult};
pub use validator::{
    score_confidence, ConfidenceTier, RecommendedAction, StatisticalValidator, ValidatedHypothesis,
    MONITOR_BELOW,
};
