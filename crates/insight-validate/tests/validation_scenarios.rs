//! End-to-end validation scenarios on seeded synthetic windows

mod common;

use approx::assert_relative_eq;
use common::{day, facebook_decline, platform_rows};
use insight_core::{Row, TabularDataset};
use insight_validate::{
    Direction, EffectMagnitude, Hypothesis, RecommendedAction, StatisticalValidator, TestKind,
    ValidationConfig, ValidationError,
};
use proptest::prelude::*;

fn facebook_hypothesis(prior: f64) -> Hypothesis {
    Hypothesis::new("H1", "Platform-specific issues on Facebook", prior)
        .unwrap()
        .with_segment("platform=Facebook")
}

#[test]
fn test_large_significant_effect_with_sufficient_sample() {
    let (current, comparison) = facebook_decline(14);
    let result = StatisticalValidator::default()
        .validate(&facebook_hypothesis(0.75), &current, &comparison, "roas")
        .unwrap();

    assert_eq!(result.statistical_tests.len(), 1);
    let test = &result.statistical_tests[0];
    assert!(test.significant);
    assert!(test.p_value < 0.01);
    assert_eq!(test.effect_size.magnitude, EffectMagnitude::Large);
    assert_eq!(test.comparison, "Facebook ROAS (current vs previous)");

    let change = &result.quantitative_evidence.metric_change;
    assert_eq!(change.direction, Some(Direction::Decline));
    assert_relative_eq!(change.current.unwrap(), 2.0, epsilon = 0.2);
    assert_relative_eq!(change.previous.unwrap(), 4.0, epsilon = 0.2);

    assert_eq!(result.confidence, 0.9);
    assert!(result.actionable);
    assert_eq!(result.recommended_action, RecommendedAction::PlatformTest);

    let specificity = result.quantitative_evidence.segment_specificity.as_ref().unwrap();
    assert_eq!(specificity.control_segment, "other platform");
    assert!(specificity.differential < 0.0);
}

#[test]
fn test_four_current_observations_skip_the_test() {
    let (current, comparison) = facebook_decline(4);
    let result = StatisticalValidator::default()
        .validate(&facebook_hypothesis(0.75), &current, &comparison, "roas")
        .unwrap();

    assert!(result.statistical_tests.is_empty());
    assert_eq!(result.quantitative_evidence.sample_size.current_n, 4);
    assert!(!result.quantitative_evidence.sample_size.sufficient);
    assert_eq!(result.confidence, 0.6);
    assert!(result.actionable);
}

#[test]
fn test_zero_comparison_mean_reports_zero_percent_change() {
    let current: TabularDataset = (15..=28)
        .map(|d| Row::new(day(d)).with_measure("roas", 1.0))
        .collect();
    let comparison: TabularDataset = (1..=14)
        .map(|d| Row::new(day(d)).with_measure("roas", 0.0))
        .collect();
    let h = Hypothesis::new("H1", "Overall ROAS changed", 0.5).unwrap();
    let result = StatisticalValidator::default()
        .validate(&h, &current, &comparison, "roas")
        .unwrap();
    assert_eq!(result.quantitative_evidence.metric_change.percent_change, Some(0.0));
    assert_eq!(result.quantitative_evidence.metric_change.direction, Some(Direction::Increase));
}

#[test]
fn test_validation_is_idempotent() {
    let (current, comparison) = facebook_decline(14);
    let validator = StatisticalValidator::default();
    let h = facebook_hypothesis(0.65);
    let first = validator.validate(&h, &current, &comparison, "roas").unwrap();
    let second = validator.validate(&h, &current, &comparison, "roas").unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_welch_configuration_names_the_test() {
    let (current, comparison) = facebook_decline(14);
    let config = ValidationConfig::default().with_test_kind(TestKind::Welch);
    let result = StatisticalValidator::new(config)
        .unwrap()
        .validate(&facebook_hypothesis(0.75), &current, &comparison, "roas")
        .unwrap();
    assert_eq!(result.statistical_tests[0].test_name, "Welch t-test");
    assert_eq!(result.confidence, 0.9);
}

#[test]
fn test_validate_all_sorts_and_recommends_retries() {
    let (current, comparison) = facebook_decline(14);
    let hypotheses = vec![
        Hypothesis::new("H-low", "Audience saturation in Instagram campaigns", 0.3)
            .unwrap()
            .with_segment("platform=Instagram"),
        facebook_hypothesis(0.75),
        Hypothesis::new("H-all", "Overall ROAS declined", 0.8)
            .unwrap()
            .with_segment("all"),
    ];

    let report = StatisticalValidator::default()
        .validate_all(&hypotheses, &current, &comparison, "roas")
        .unwrap();

    let confidences: Vec<f64> = report
        .validated_hypotheses
        .iter()
        .map(|v| v.confidence)
        .collect();
    assert!(confidences.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(report.summary.total_hypotheses, 3);
    let order: Vec<&str> = report
        .validated_hypotheses
        .iter()
        .map(|v| v.id.as_str())
        .collect();
    assert_eq!(order, ["H-all", "H1", "H-low"]);

    assert_eq!(report.retry_recommendations.len(), 1);
    let retry = &report.retry_recommendations[0];
    assert_eq!(retry.hypothesis_id, "H-low");
    assert_relative_eq!(retry.shortfall, 0.6 - retry.confidence, epsilon = 0.005);
}

#[test]
fn test_validate_all_keeps_repeated_ids() {
    let (current, comparison) = facebook_decline(14);
    let hypotheses = vec![facebook_hypothesis(0.5), facebook_hypothesis(0.6)];
    let report = StatisticalValidator::default()
        .validate_all(&hypotheses, &current, &comparison, "roas")
        .unwrap();

    assert_eq!(report.summary.total_hypotheses, 2);
    assert!(report.validated_hypotheses.iter().all(|v| v.id == "H1"));
    let confidences: Vec<f64> = report
        .validated_hypotheses
        .iter()
        .map(|v| v.confidence)
        .collect();
    assert_eq!(confidences, [0.75, 0.65]);
}

#[test]
fn test_validate_all_surfaces_task_failure() {
    let (current, comparison) = facebook_decline(14);
    let mut broken = facebook_hypothesis(0.5);
    broken.id = "H-broken".to_string();
    broken.prior_confidence = f64::NAN;
    let hypotheses = vec![facebook_hypothesis(0.7), broken];

    match StatisticalValidator::default().validate_all(&hypotheses, &current, &comparison, "roas") {
        Err(ValidationError::TaskFailed { hypothesis_id, .. }) => assert_eq!(hypothesis_id, "H-broken"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_significance_test_needs_six_observations() {
    let validator = StatisticalValidator::default();
    let h = facebook_hypothesis(0.75);

    let (current, comparison) = facebook_decline(5);
    let five = validator.validate(&h, &current, &comparison, "roas").unwrap();
    assert!(five.statistical_tests.is_empty());
    assert_eq!(five.confidence, 0.6);

    let (current, comparison) = facebook_decline(6);
    let six = validator.validate(&h, &current, &comparison, "roas").unwrap();
    assert_eq!(six.statistical_tests.len(), 1);
    assert!(six.statistical_tests[0].significant);
    assert_eq!(six.confidence, 0.75);
}

#[test]
fn test_sufficient_sample_starts_at_ten() {
    let validator = StatisticalValidator::default();
    let h = facebook_hypothesis(0.75);

    let (current, comparison) = facebook_decline(9);
    let nine = validator.validate(&h, &current, &comparison, "roas").unwrap();
    assert_eq!(nine.quantitative_evidence.sample_size.current_n, 9);
    assert!(!nine.quantitative_evidence.sample_size.sufficient);
    assert_eq!(nine.confidence, 0.75);

    let (current, comparison) = facebook_decline(10);
    let ten = validator.validate(&h, &current, &comparison, "roas").unwrap();
    assert!(ten.quantitative_evidence.sample_size.sufficient);
    assert_eq!(ten.confidence, 0.9);
}

#[test]
fn test_segment_specificity_needs_six_control_observations() {
    let comparison = TabularDataset::from_rows(platform_rows("Facebook", 1..=14, 4.0, 0.2, 3));
    let with_control = |last_day: u32| {
        let mut rows = platform_rows("Facebook", 15..=28, 2.0, 0.2, 1);
        rows.extend(platform_rows("Instagram", 15..=last_day, 3.0, 0.2, 2));
        TabularDataset::from_rows(rows)
    };
    let validator = StatisticalValidator::default();
    let h = facebook_hypothesis(0.75);

    let five = validator
        .validate(&h, &with_control(19), &comparison, "roas")
        .unwrap();
    assert!(five.quantitative_evidence.segment_specificity.is_none());

    let six = validator
        .validate(&h, &with_control(20), &comparison, "roas")
        .unwrap();
    let specificity = six.quantitative_evidence.segment_specificity.as_ref().unwrap();
    assert_eq!(specificity.control_segment, "other platform");
    assert!(specificity.differential < 0.0);
}

#[test]
fn test_medium_effect_adds_five_points() {
    // Same spread in both windows, means 0.5 apart: d ~ 0.69, t ~ 2.18 on 38 df
    let spread = |i: u32| (i % 5) as f64 * 0.5 - 1.0;
    let comparison: TabularDataset = (0..20)
        .map(|i| Row::new(day(i + 1)).with_measure("roas", 3.0 + spread(i)))
        .collect();
    let current: TabularDataset = (0..20)
        .map(|i| Row::new(day(i + 1)).with_measure("roas", 2.5 + spread(i)))
        .collect();

    let h = Hypothesis::new("H1", "Overall ROAS declined", 0.5).unwrap();
    let result = StatisticalValidator::default()
        .validate(&h, &current, &comparison, "roas")
        .unwrap();

    let test = &result.statistical_tests[0];
    assert_eq!(test.effect_size.magnitude, EffectMagnitude::Medium);
    assert!(test.significant);
    assert!(test.p_value >= 0.01 && test.p_value < 0.05);
    assert!(result.quantitative_evidence.sample_size.sufficient);
    assert_eq!(result.confidence, 0.55);
    assert!(!result.actionable);
}

proptest! {
    #[test]
    fn prop_confidence_is_clamped(
        prior in -1.0f64..2.0,
        current_mean in 0.1f64..10.0,
        comparison_mean in 0.1f64..10.0,
        current_days in 1u32..=14,
        seed in any::<u64>(),
    ) {
        let mut current = platform_rows("Facebook", 15..=14 + current_days, current_mean, 0.5, seed);
        current.extend(platform_rows("Instagram", 15..=28, 3.0, 0.5, seed.wrapping_add(1)));
        let comparison = platform_rows("Facebook", 1..=14, comparison_mean, 0.5, seed.wrapping_add(2));

        let mut h = facebook_hypothesis(0.5);
        h.prior_confidence = prior;
        let result = StatisticalValidator::default()
            .validate(
                &h,
                &TabularDataset::from_rows(current),
                &TabularDataset::from_rows(comparison),
                "roas",
            )
            .unwrap();
        prop_assert!((0.0..=1.0).contains(&result.confidence));
    }
}
