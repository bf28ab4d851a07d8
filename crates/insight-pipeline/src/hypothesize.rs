//! Candidate explanations for a metric change

use crate::plan::AnalysisPlan;
use crate::summary::{DataSummary, SegmentPerformance};
use crate::Result;
use insight_validate::Hypothesis;
use tracing::debug;

/// Produces the hypotheses the validate stage scores
pub trait HypothesisSource: Send + Sync {
    fn generate(&self, plan: &AnalysisPlan, summary: &DataSummary) -> Result<Vec<Hypothesis>>;
}

/// Threshold rules over the segment breakdown and the headline change
///
/// | id | rule | prior |
/// |----|------|-------|
/// | H1 | worst `creative_type` below 0.7 x best | 0.75 |
/// | H2 | worst `audience_type` below 0.8 x current headline value | 0.70 |
/// | H3 | worst `platform` below 0.8 x best | 0.65 |
/// | next free | headline change beyond +/-2% | 0.80 |
///
/// Segment rules need at least two segments in the breakdown.
#[derive(Debug, Clone)]
pub struct RuleBasedHypothesisSource {
    max_hypotheses: usize,
}

impl RuleBasedHypothesisSource {
    pub fn new(max_hypotheses: usize) -> Self {
        Self { max_hypotheses }
    }
}

impl Default for RuleBasedHypothesisSource {
    fn default() -> Self {
        Self::new(5)
    }
}

/// Extremes of a breakdown sorted best first
fn extremes(segments: &[SegmentPerformance]) -> Option<(&SegmentPerformance, &SegmentPerformance)> {
    if segments.len() < 2 {
        return None;
    }
    Some((segments.first()?, segments.last()?))
}

fn gap_pct(best: f64, worst: f64) -> f64 {
    if best == 0.0 {
        0.0
    } else {
        (best - worst) / best * 100.0
    }
}

/// `H{n+1}` for `n` hypotheses, skipping ids the segment rules already took
fn next_free_id(hypotheses: &[Hypothesis]) -> String {
    (hypotheses.len() + 1..)
        .map(|k| format!("H{k}"))
        .find(|id| hypotheses.iter().all(|h| &h.id != id))
        .unwrap_or_default()
}

impl HypothesisSource for RuleBasedHypothesisSource {
    fn generate(&self, plan: &AnalysisPlan, summary: &DataSummary) -> Result<Vec<Hypothesis>> {
        let metric = plan.primary_metric.as_str();
        let upper = metric.to_uppercase();
        let mut hypotheses = Vec::new();

        if let Some((best, worst)) = extremes(summary.segments("creative_type")) {
            if worst.metric_mean < best.metric_mean * 0.7 {
                hypotheses.push(
                    Hypothesis::new(
                        "H1",
                        format!("Creative fatigue in {} ads causing performance decline", worst.value),
                        0.75,
                    )?
                    .with_segment(format!("creative_type={}", worst.value))
                    .with_reasoning(format!(
                        "{} ads show significantly lower {upper} than {}",
                        worst.value, best.value
                    ))
                    .with_supporting_evidence(format!(
                        "{} {upper} {:.2} is {:.0}% lower than {} ({:.2}); {:.0}% of spend",
                        worst.value,
                        worst.metric_mean,
                        gap_pct(best.metric_mean, worst.metric_mean),
                        best.value,
                        best.metric_mean,
                        worst.spend_share * 100.0
                    )),
                );
            }
        }

        if let (Some((_, worst)), Some(headline)) =
            (extremes(summary.segments("audience_type")), summary.current_metric)
        {
            if worst.metric_mean < headline * 0.8 {
                hypotheses.push(
                    Hypothesis::new(
                        "H2",
                        format!("Audience saturation in {} campaigns", worst.value),
                        0.70,
                    )?
                    .with_segment(format!("audience_type={}", worst.value))
                    .with_reasoning(format!("{} audience may be exhausted", worst.value))
                    .with_supporting_evidence(format!(
                        "{} {upper}: {:.2} vs overall: {headline:.2}; {:.0}% of spend",
                        worst.value,
                        worst.metric_mean,
                        worst.spend_share * 100.0
                    )),
                );
            }
        }

        if let Some((best, worst)) = extremes(summary.segments("platform")) {
            if worst.metric_mean < best.metric_mean * 0.8 {
                hypotheses.push(
                    Hypothesis::new(
                        "H3",
                        format!("Platform-specific issues on {}", worst.value),
                        0.65,
                    )?
                    .with_segment(format!("platform={}", worst.value))
                    .with_reasoning(format!(
                        "{} performance diverged from {}",
                        worst.value, best.value
                    ))
                    .with_supporting_evidence(format!(
                        "{} underperforming {} by {:.0}%",
                        worst.value,
                        best.value,
                        gap_pct(best.metric_mean, worst.metric_mean)
                    )),
                );
            }
        }

        let change = summary.trends.metric_change_pct;
        if change.abs() > 2.0 {
            let direction = if change < 0.0 { "decline" } else { "increase" };
            hypotheses.push(
                Hypothesis::new(
                    next_free_id(&hypotheses),
                    format!("Overall {upper} {direction} of {:.0}%", change.abs()),
                    0.80,
                )?
                .with_segment("all")
                .with_reasoning(format!(
                    "Broad performance {direction} affecting multiple segments"
                ))
                .with_supporting_evidence(format!(
                    "{upper} changed {change:.1}%; trend {:?}",
                    summary.trends.metric_trend.direction
                )),
            );
        }

        for hypothesis in &mut hypotheses {
            hypothesis.primary_metric = metric.to_string();
        }
        hypotheses.truncate(self.max_hypotheses);
        debug!(count = hypotheses.len(), "Generated hypotheses");
        Ok(hypotheses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::{PeriodStats, Trend, TrendDirection, Trends};
    use chrono::NaiveDate;
    use insight_core::{DataQuality, TabularDataset, WindowPair};
    use std::collections::BTreeMap;

    fn plan() -> AnalysisPlan {
        AnalysisPlan {
            query_interpretation: String::new(),
            primary_metric: "roas".to_string(),
            windows: WindowPair::trailing(NaiveDate::from_ymd_opt(2025, 3, 28).unwrap(), 14).unwrap(),
            lookback_days: 14,
            segments: vec![],
            subtasks: vec![],
            success_criteria: String::new(),
        }
    }

    fn segment(dimension: &str, value: &str, metric_mean: f64) -> SegmentPerformance {
        SegmentPerformance {
            dimension: dimension.to_string(),
            value: value.to_string(),
            metric_mean,
            avg_ctr: None,
            spend_share: 0.5,
            n: 10,
        }
    }

    fn summary(breakdown: Vec<SegmentPerformance>, change_pct: f64) -> DataSummary {
        let stats = PeriodStats::of(&TabularDataset::default(), None);
        let mut segment_breakdown: BTreeMap<String, Vec<SegmentPerformance>> = BTreeMap::new();
        for s in breakdown {
            segment_breakdown.entry(s.dimension.clone()).or_default().push(s);
        }
        let flat = Trend {
            direction: TrendDirection::Stable,
            change_pct: 0.0,
        };
        DataSummary {
            data_quality: DataQuality::assess(&TabularDataset::default()),
            overall: stats.clone(),
            current: stats.clone(),
            comparison: stats,
            current_metric: Some(2.5),
            comparison_metric: Some(3.0),
            segment_breakdown,
            trends: Trends {
                metric: "roas".to_string(),
                metric_trend: flat,
                metric_change_pct: change_pct,
                ctr_trend: flat,
                ctr_change_pct: 0.0,
            },
            anomalies: vec![],
        }
    }

    #[test]
    fn test_platform_gap_and_overall_change() {
        let summary = summary(
            vec![segment("platform", "Instagram", 3.0), segment("platform", "Facebook", 2.0)],
            -16.7,
        );
        let hypotheses = RuleBasedHypothesisSource::default().generate(&plan(), &summary).unwrap();
        let ids: Vec<_> = hypotheses.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, ["H3", "H2"]);
        assert_eq!(hypotheses[0].statement, "Platform-specific issues on Facebook");
        assert_eq!(hypotheses[0].affected_segments, ["platform=Facebook"]);
        assert_eq!(hypotheses[1].statement, "Overall ROAS decline of 17%");
        assert_eq!(hypotheses[1].affected_segments, ["all"]);
        assert_eq!(hypotheses[1].prior_confidence, 0.80);
    }

    #[test]
    fn test_overall_id_skips_taken_ids() {
        let summary = summary(
            vec![
                segment("audience_type", "Broad", 3.0),
                segment("audience_type", "Lookalike", 1.0),
                segment("platform", "Instagram", 3.0),
                segment("platform", "Facebook", 1.0),
            ],
            -30.0,
        );
        let hypotheses = RuleBasedHypothesisSource::default().generate(&plan(), &summary).unwrap();
        let ids: Vec<_> = hypotheses.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, ["H2", "H3", "H4"]);
    }

    #[test]
    fn test_thresholds_are_strict() {
        // within 20% of the best platform, and a 2% change is not enough
        let summary = summary(
            vec![segment("platform", "Instagram", 3.0), segment("platform", "Facebook", 2.5)],
            2.0,
        );
        assert!(RuleBasedHypothesisSource::default()
            .generate(&plan(), &summary)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_single_segment_generates_nothing() {
        let summary = summary(vec![segment("creative_type", "Video", 1.0)], 0.0);
        assert!(RuleBasedHypothesisSource::default()
            .generate(&plan(), &summary)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_all_rules_and_cap() {
        let summary = summary(
            vec![
                segment("creative_type", "Video", 3.0),
                segment("creative_type", "Image", 1.0),
                segment("audience_type", "Broad", 2.5),
                segment("audience_type", "Lookalike", 1.5),
                segment("platform", "Instagram", 3.0),
                segment("platform", "Facebook", 1.0),
            ],
            -25.0,
        );
        let all = RuleBasedHypothesisSource::default().generate(&plan(), &summary).unwrap();
        let ids: Vec<_> = all.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, ["H1", "H2", "H3", "H4"]);
        assert_eq!(all[1].statement, "Audience saturation in Lookalike campaigns");

        let capped = RuleBasedHypothesisSource::new(2).generate(&plan(), &summary).unwrap();
        assert_eq!(capped.len(), 2);
    }
}
