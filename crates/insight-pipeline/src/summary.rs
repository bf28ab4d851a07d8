//! Descriptive summary of the planned windows
//!
//! Feeds hypothesis generation: period totals, per-segment performance in
//! the current window, half-split trends and z-score anomalies.

use crate::plan::AnalysisPlan;
use crate::Result;
use insight_core::math::{mean, percent_change, round_to, std_dev};
use insight_core::{DataQuality, TabularDataset, TimeWindow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Segments with fewer rows are left out of the breakdown
pub const MIN_SEGMENT_ROWS: usize = 5;
/// Relative change below which a trend counts as stable, in percent
pub const STABLE_BELOW_PCT: f64 = 5.0;
pub const ANOMALY_Z: f64 = 3.0;
pub const MIN_ANOMALY_VALUES: usize = 10;
pub const MAX_ANOMALIES: usize = 5;

/// Totals over one slice of the data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub period: Option<TimeWindow>,
    pub rows: usize,
    pub total_spend: f64,
    pub total_revenue: f64,
    pub total_purchases: f64,
    /// Revenue over spend, 0 without spend
    pub avg_roas: f64,
    pub avg_ctr: Option<f64>,
}

impl PeriodStats {
    pub fn of(dataset: &TabularDataset, period: Option<TimeWindow>) -> Self {
        let total_spend = dataset.sum("spend");
        let total_revenue = dataset.sum("revenue");
        Self {
            period,
            rows: dataset.len(),
            total_spend,
            total_revenue,
            total_purchases: dataset.sum("purchases"),
            avg_roas: if total_spend > 0.0 {
                total_revenue / total_spend
            } else {
                0.0
            },
            avg_ctr: dataset.mean("ctr"),
        }
    }
}

/// Headline value of `metric` for a period
///
/// `roas` is aggregate revenue over spend and `ctr` the mean ctr; any other
/// measure is its plain mean.
pub fn headline_value(stats: &PeriodStats, dataset: &TabularDataset, metric: &str) -> Option<f64> {
    match metric {
        "roas" => Some(stats.avg_roas),
        "ctr" => stats.avg_ctr,
        other => dataset.mean(other),
    }
}

/// One value of a dimension within the current window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentPerformance {
    pub dimension: String,
    pub value: String,
    /// Mean of the primary metric over the segment's rows
    pub metric_mean: f64,
    pub avg_ctr: Option<f64>,
    /// Segment spend over window spend, 0 without spend
    pub spend_share: f64,
    pub n: usize,
}

/// Direction of a metric within a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Declining,
    Stable,
    InsufficientData,
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub direction: TrendDirection,
    /// Second half mean relative to first half mean, in percent (1 decimal)
    pub change_pct: f64,
}

impl Trend {
    /// Compare the means of the earlier and later halves of `values`
    ///
    /// An odd middle value belongs to the later half.
    pub fn of(values: &[f64]) -> Self {
        if values.len() < 2 {
            return Self::flat(TrendDirection::InsufficientData);
        }
        let (first, second) = values.split_at(values.len() / 2);
        let first = mean(first);
        if first == 0.0 {
            return Self::flat(TrendDirection::Undefined);
        }

        let change = (mean(second) - first) / first * 100.0;
        let direction = if change.abs() < STABLE_BELOW_PCT {
            TrendDirection::Stable
        } else if change > 0.0 {
            TrendDirection::Increasing
        } else {
            TrendDirection::Declining
        };
        Self {
            direction,
            change_pct: round_to(change, 1),
        }
    }

    fn flat(direction: TrendDirection) -> Self {
        Self {
            direction,
            change_pct: 0.0,
        }
    }
}

/// Within-window trends and period-over-period change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trends {
    pub metric: String,
    pub metric_trend: Trend,
    /// Current vs comparison headline value, in percent (1 decimal)
    pub metric_change_pct: f64,
    pub ctr_trend: Trend,
    pub ctr_change_pct: f64,
}

/// Single observation far from the window mean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub date: NaiveDate,
    pub metric: String,
    pub value: f64,
    pub z_score: f64,
    pub note: String,
}

/// Rows whose value lies more than [`ANOMALY_Z`] sample standard deviations
/// from the mean, in dataset order, at most [`MAX_ANOMALIES`]
pub fn detect_anomalies(dataset: &TabularDataset, metric: &str) -> Vec<Anomaly> {
    let values = dataset.values(metric);
    if values.len() < MIN_ANOMALY_VALUES {
        return Vec::new();
    }
    let m = mean(&values);
    let sd = std_dev(&values);
    if sd == 0.0 {
        return Vec::new();
    }

    dataset
        .iter()
        .filter_map(|row| {
            let value = row.measure(metric)?;
            let z_score = (value - m) / sd;
            (z_score.abs() > ANOMALY_Z).then(|| Anomaly {
                date: row.date(),
                metric: metric.to_string(),
                value,
                z_score,
                note: format!(
                    "Unusually {} {metric}",
                    if z_score > 0.0 { "high" } else { "low" }
                ),
            })
        })
        .take(MAX_ANOMALIES)
        .collect()
}

/// Output of the summarize stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSummary {
    pub data_quality: DataQuality,
    pub overall: PeriodStats,
    pub current: PeriodStats,
    pub comparison: PeriodStats,
    /// Headline value of the primary metric in each window
    pub current_metric: Option<f64>,
    pub comparison_metric: Option<f64>,
    /// Keyed by dimension; each list sorted by metric mean, best first
    pub segment_breakdown: BTreeMap<String, Vec<SegmentPerformance>>,
    pub trends: Trends,
    pub anomalies: Vec<Anomaly>,
}

impl DataSummary {
    pub fn segments(&self, dimension: &str) -> &[SegmentPerformance] {
        self.segment_breakdown
            .get(dimension)
            .map_or(&[], Vec::as_slice)
    }
}

/// Summarize the dataset over the plan's windows
///
/// # Errors
///
/// Fails when the current window holds no rows.
#[instrument(skip_all, fields(metric = %plan.primary_metric, rows = dataset.len()))]
pub fn summarize(dataset: &TabularDataset, plan: &AnalysisPlan) -> Result<DataSummary> {
    let metric = plan.primary_metric.as_str();
    let current_ds = dataset.window(&plan.windows.current);
    if current_ds.is_empty() {
        return Err(insight_core::Error::empty_dataset("current window summary").into());
    }
    let comparison_ds = dataset.window(&plan.windows.comparison);

    let overall = PeriodStats::of(dataset, None);
    let current = PeriodStats::of(&current_ds, Some(plan.windows.current));
    let comparison = PeriodStats::of(&comparison_ds, Some(plan.windows.comparison));

    let current_metric = headline_value(&current, &current_ds, metric);
    let comparison_metric = headline_value(&comparison, &comparison_ds, metric);

    let sorted = current_ds.sorted_by_date();
    let trends = Trends {
        metric: metric.to_string(),
        metric_trend: Trend::of(&sorted.values(metric)),
        metric_change_pct: change_pct(current_metric, comparison_metric),
        ctr_trend: Trend::of(&sorted.values("ctr")),
        ctr_change_pct: change_pct(current.avg_ctr, comparison.avg_ctr),
    };

    let segment_breakdown: BTreeMap<_, _> = plan
        .segments
        .iter()
        .filter(|d| current_ds.has_dimension(d))
        .map(|d| (d.clone(), segment_breakdown(&current_ds, d, metric)))
        .collect();

    let summary = DataSummary {
        data_quality: DataQuality::assess(dataset),
        overall,
        current,
        comparison,
        current_metric,
        comparison_metric,
        segment_breakdown,
        trends,
        anomalies: detect_anomalies(&current_ds, metric),
    };
    debug!(
        change_pct = summary.trends.metric_change_pct,
        anomalies = summary.anomalies.len(),
        "Summarized windows"
    );
    Ok(summary)
}

fn change_pct(current: Option<f64>, previous: Option<f64>) -> f64 {
    match (current, previous) {
        (Some(c), Some(p)) => round_to(percent_change(c, p), 1),
        _ => 0.0,
    }
}

/// Per-value performance of one dimension, best metric first
///
/// Values with fewer than [`MIN_SEGMENT_ROWS`] rows or no metric values are
/// skipped; ties keep value order.
pub fn segment_breakdown(
    dataset: &TabularDataset,
    dimension: &str,
    metric: &str,
) -> Vec<SegmentPerformance> {
    let total_spend = dataset.sum("spend");
    let mut segments: Vec<SegmentPerformance> = dataset
        .group_by(dimension)
        .into_iter()
        .filter(|(_, rows)| rows.len() >= MIN_SEGMENT_ROWS)
        .filter_map(|(value, rows)| {
            Some(SegmentPerformance {
                dimension: dimension.to_string(),
                metric_mean: rows.mean(metric)?,
                avg_ctr: rows.mean("ctr"),
                spend_share: if total_spend > 0.0 {
                    rows.sum("spend") / total_spend
                } else {
                    0.0
                },
                n: rows.len(),
                value,
            })
        })
        .collect();
    segments.sort_by(|a, b| b.metric_mean.total_cmp(&a.metric_mean));
    segments
}
