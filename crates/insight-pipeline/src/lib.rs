//! # insight-pipeline
//!
//! Sequences an analysis run over campaign performance data:
//!
//! 1. **plan**: a [`PlanProvider`] turns the question into an [`AnalysisPlan`]
//!    (primary metric, current and comparison windows)
//! 2. **summarize**: period totals, segment breakdown, trends, anomalies
//! 3. **hypothesize**: a [`HypothesisSource`] proposes explanations
//! 4. **validate**: each hypothesis is scored by the
//!    [`StatisticalValidator`](insight_validate::StatisticalValidator)
//! 5. **recommend**: one ranked action per actionable hypothesis
//!
//! Stages 2-5 run as a dependency graph on the
//! [`DependencyTaskScheduler`](insight_scheduler::DependencyTaskScheduler).
//! Progress is published on an [`EventBus`] and every run is traced in a
//! [`RunLog`].
//!
//! ## Example
//!
//! ```rust
//! use chrono::{Duration, NaiveDate};
//! use insight_core::{Row, TabularDataset};
//! use insight_pipeline::{AnalysisConfig, MetricsHandler, PipelineCoordinator};
//!
//! let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
//! let rows = (0..28).flat_map(|d| {
//!     let date = start + Duration::days(d);
//!     let facebook = if d < 14 { 4.0 } else { 2.0 };
//!     [("Facebook", facebook), ("Instagram", 3.0)].map(|(platform, roas)| {
//!         Row::new(date)
//!             .with_dimension("platform", platform)
//!             .with_measure("roas", roas + (d % 3) as f64 * 0.1)
//!             .with_measure("spend", 100.0)
//!             .with_measure("revenue", 100.0 * roas)
//!     })
//! });
//! let dataset: TabularDataset = rows.collect();
//!
//! let metrics = MetricsHandler::new();
//! let config = AnalysisConfig {
//!     lookback_days: 14,
//!     ..AnalysisConfig::default()
//! };
//! let mut coordinator = PipelineCoordinator::new(config)?;
//! coordinator.events().register(metrics.clone())?;
//!
//! let report = coordinator.run("Why did ROAS drop?", &dataset)?;
//! assert_eq!(report.plan.primary_metric, "roas");
//! assert_eq!(metrics.snapshot()?.completed_runs, 1);
//! # Ok::<(), insight_pipeline::PipelineError>(())
//! ```

pub mod config;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod hypothesize;
pub mod plan;
pub mod recommend;
pub mod run_log;
pub mod stage;
pub mod summary;

pub use config::{AnalysisConfig, DEFAULT_SEGMENTS};
pub use context::{PipelineContext, Value};
pub use coordinator::{PipelineCoordinator, PipelineReport};
pub use error::{PipelineError, Result};
pub use events::{
    EventBus, EventHandler, LoggingHandler, MetricsHandler, NullEventHandler, PipelineEvent,
    PipelineMetrics,
};
pub use hypothesize::{HypothesisSource, RuleBasedHypothesisSource};
pub use plan::{AnalysisPlan, PlanProvider, PlannedSubtask, RuleBasedPlanner};
pub use recommend::{recommend, Recommendation};
pub use run_log::{EntryPayload, JsonRunLog, MemoryRunLog, RunLog, RunLogEntry, RunRecord, RunStatus};
pub use stage::Stage;
pub use summary::{
    summarize, Anomaly, DataSummary, PeriodStats, SegmentPerformance, Trend, TrendDirection, Trends,
};
