//! # campaign-insights
//!
//! Ad performance analysis: plan, summarize, hypothesize, validate and
//! recommend over campaign data, with the stages executed by a
//! dependency-aware task scheduler.
//!
//! This crate re-exports the workspace crates:
//!
//! - [`core`]: the read-only [`TabularDataset`](core::TabularDataset), time
//!   windows and CSV ingestion
//! - [`scheduler`]: [`DependencyTaskScheduler`](scheduler::DependencyTaskScheduler)
//!   with isolated task failures and cycle detection
//! - [`validate`]: the [`StatisticalValidator`](validate::StatisticalValidator)
//!   scoring hypotheses with t-tests and Cohen's d
//! - [`pipeline`]: the [`PipelineCoordinator`](pipeline::PipelineCoordinator)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use campaign_insights::prelude::*;
//!
//! let dataset = TabularDataset::from_csv_path("data/ads.csv", &CsvSchema::default())?;
//! let config = AnalysisConfig::from_json_path("config/analysis.json")?;
//!
//! let mut coordinator = PipelineCoordinator::new(config)?
//!     .with_run_log(JsonRunLog::new("logs"));
//! let report = coordinator.run("Why did ROAS drop last week?", &dataset)?;
//!
//! for v in &report.validation.validated_hypotheses {
//!     println!("{} {:.2} {}", v.id, v.confidence, v.statement);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use insight_core as core;
pub use insight_pipeline as pipeline;
pub use insight_scheduler as scheduler;
pub use insight_validate as validate;

/// Common imports for running an analysis
pub mod prelude {
    pub use insight_core::{CsvSchema, Row, TabularDataset, TimeWindow, WindowPair};
    pub use insight_pipeline::{
        AnalysisConfig, EventBus, JsonRunLog, LoggingHandler, MemoryRunLog, MetricsHandler,
        PipelineCoordinator, PipelineError, PipelineReport,
    };
    pub use insight_scheduler::{DependencyTaskScheduler, SchedulerConfig, TaskGraph, TaskNode};
    pub use insight_validate::{Hypothesis, StatisticalValidator, ValidationConfig};
}
