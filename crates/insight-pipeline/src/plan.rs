//! Turning a question into an analysis plan

use crate::config::AnalysisConfig;
use crate::stage::Stage;
use crate::{PipelineError, Result};
use insight_core::{DatasetProfile, WindowPair};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One planned step; the coordinator schedules the matching stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedSubtask {
    pub task_id: String,
    pub description: String,
    pub stage: Stage,
    pub priority: u32,
    pub depends_on: Vec<String>,
}

/// What to analyze and over which windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPlan {
    pub query_interpretation: String,
    pub primary_metric: String,
    pub windows: WindowPair,
    pub lookback_days: u32,
    /// Dimensions broken down in the summary
    pub segments: Vec<String>,
    pub subtasks: Vec<PlannedSubtask>,
    pub success_criteria: String,
}

impl AnalysisPlan {
    /// Planned subtask for a stage, if any
    pub fn subtask(&self, stage: Stage) -> Option<&PlannedSubtask> {
        self.subtasks.iter().find(|t| t.stage == stage)
    }

    /// Scheduling priority of a stage; 0 when the plan does not mention it
    pub fn priority(&self, stage: Stage) -> u32 {
        self.subtask(stage).map_or(0, |t| t.priority)
    }
}

/// Produces the plan that stage 0 hands to the rest of the pipeline
pub trait PlanProvider: Send + Sync {
    fn plan(&self, query: &str, profile: &DatasetProfile) -> Result<AnalysisPlan>;
}

/// Keyword-driven planner
///
/// The metric is the first of `roas`, `ctr`, `revenue` named in the query
/// (default `roas`). "last week"/"last 7 days" selects 7-day windows and
/// "last month"/"last 30 days" 30-day windows; otherwise the configured
/// lookback applies. The current window ends on the latest date in the data.
#[derive(Debug, Clone)]
pub struct RuleBasedPlanner {
    lookback_days: u32,
    segments: Vec<String>,
}

impl RuleBasedPlanner {
    pub fn new(lookback_days: u32, segments: Vec<String>) -> Self {
        Self {
            lookback_days,
            segments,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.lookback_days, config.segments.clone())
    }

    fn metric_for(query: &str) -> &'static str {
        ["roas", "ctr", "revenue"]
            .into_iter()
            .find(|m| query.contains(m))
            .unwrap_or("roas")
    }

    fn lookback_for(&self, query: &str) -> u32 {
        if query.contains("last week") || query.contains("last 7 days") {
            7
        } else if query.contains("last month") || query.contains("last 30 days") {
            30
        } else {
            self.lookback_days
        }
    }
}

impl Default for RuleBasedPlanner {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl PlanProvider for RuleBasedPlanner {
    fn plan(&self, query: &str, profile: &DatasetProfile) -> Result<AnalysisPlan> {
        let lowered = query.to_lowercase();
        let metric = Self::metric_for(&lowered);
        let lookback_days = self.lookback_for(&lowered);
        if lookback_days == 0 {
            return Err(PipelineError::Plan("lookback must be at least one day".to_string()));
        }

        let windows = WindowPair::trailing(profile.max_date, lookback_days)?;
        let upper = metric.to_uppercase();
        debug!(metric, lookback_days, current = %windows.current, "Planned analysis");

        Ok(AnalysisPlan {
            query_interpretation: format!(
                "Analyze {upper} performance in the most recent {lookback_days}-day period"
            ),
            primary_metric: metric.to_string(),
            windows,
            lookback_days,
            segments: self.segments.clone(),
            subtasks: subtasks(&upper),
            success_criteria: format!(
                "Identify validated reasons for {upper} changes with confidence >0.6 and provide actionable recommendations"
            ),
        })
    }
}

fn subtasks(metric: &str) -> Vec<PlannedSubtask> {
    let descriptions = [
        "Load and summarize data for the planned windows".to_string(),
        format!("Generate hypotheses for {metric} patterns"),
        "Validate hypotheses with statistical tests".to_string(),
        "Recommend actions for validated hypotheses".to_string(),
    ];
    Stage::GRAPH
        .into_iter()
        .zip(descriptions)
        .enumerate()
        .map(|(i, (stage, description))| PlannedSubtask {
            task_id: format!("T{}", i + 1),
            description,
            stage,
            priority: i as u32 + 1,
            depends_on: if i == 0 { Vec::new() } else { vec![format!("T{i}")] },
        })
        .collect()
}
