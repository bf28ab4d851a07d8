//! Runs plan, then the summarize/hypothesize/validate/recommend graph

use crate::config::AnalysisConfig;
use crate::context::{PipelineContext, Value};
use crate::events::{EventBus, PipelineEvent};
use crate::hypothesize::{HypothesisSource, RuleBasedHypothesisSource};
use crate::plan::{AnalysisPlan, PlanProvider, RuleBasedPlanner};
use crate::recommend::{recommend, Recommendation};
use crate::run_log::{MemoryRunLog, RunLog, RunStatus};
use crate::stage::Stage;
use crate::summary::{summarize, DataSummary};
use crate::{PipelineError, Result};
use insight_core::{DatasetProfile, TabularDataset};
use insight_scheduler::{DependencyTaskScheduler, ResultMap, TaskGraph, TaskNode, TaskOutcome};
use insight_validate::{Hypothesis, StatisticalValidator, ValidationReport};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

/// Everything a successful run produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub query: String,
    pub plan: AnalysisPlan,
    pub summary: DataSummary,
    pub hypotheses: Vec<Hypothesis>,
    pub validation: ValidationReport,
    pub recommendations: Vec<Recommendation>,
    /// Wall-clock time per stage in milliseconds
    pub stage_timings_ms: BTreeMap<Stage, f64>,
}

/// Write-once output of one stage
struct StageSlot<T>(OnceLock<T>);

impl<T> StageSlot<T> {
    fn new() -> Self {
        Self(OnceLock::new())
    }

    fn fill(&self, stage: Stage, value: T) -> Result<()> {
        self.0
            .set(value)
            .map_err(|_| PipelineError::Execution(format!("stage '{stage}' output already set")))
    }

    fn require(&self, stage: Stage) -> Result<&T> {
        self.0.get().ok_or_else(|| {
            PipelineError::Execution(format!("upstream stage '{stage}' produced no output"))
        })
    }
}

/// Outputs shared between the stage tasks of one run
struct StageOutputs {
    summary: StageSlot<DataSummary>,
    hypotheses: StageSlot<Vec<Hypothesis>>,
    validation: StageSlot<ValidationReport>,
    recommendations: StageSlot<Vec<Recommendation>>,
    timings: Mutex<BTreeMap<Stage, Duration>>,
}

impl StageOutputs {
    fn new() -> Self {
        Self {
            summary: StageSlot::new(),
            hypotheses: StageSlot::new(),
            validation: StageSlot::new(),
            recommendations: StageSlot::new(),
            timings: Mutex::new(BTreeMap::new()),
        }
    }

    fn record_elapsed(&self, stage: Stage, elapsed: Duration) -> Result<()> {
        self.timings
            .lock()
            .map_err(|e| PipelineError::lock("stage timings", e))?
            .insert(stage, elapsed);
        Ok(())
    }

    fn output_json(&self, stage: Stage) -> Result<serde_json::Value> {
        let value = match stage {
            Stage::Summarize => serde_json::to_value(self.summary.require(stage)?)?,
            Stage::Hypothesize => serde_json::to_value(self.hypotheses.require(stage)?)?,
            Stage::Validate => serde_json::to_value(self.validation.require(stage)?)?,
            Stage::Recommend => serde_json::to_value(self.recommendations.require(stage)?)?,
            Stage::Plan => serde_json::Value::Null,
        };
        Ok(value)
    }
}

/// Sequences one analysis run
///
/// Planning runs first on the calling thread. The remaining stages form the
/// chain summarize -> hypothesize -> validate -> recommend, executed by the
/// [`DependencyTaskScheduler`]; the validate stage fans out one scheduler task
/// per hypothesis. The first failed stage ends the run as
/// [`PipelineError::StageFailed`] and the run log is closed as failed.
///
/// ```rust,no_run
/// use insight_core::{CsvSchema, TabularDataset};
/// use insight_pipeline::{AnalysisConfig, PipelineCoordinator};
///
/// let dataset = TabularDataset::from_csv_path("data/ads.csv", &CsvSchema::default())?;
/// let mut coordinator = PipelineCoordinator::new(AnalysisConfig::default())?;
/// let report = coordinator.run("Why did ROAS drop last week?", &dataset)?;
/// for rec in &report.recommendations {
///     println!("{}. {} -> {}", rec.rank, rec.segment, rec.description);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct PipelineCoordinator {
    config: AnalysisConfig,
    planner: Box<dyn PlanProvider>,
    source: Arc<dyn HypothesisSource>,
    validator: StatisticalValidator,
    scheduler: DependencyTaskScheduler,
    run_log: Box<dyn RunLog>,
    events: EventBus,
}

impl PipelineCoordinator {
    /// Coordinator with the rule-based planner and hypothesis source and an
    /// in-memory run log
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let scheduler = DependencyTaskScheduler::new(config.scheduler.clone())?;
        let validator =
            StatisticalValidator::new(config.validation.clone())?.with_scheduler(scheduler.clone());
        Ok(Self {
            planner: Box::new(RuleBasedPlanner::from_config(&config)),
            source: Arc::new(RuleBasedHypothesisSource::new(config.max_hypotheses)),
            validator,
            scheduler,
            run_log: Box::new(MemoryRunLog::new()),
            events: EventBus::new(),
            config,
        })
    }

    pub fn with_planner(mut self, planner: impl PlanProvider + 'static) -> Self {
        self.planner = Box::new(planner);
        self
    }

    pub fn with_hypothesis_source(mut self, source: impl HypothesisSource + 'static) -> Self {
        self.source = Arc::new(source);
        self
    }

    pub fn with_run_log(mut self, run_log: impl RunLog + 'static) -> Self {
        self.run_log = Box::new(run_log);
        self
    }

    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Run the whole pipeline for one query
    pub fn run(&mut self, query: &str, dataset: &TabularDataset) -> Result<PipelineReport> {
        let mut context = PipelineContext::new();
        context.set_metadata("query", Value::String(query.to_string()));
        context.set_metadata("rows", Value::Integer(dataset.len() as i64));
        let run_id = context.trace_id;
        info!(%run_id, query, rows = dataset.len(), "Pipeline run started");

        self.run_log.open(run_id, query)?;
        self.events.publish(
            PipelineEvent::PipelineStarted {
                trace_id: run_id,
                query: query.to_string(),
            },
            &context,
        );

        match self.execute(query, dataset, &mut context) {
            Ok(report) => {
                self.run_log.close(RunStatus::Succeeded)?;
                self.events.publish(
                    PipelineEvent::PipelineCompleted {
                        trace_id: run_id,
                        duration: context.elapsed(),
                        recommendations: report.recommendations.len(),
                    },
                    &context,
                );
                info!(%run_id, elapsed = ?context.elapsed(), "Pipeline run succeeded");
                Ok(report)
            }
            Err(e) => {
                if let Err(close_err) = self.run_log.close(RunStatus::Failed) {
                    warn!(error = %close_err, "Could not close run log");
                }
                self.events.publish(
                    PipelineEvent::PipelineError {
                        trace_id: run_id,
                        stage: e.stage(),
                        error: e.to_string(),
                    },
                    &context,
                );
                warn!(%run_id, error = %e, "Pipeline run failed");
                Err(e)
            }
        }
    }

    fn execute(
        &mut self,
        query: &str,
        dataset: &TabularDataset,
        context: &mut PipelineContext,
    ) -> Result<PipelineReport> {
        let plan = self.plan(query, dataset, context)?;

        let outputs = Arc::new(StageOutputs::new());
        let graph = self.build_graph(&plan, dataset, &outputs, context)?;
        let results = self.scheduler.run_graph(graph)?;
        self.surface_failures(&results)?;

        for stage in Stage::GRAPH {
            self.run_log.record_stage(stage, outputs.output_json(stage)?)?;
        }
        let timings = outputs
            .timings
            .lock()
            .map_err(|e| PipelineError::lock("stage timings", e))?
            .clone();
        for (stage, elapsed) in timings {
            context.record_stage_timing(stage, elapsed);
        }

        Ok(PipelineReport {
            run_id: context.trace_id,
            query: query.to_string(),
            summary: outputs.summary.require(Stage::Summarize)?.clone(),
            hypotheses: outputs.hypotheses.require(Stage::Hypothesize)?.clone(),
            validation: outputs.validation.require(Stage::Validate)?.clone(),
            recommendations: outputs.recommendations.require(Stage::Recommend)?.clone(),
            stage_timings_ms: context
                .stage_timings()
                .iter()
                .map(|(stage, d)| (*stage, d.as_secs_f64() * 1000.0))
                .collect(),
            plan,
        })
    }

    fn plan(
        &mut self,
        query: &str,
        dataset: &TabularDataset,
        context: &mut PipelineContext,
    ) -> Result<AnalysisPlan> {
        let trace_id = context.trace_id;
        self.events.publish(
            PipelineEvent::StageStarted {
                trace_id,
                stage: Stage::Plan,
            },
            context,
        );

        let planner = &self.planner;
        let planned = context.time_stage(Stage::Plan, || -> Result<AnalysisPlan> {
            let profile = DatasetProfile::of(dataset)?;
            planner.plan(query, &profile)
        });

        match planned {
            Ok(plan) => {
                self.run_log
                    .record_stage(Stage::Plan, serde_json::to_value(&plan)?)?;
                let duration = context
                    .stage_timings()
                    .get(&Stage::Plan)
                    .copied()
                    .unwrap_or_default();
                self.events.publish(
                    PipelineEvent::StageCompleted {
                        trace_id,
                        stage: Stage::Plan,
                        duration,
                    },
                    context,
                );
                Ok(plan)
            }
            Err(e) => {
                self.record_error(Stage::Plan, &e.to_string());
                Err(e)
            }
        }
    }

    /// A sink failure must not mask the stage error being recorded
    fn record_error(&mut self, stage: Stage, message: &str) {
        if let Err(log_err) = self.run_log.record_error(stage, message) {
            warn!(%stage, error = %log_err, "Could not record stage error");
        }
    }

    /// Record every failed stage; report the first in stage order
    fn surface_failures(&mut self, results: &ResultMap<()>) -> Result<()> {
        let mut first = None;
        for stage in Stage::GRAPH {
            let message = match results.get(stage.as_str()) {
                Some(TaskOutcome::Success(())) => continue,
                Some(TaskOutcome::Failed(failure)) => failure.message.clone(),
                None => "no result recorded".to_string(),
            };
            self.record_error(stage, &message);
            first.get_or_insert(PipelineError::StageFailed { stage, message });
        }
        first.map_or(Ok(()), Err)
    }

    fn build_graph(
        &self,
        plan: &AnalysisPlan,
        dataset: &TabularDataset,
        outputs: &Arc<StageOutputs>,
        context: &PipelineContext,
    ) -> Result<TaskGraph<()>> {
        let plan = Arc::new(plan.clone());

        let summarize_node = {
            let (plan, outputs, dataset) = (Arc::clone(&plan), Arc::clone(outputs), dataset.clone());
            let priority = plan.priority(Stage::Summarize);
            self.stage_node(Stage::Summarize, priority, outputs.clone(), context, move || {
                outputs
                    .summary
                    .fill(Stage::Summarize, summarize(&dataset, &plan)?)
            })
        };

        let hypothesize_node = {
            let (plan, outputs) = (Arc::clone(&plan), Arc::clone(outputs));
            let source = Arc::clone(&self.source);
            let (events, ctx) = (self.events.clone(), context.clone());
            let priority = plan.priority(Stage::Hypothesize);
            self.stage_node(Stage::Hypothesize, priority, outputs.clone(), context, move || {
                let summary = outputs.summary.require(Stage::Summarize)?;
                let hypotheses = source.generate(&plan, summary)?;
                events.publish(
                    PipelineEvent::HypothesesGenerated {
                        trace_id: ctx.trace_id,
                        count: hypotheses.len(),
                    },
                    &ctx,
                );
                outputs.hypotheses.fill(Stage::Hypothesize, hypotheses)
            })
        };

        let validate_node = {
            let (plan, outputs, dataset) = (Arc::clone(&plan), Arc::clone(outputs), dataset.clone());
            let validator = self.validator.clone();
            let (events, ctx) = (self.events.clone(), context.clone());
            let priority = plan.priority(Stage::Validate);
            self.stage_node(Stage::Validate, priority, outputs.clone(), context, move || {
                let hypotheses = outputs.hypotheses.require(Stage::Hypothesize)?;
                let report = validator.validate_all(
                    hypotheses,
                    &dataset.window(&plan.windows.current),
                    &dataset.window(&plan.windows.comparison),
                    &plan.primary_metric,
                )?;
                for v in &report.validated_hypotheses {
                    events.publish(
                        PipelineEvent::HypothesisValidated {
                            trace_id: ctx.trace_id,
                            hypothesis_id: v.id.clone(),
                            confidence: v.confidence,
                            actionable: v.actionable,
                        },
                        &ctx,
                    );
                }
                outputs.validation.fill(Stage::Validate, report)
            })
        };

        let recommend_node = {
            let outputs = Arc::clone(outputs);
            let priority = plan.priority(Stage::Recommend);
            self.stage_node(Stage::Recommend, priority, outputs.clone(), context, move || {
                let report = outputs.validation.require(Stage::Validate)?;
                outputs
                    .recommendations
                    .fill(Stage::Recommend, recommend(report))
            })
        };

        let graph = TaskGraph::new()
            .with(summarize_node)?
            .with(hypothesize_node)?
            .with(validate_node)?
            .with(recommend_node)?;
        Ok(graph)
    }

    /// Wrap a stage body with timing and stage events
    fn stage_node<F>(
        &self,
        stage: Stage,
        priority: u32,
        outputs: Arc<StageOutputs>,
        context: &PipelineContext,
        body: F,
    ) -> TaskNode<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        let events = self.events.clone();
        let context = context.clone();
        TaskNode::new(stage.as_str(), move || -> Result<()> {
            events.publish(
                PipelineEvent::StageStarted {
                    trace_id: context.trace_id,
                    stage,
                },
                &context,
            );
            let start = Instant::now();
            body()?;
            let duration = start.elapsed();
            outputs.record_elapsed(stage, duration)?;
            events.publish(
                PipelineEvent::StageCompleted {
                    trace_id: context.trace_id,
                    stage,
                    duration,
                },
                &context,
            );
            Ok(())
        })
        .depends_on(stage.upstream().map(|s| s.as_str()))
        .with_priority(priority)
    }
}
