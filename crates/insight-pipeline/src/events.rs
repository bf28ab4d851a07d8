//! Event-based run notification
//!
//! Handlers registered on an [`EventBus`] observe a pipeline run (logging,
//! metrics, test probes) without the coordinator knowing about them. Stage
//! events are emitted from worker threads, so handlers must be `Send + Sync`.

use crate::context::PipelineContext;
use crate::stage::Stage;
use crate::{PipelineError, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn, Level};
use uuid::Uuid;

/// Event emitted during a pipeline run
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    PipelineStarted {
        trace_id: Uuid,
        query: String,
    },

    /// A stage task began running
    StageStarted {
        trace_id: Uuid,
        stage: Stage,
    },

    /// A stage task produced its output
    StageCompleted {
        trace_id: Uuid,
        stage: Stage,
        duration: Duration,
    },

    HypothesesGenerated {
        trace_id: Uuid,
        count: usize,
    },

    HypothesisValidated {
        trace_id: Uuid,
        hypothesis_id: String,
        confidence: f64,
        actionable: bool,
    },

    PipelineCompleted {
        trace_id: Uuid,
        duration: Duration,
        recommendations: usize,
    },

    /// The run failed; `stage` is absent for failures outside a stage
    PipelineError {
        trace_id: Uuid,
        stage: Option<Stage>,
        error: String,
    },
}

impl PipelineEvent {
    pub fn trace_id(&self) -> Uuid {
        match self {
            Self::PipelineStarted { trace_id, .. }
            | Self::StageStarted { trace_id, .. }
            | Self::StageCompleted { trace_id, .. }
            | Self::HypothesesGenerated { trace_id, .. }
            | Self::HypothesisValidated { trace_id, .. }
            | Self::PipelineCompleted { trace_id, .. }
            | Self::PipelineError { trace_id, .. } => *trace_id,
        }
    }
}

/// Trait for handling pipeline events
pub trait EventHandler: Send + Sync {
    fn handle_event(&self, event: &PipelineEvent, context: &PipelineContext);

    /// Check if this handler is interested in a particular event type
    fn is_interested(&self, event: &PipelineEvent) -> bool {
        let _ = event;
        true
    }

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Event bus for distributing events to multiple handlers
///
/// Clones share the same handler list.
pub struct EventBus {
    handlers: Arc<Mutex<Vec<Box<dyn EventHandler>>>>,
    enabled: Arc<Mutex<bool>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(Vec::new())),
            enabled: Arc::new(Mutex::new(true)),
        }
    }

    pub fn register<H>(&self, handler: H) -> Result<()>
    where
        H: EventHandler + 'static,
    {
        let mut handlers = self
            .handlers
            .lock()
            .map_err(|e| PipelineError::lock("handlers", e))?;
        handlers.push(Box::new(handler));
        Ok(())
    }

    /// Emit an event to all interested handlers
    pub fn emit(&self, event: PipelineEvent, context: &PipelineContext) -> Result<()> {
        if !self.is_enabled()? {
            return Ok(());
        }

        let handlers = self
            .handlers
            .lock()
            .map_err(|e| PipelineError::lock("handlers", e))?;

        for handler in handlers.iter() {
            if handler.is_interested(&event) {
                handler.handle_event(&event, context);
            }
        }

        Ok(())
    }

    /// Emit, logging instead of returning a dispatch failure
    pub fn publish(&self, event: PipelineEvent, context: &PipelineContext) {
        if let Err(e) = self.emit(event, context) {
            warn!(error = %e, "Event dispatch failed");
        }
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        let mut state = self
            .enabled
            .lock()
            .map_err(|e| PipelineError::lock("enabled state", e))?;
        *state = enabled;
        Ok(())
    }

    pub fn is_enabled(&self) -> Result<bool> {
        let state = self
            .enabled
            .lock()
            .map_err(|e| PipelineError::lock("enabled state", e))?;
        Ok(*state)
    }

    pub fn handler_count(&self) -> Result<usize> {
        let handlers = self
            .handlers
            .lock()
            .map_err(|e| PipelineError::lock("handlers", e))?;
        Ok(handlers.len())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            handlers: Arc::clone(&self.handlers),
            enabled: Arc::clone(&self.enabled),
        }
    }
}

/// Forwards run milestones to `tracing` at a fixed level
pub struct LoggingHandler {
    level: Level,
}

impl LoggingHandler {
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    fn log(&self, message: std::fmt::Arguments<'_>) {
        match self.level {
            Level::ERROR => error!("{message}"),
            Level::WARN => warn!("{message}"),
            Level::INFO => info!("{message}"),
            Level::DEBUG => debug!("{message}"),
            Level::TRACE => trace!("{message}"),
        }
    }
}

impl EventHandler for LoggingHandler {
    fn handle_event(&self, event: &PipelineEvent, _context: &PipelineContext) {
        match event {
            PipelineEvent::PipelineStarted { trace_id, query } => {
                self.log(format_args!("Pipeline started: {trace_id} ({query})"));
            }
            PipelineEvent::StageCompleted { stage, duration, .. } => {
                self.log(format_args!("Stage {stage} completed in {duration:?}"));
            }
            PipelineEvent::PipelineCompleted {
                trace_id,
                duration,
                recommendations,
            } => {
                self.log(format_args!(
                    "Pipeline completed: {trace_id} in {duration:?} with {recommendations} recommendations"
                ));
            }
            PipelineEvent::PipelineError {
                trace_id,
                stage,
                error: message,
            } => {
                let stage = stage.map_or("pipeline", |s| s.as_str());
                error!("Pipeline error in {stage}: {message} (trace: {trace_id})");
            }
            _ => {
                trace!("Pipeline event: {event:?}");
            }
        }
    }
}

/// Counters accumulated by a [`MetricsHandler`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineMetrics {
    pub total_runs: usize,
    pub completed_runs: usize,
    pub hypotheses_generated: usize,
    pub hypotheses_validated: usize,
    pub actionable: usize,
    /// Failures keyed by stage name, or `pipeline` outside a stage
    pub errors: HashMap<String, usize>,
}

/// Metrics collection handler
///
/// Clones share the same counters, so a clone kept by the caller sees what
/// the registered handler recorded.
#[derive(Clone, Default)]
pub struct MetricsHandler {
    metrics: Arc<Mutex<PipelineMetrics>>,
}

impl MetricsHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Result<PipelineMetrics> {
        let metrics = self
            .metrics
            .lock()
            .map_err(|e| PipelineError::lock("metrics", e))?;
        Ok(metrics.clone())
    }
}

impl EventHandler for MetricsHandler {
    fn handle_event(&self, event: &PipelineEvent, _context: &PipelineContext) {
        let Ok(mut metrics) = self.metrics.lock() else {
            error!("Failed to lock metrics");
            return;
        };

        match event {
            PipelineEvent::PipelineStarted { .. } => metrics.total_runs += 1,
            PipelineEvent::PipelineCompleted { .. } => metrics.completed_runs += 1,
            PipelineEvent::HypothesesGenerated { count, .. } => {
                metrics.hypotheses_generated += count;
            }
            PipelineEvent::HypothesisValidated { actionable, .. } => {
                metrics.hypotheses_validated += 1;
                if *actionable {
                    metrics.actionable += 1;
                }
            }
            PipelineEvent::PipelineError { stage, .. } => {
                let key = stage.map_or("pipeline", |s| s.as_str());
                *metrics.errors.entry(key.to_string()).or_insert(0) += 1;
            }
            _ => {}
        }
    }
}

/// Null event handler that does nothing
#[derive(Default, Clone)]
pub struct NullEventHandler;

impl EventHandler for NullEventHandler {
    fn handle_event(&self, _event: &PipelineEvent, _context: &PipelineContext) {}

    fn is_interested(&self, _event: &PipelineEvent) -> bool {
        false
    }
}
