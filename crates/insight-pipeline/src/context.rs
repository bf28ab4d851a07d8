//! Per-run execution context
//!
//! A `PipelineContext` is created for every run. It carries the trace id that
//! ties together log entries, events and the run log, plus the wall-clock
//! time spent in each stage.

use crate::stage::Stage;
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Dynamic value type for metadata
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Value {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Context that flows through one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineContext {
    /// Unique trace ID for this run; doubles as the run id
    pub trace_id: Uuid,
    /// When the run started
    pub start_time: Instant,
    /// Arbitrary metadata such as the query and row count
    pub metadata: HashMap<String, Value>,
    stage_timings: BTreeMap<Stage, Duration>,
}

impl PipelineContext {
    pub fn new() -> Self {
        Self::with_trace_id(Uuid::new_v4())
    }

    /// Create a context with a specific trace ID
    pub fn with_trace_id(trace_id: Uuid) -> Self {
        Self {
            trace_id,
            start_time: Instant::now(),
            metadata: HashMap::new(),
            stage_timings: BTreeMap::new(),
        }
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: Value) {
        self.metadata.insert(key.into(), value);
    }

    pub fn get_metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    pub fn record_stage_timing(&mut self, stage: Stage, duration: Duration) {
        self.stage_timings.insert(stage, duration);
    }

    /// Time a closure and record it against `stage`
    pub fn time_stage<F, R>(&mut self, stage: Stage, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        self.record_stage_timing(stage, start.elapsed());
        result
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn stage_timings(&self) -> &BTreeMap<Stage, Duration> {
        &self.stage_timings
    }
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_timing() {
        let mut ctx = PipelineContext::new();

        let result = ctx.time_stage(Stage::Plan, || {
            std::thread::sleep(Duration::from_millis(10));
            42
        });

        assert_eq!(result, 42);
        assert!(ctx.stage_timings()[&Stage::Plan] >= Duration::from_millis(10));
    }

    #[test]
    fn test_metadata() {
        let mut ctx = PipelineContext::new();
        ctx.set_metadata("rows", Value::Integer(120));
        ctx.set_metadata("query", Value::String("Why did ROAS drop?".to_string()));
        assert_eq!(ctx.get_metadata("rows").and_then(Value::as_float), Some(120.0));
        assert_eq!(
            ctx.get_metadata("query").and_then(Value::as_string),
            Some("Why did ROAS drop?")
        );
        assert_eq!(ctx.get_metadata("missing"), None);
    }

    #[test]
    fn test_distinct_trace_ids() {
        assert_ne!(PipelineContext::new().trace_id, PipelineContext::new().trace_id);
    }
}
