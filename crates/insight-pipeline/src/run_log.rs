//! Sinks recording the trace of a pipeline run
//!
//! A run log is opened once per run, receives the output or error of every
//! stage, and is closed with the final status. [`MemoryRunLog`] keeps the
//! record in memory; [`JsonRunLog`] also writes it to disk on close.

use crate::stage::Stage;
use crate::{PipelineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryPayload {
    Output { output: serde_json::Value },
    Error { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub timestamp: DateTime<Utc>,
    pub stage: Stage,
    #[serde(flatten)]
    pub payload: EntryPayload,
}

/// Everything recorded for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub query: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub entries: Vec<RunLogEntry>,
}

impl RunRecord {
    fn new(run_id: Uuid, query: &str) -> Self {
        Self {
            run_id,
            query: query.to_string(),
            status: RunStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
            entries: Vec::new(),
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = (Stage, &str)> + '_ {
        self.entries.iter().filter_map(|e| match &e.payload {
            EntryPayload::Error { error } => Some((e.stage, error.as_str())),
            EntryPayload::Output { .. } => None,
        })
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.entries.iter().map(|e| e.stage).collect()
    }
}

/// Destination for run traces
pub trait RunLog: Send {
    /// Start a new record, discarding any previous one
    fn open(&mut self, run_id: Uuid, query: &str) -> Result<()>;

    fn record_stage(&mut self, stage: Stage, output: serde_json::Value) -> Result<()>;

    fn record_error(&mut self, stage: Stage, message: &str) -> Result<()>;

    /// Finish the record with its final status
    fn close(&mut self, status: RunStatus) -> Result<()>;
}

/// In-memory run log; clones share the same record
#[derive(Debug, Clone, Default)]
pub struct MemoryRunLog {
    record: Arc<Mutex<Option<RunRecord>>>,
}

impl MemoryRunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current record, `None` before the first `open`
    pub fn snapshot(&self) -> Result<Option<RunRecord>> {
        let record = self
            .record
            .lock()
            .map_err(|e| PipelineError::lock("run log", e))?;
        Ok(record.clone())
    }

    fn with_record<R>(&self, f: impl FnOnce(&mut RunRecord) -> R) -> Result<R> {
        let mut guard = self
            .record
            .lock()
            .map_err(|e| PipelineError::lock("run log", e))?;
        let record = guard
            .as_mut()
            .ok_or_else(|| PipelineError::RunLog("run log is not open".to_string()))?;
        Ok(f(record))
    }

    fn push(&self, stage: Stage, payload: EntryPayload) -> Result<()> {
        self.with_record(|r| {
            r.entries.push(RunLogEntry {
                timestamp: Utc::now(),
                stage,
                payload,
            })
        })
    }
}

impl RunLog for MemoryRunLog {
    fn open(&mut self, run_id: Uuid, query: &str) -> Result<()> {
        let mut guard = self
            .record
            .lock()
            .map_err(|e| PipelineError::lock("run log", e))?;
        *guard = Some(RunRecord::new(run_id, query));
        Ok(())
    }

    fn record_stage(&mut self, stage: Stage, output: serde_json::Value) -> Result<()> {
        self.push(stage, EntryPayload::Output { output })
    }

    fn record_error(&mut self, stage: Stage, message: &str) -> Result<()> {
        self.push(
            stage,
            EntryPayload::Error {
                error: message.to_string(),
            },
        )
    }

    fn close(&mut self, status: RunStatus) -> Result<()> {
        self.with_record(|r| {
            r.status = status;
            r.finished_at = Some(Utc::now());
        })
    }
}

/// Run log written as pretty JSON to `<dir>/run_<run id>.json` on close
#[derive(Debug, Clone)]
pub struct JsonRunLog {
    dir: PathBuf,
    inner: MemoryRunLog,
}

impl JsonRunLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            inner: MemoryRunLog::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, run_id: Uuid) -> PathBuf {
        self.dir.join(format!("run_{run_id}.json"))
    }

    pub fn snapshot(&self) -> Result<Option<RunRecord>> {
        self.inner.snapshot()
    }
}

impl RunLog for JsonRunLog {
    fn open(&mut self, run_id: Uuid, query: &str) -> Result<()> {
        self.inner.open(run_id, query)
    }

    fn record_stage(&mut self, stage: Stage, output: serde_json::Value) -> Result<()> {
        self.inner.record_stage(stage, output)
    }

    fn record_error(&mut self, stage: Stage, message: &str) -> Result<()> {
        self.inner.record_error(stage, message)
    }

    fn close(&mut self, status: RunStatus) -> Result<()> {
        self.inner.close(status)?;
        let record = self
            .inner
            .snapshot()?
            .ok_or_else(|| PipelineError::RunLog("run log is not open".to_string()))?;

        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(record.run_id);
        fs::write(&path, serde_json::to_string_pretty(&record)?)?;
        info!(path = %path.display(), ?status, "Run log written");
        debug!(entries = record.entries.len(), "Run log entries");
        Ok(())
    }
}
