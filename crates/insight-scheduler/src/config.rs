//! Scheduler configuration

use crate::{Result, SchedulerError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default size of the per-call worker pool
pub const DEFAULT_MAX_WORKERS: usize = 3;

/// Worker limit and optional per-task time budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Threads in the pool built for each `run_batch` call
    ///
    /// Bounds concurrency only while no task has timed out: a timed-out
    /// task keeps running on its own thread after its worker moves on.
    pub max_workers: usize,
    /// Tasks running longer than this are recorded as failed
    ///
    /// The overrunning closure is not cancelled and its result is discarded.
    pub task_timeout_ms: Option<u64>,
}

impl SchedulerConfig {
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(SchedulerError::InvalidParameter(
                "max_workers must be at least 1".to_string(),
            ));
        }
        if self.task_timeout_ms == Some(0) {
            return Err(SchedulerError::InvalidParameter(
                "task_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            task_timeout_ms: None,
        }
    }
}
