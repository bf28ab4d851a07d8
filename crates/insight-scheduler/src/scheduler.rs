//! Wave-based execution on a bounded rayon pool

use crate::config::SchedulerConfig;
use crate::task::{FailureKind, ResultMap, Task, TaskFailure, TaskGraph, TaskOutcome, Work};
use crate::{Result, SchedulerError};
use rayon::prelude::*;
use rayon::ThreadPool;
use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Executes independent batches and dependency graphs of tasks
///
/// Holds only its configuration. Every call builds its own worker pool and
/// drops it before returning, so calls never share scheduling state.
///
/// At most `max_workers` tasks run on the pool at once. With a task timeout
/// configured, a task that overruns is abandoned on a detached thread and
/// may still be running while later tasks start, so the number of live
/// closures can exceed `max_workers`.
#[derive(Debug, Clone, Default)]
pub struct DependencyTaskScheduler {
    config: SchedulerConfig,
}

impl DependencyTaskScheduler {
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Scheduler with the given worker limit and no timeout
    pub fn with_workers(max_workers: usize) -> Result<Self> {
        Self::new(SchedulerConfig::default().with_max_workers(max_workers))
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Run independent tasks concurrently
    ///
    /// Every task gets an entry in the returned map. A task that returns an
    /// error, panics, or overruns the configured timeout is recorded as
    /// [`TaskOutcome::Failed`] without affecting its siblings.
    #[instrument(skip(self, tasks), fields(tasks = tasks.len(), workers = self.config.max_workers))]
    pub fn run_batch<T: Send + 'static>(&self, tasks: Vec<Task<T>>) -> Result<ResultMap<T>> {
        let mut seen = HashSet::with_capacity(tasks.len());
        for task in &tasks {
            if !seen.insert(task.name.as_str()) {
                return Err(SchedulerError::DuplicateTask(task.name.clone()));
            }
        }
        if tasks.is_empty() {
            return Ok(ResultMap::new());
        }

        let pool = self.build_pool()?;
        Ok(self.run_wave(&pool, tasks).into_iter().collect())
    }

    /// Run a dependency graph wave by wave
    ///
    /// The whole graph is planned before anything runs, so an unsatisfiable
    /// graph fails without executing any task. Each wave starts only after
    /// the previous wave has fully joined.
    #[instrument(skip(self, graph), fields(tasks = graph.len(), workers = self.config.max_workers))]
    pub fn run_graph<T: Send + 'static>(&self, graph: TaskGraph<T>) -> Result<ResultMap<T>> {
        let waves = graph.waves()?;
        let mut results = ResultMap::new();
        if waves.is_empty() {
            return Ok(results);
        }

        let pool = self.build_pool()?;
        let mut nodes = graph.into_nodes();

        for (index, wave) in waves.into_iter().enumerate() {
            debug!(wave = index, ready = ?wave, "Starting wave");
            let tasks: Vec<Task<T>> = wave
                .iter()
                .filter_map(|id| nodes.remove(id))
                .map(|node| node.into_task())
                .collect();

            for (id, outcome) in self.run_wave(&pool, tasks) {
                results.insert(id, outcome);
            }
            debug!(wave = index, completed = results.len(), "Wave joined");
        }

        Ok(results)
    }

    fn build_pool(&self) -> Result<ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.max_workers)
            .thread_name(|i| format!("insight-worker-{i}"))
            .build()
            .map_err(|e| SchedulerError::Pool(e.to_string()))
    }

    fn run_wave<T: Send + 'static>(
        &self,
        pool: &ThreadPool,
        tasks: Vec<Task<T>>,
    ) -> Vec<(String, TaskOutcome<T>)> {
        let timeout = self.config.task_timeout();
        pool.install(|| {
            tasks
                .into_par_iter()
                // one task per split
                .with_max_len(1)
                .map(|task| execute(task, timeout))
                .collect()
        })
    }
}

fn execute<T: Send + 'static>(task: Task<T>, timeout: Option<Duration>) -> (String, TaskOutcome<T>) {
    let Task { name, work } = task;
    let result = match timeout {
        None => run_guarded(work),
        Some(limit) => run_with_timeout(work, limit),
    };

    let outcome = match result {
        Ok(value) => TaskOutcome::Success(value),
        Err((message, kind)) => {
            warn!(task = %name, ?kind, error = %message, "Task failed");
            TaskOutcome::Failed(TaskFailure::new(name.clone(), message, kind))
        }
    };
    (name, outcome)
}

type Captured<T> = std::result::Result<T, (String, FailureKind)>;

fn run_guarded<T>(work: Work<T>) -> Captured<T> {
    match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(message)) => Err((message, FailureKind::Error)),
        Err(payload) => Err((panic_message(payload.as_ref()), FailureKind::Panic)),
    }
}

/// Run on a dedicated thread and stop waiting once `limit` elapses
///
/// An overrunning closure cannot be cancelled; it finishes on its own thread
/// and its result is dropped.
fn run_with_timeout<T: Send + 'static>(work: Work<T>, limit: Duration) -> Captured<T> {
    let (tx, rx) = mpsc::sync_channel(1);
    let spawned = thread::Builder::new()
        .name("insight-timed-task".to_string())
        .spawn(move || {
            let _ = tx.send(run_guarded(work));
        });
    if let Err(e) = spawned {
        return Err((format!("could not spawn task thread: {e}"), FailureKind::Error));
    }

    match rx.recv_timeout(limit) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => Err((
            format!("timed out after {} ms", limit.as_millis()),
            FailureKind::Timeout,
        )),
        Err(mpsc::RecvTimeoutError::Disconnected) => Err((
            "task thread exited without a result".to_string(),
            FailureKind::Panic,
        )),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
