//! Units of work, their outcomes, and the dependency graph
//!
//! A unit of work is a boxed `FnOnce` closure. Any state a task needs, including
//! data produced by the tasks it depends on, is captured by the closure when
//! the graph is built; the scheduler itself only orders execution.

use crate::{Result, SchedulerError};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

/// A boxed unit of work returning a payload or an error message
pub type Work<T> = Box<dyn FnOnce() -> std::result::Result<T, String> + Send + 'static>;

/// Per-task outcomes keyed by task id
pub type ResultMap<T> = BTreeMap<String, TaskOutcome<T>>;

/// An independent named unit of work for [`run_batch`](crate::DependencyTaskScheduler::run_batch)
pub struct Task<T> {
    pub(crate) name: String,
    pub(crate) work: Work<T>,
}

impl<T> Task<T> {
    /// Wrap a fallible closure; its error is captured by its `Display` text
    pub fn new<F, E>(name: impl Into<String>, work: F) -> Self
    where
        F: FnOnce() -> std::result::Result<T, E> + Send + 'static,
        E: fmt::Display,
    {
        Self {
            name: name.into(),
            work: Box::new(move || work().map_err(|e| e.to_string())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("name", &self.name).finish_non_exhaustive()
    }
}

/// How a task failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The closure returned an error
    Error,
    /// The closure panicked
    Panic,
    /// The closure overran the configured time budget
    Timeout,
}

/// A captured task failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskFailure {
    pub task_id: String,
    #[serde(rename = "error")]
    pub message: String,
    pub kind: FailureKind,
}

impl TaskFailure {
    pub fn new(task_id: impl Into<String>, message: impl Into<String>, kind: FailureKind) -> Self {
        Self {
            task_id: task_id.into(),
            message: message.into(),
            kind,
        }
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task '{}' failed: {}", self.task_id, self.message)
    }
}

impl std::error::Error for TaskFailure {}

/// Write-once result of one task: its payload or its captured failure
///
/// Serializes as the bare payload on success and as
/// `{"task_id": ..., "error": ..., "kind": ...}` on failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TaskOutcome<T> {
    Success(T),
    Failed(TaskFailure),
}

impl<T> TaskOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            Self::Success(v) => Some(v),
            Self::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&TaskFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failed(f) => Some(f),
        }
    }

    pub fn into_result(self) -> std::result::Result<T, TaskFailure> {
        match self {
            Self::Success(v) => Ok(v),
            Self::Failed(f) => Err(f),
        }
    }
}

/// A task inside a [`TaskGraph`]
pub struct TaskNode<T> {
    pub(crate) id: String,
    pub(crate) work: Work<T>,
    pub(crate) dependencies: Vec<String>,
    /// Informational only; never used for ordering
    pub(crate) priority: u32,
}

impl<T> TaskNode<T> {
    pub fn new<F, E>(id: impl Into<String>, work: F) -> Self
    where
        F: FnOnce() -> std::result::Result<T, E> + Send + 'static,
        E: fmt::Display,
    {
        let Task { name, work } = Task::new(id, work);
        Self {
            id: name,
            work,
            dependencies: Vec::new(),
            priority: 0,
        }
    }

    pub fn depends_on<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(dependencies.into_iter().map(Into::into));
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub(crate) fn into_task(self) -> Task<T> {
        Task {
            name: self.id,
            work: self.work,
        }
    }
}

impl<T> fmt::Debug for TaskNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskNode")
            .field("id", &self.id)
            .field("dependencies", &self.dependencies)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Tasks with declared dependencies, in insertion order
pub struct TaskGraph<T> {
    nodes: Vec<TaskNode<T>>,
    ids: HashSet<String>,
}

impl<T> TaskGraph<T> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            ids: HashSet::new(),
        }
    }

    /// Add a node; ids must be unique within the graph
    pub fn add(&mut self, node: TaskNode<T>) -> Result<&mut Self> {
        if !self.ids.insert(node.id.clone()) {
            return Err(SchedulerError::DuplicateTask(node.id));
        }
        self.nodes.push(node);
        Ok(self)
    }

    /// Builder form of [`add`](Self::add)
    pub fn with(mut self, node: TaskNode<T>) -> Result<Self> {
        self.add(node)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TaskNode<T>> + '_ {
        self.nodes.iter()
    }

    /// Partition the graph into waves of ready tasks
    ///
    /// Wave `k` holds every task, in insertion order, whose dependencies all
    /// sit in waves `0..k`. If tasks remain while no task is ready, the graph
    /// has a cycle or names a dependency that is not in the graph.
    pub fn waves(&self) -> Result<Vec<Vec<String>>> {
        let mut completed: HashSet<&str> = HashSet::with_capacity(self.nodes.len());
        let mut waves = Vec::new();

        while completed.len() < self.nodes.len() {
            let ready: Vec<&str> = self
                .nodes
                .iter()
                .filter(|n| !completed.contains(n.id.as_str()))
                .filter(|n| n.dependencies.iter().all(|d| completed.contains(d.as_str())))
                .map(|n| n.id.as_str())
                .collect();

            if ready.is_empty() {
                return Err(self.unsatisfiable(&completed));
            }

            completed.extend(ready.iter().copied());
            waves.push(ready.into_iter().map(str::to_string).collect());
        }

        Ok(waves)
    }

    fn unsatisfiable(&self, completed: &HashSet<&str>) -> SchedulerError {
        let stuck: BTreeSet<String> = self
            .nodes
            .iter()
            .filter(|n| !completed.contains(n.id.as_str()))
            .map(|n| n.id.clone())
            .collect();
        let missing: BTreeSet<String> = self
            .nodes
            .iter()
            .flat_map(|n| n.dependencies.iter())
            .filter(|d| !self.ids.contains(d.as_str()))
            .cloned()
            .collect();
        SchedulerError::Unsatisfiable {
            stuck: stuck.into_iter().collect(),
            missing: missing.into_iter().collect(),
        }
    }

    /// Take ownership of the nodes keyed by id
    pub(crate) fn into_nodes(self) -> HashMap<String, TaskNode<T>> {
        self.nodes.into_iter().map(|n| (n.id.clone(), n)).collect()
    }
}

impl<T> Default for TaskGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TaskGraph<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.nodes.iter()).finish()
    }
}
