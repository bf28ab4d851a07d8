//! # insight-scheduler
//!
//! Dependency-aware task execution on a bounded worker pool.
//!
//! Independent tasks go through [`DependencyTaskScheduler::run_batch`]; tasks
//! with declared dependencies go through [`DependencyTaskScheduler::run_graph`],
//! which runs the graph in waves of ready tasks. A task that fails is captured
//! in the result map as [`TaskOutcome::Failed`]; only structural problems such
//! as a cycle are returned as [`SchedulerError`].
//!
//! ```
//! use insight_scheduler::{DependencyTaskScheduler, TaskGraph, TaskNode};
//!
//! let graph = TaskGraph::new()
//!     .with(TaskNode::new("load", || Ok::<_, String>(1)))?
//!     .with(TaskNode::new("report", || Ok::<_, String>(2)).depends_on(["load"]))?;
//!
//! let results = DependencyTaskScheduler::default().run_graph(graph)?;
//! assert_eq!(results["report"].success(), Some(&2));
//! # Ok::<(), insight_scheduler::SchedulerError>(())
//! ```

pub mod config;
pub mod error;
pub mod scheduler;
pub mod task;

pub use config::{SchedulerConfig, DEFAULT_MAX_WORKERS};
pub use error::{Result, SchedulerError};
pub use scheduler::DependencyTaskScheduler;
pub use task::{FailureKind, ResultMap, Task, TaskFailure, TaskGraph, TaskNode, TaskOutcome, Work};
