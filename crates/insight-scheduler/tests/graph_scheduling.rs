//! Integration tests for batch and graph execution

mod common;

use common::{span, timed_node, timeline};
use insight_scheduler::{DependencyTaskScheduler, SchedulerError, Task, TaskGraph, TaskNode};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn test_linear_chain_runs_in_dependency_order() {
    let tl = timeline();
    let graph = TaskGraph::new()
        .with(timed_node("S1", 20, &tl))
        .and_then(|g| g.with(timed_node("S2", 5, &tl).depends_on(["S1"])))
        .and_then(|g| g.with(timed_node("S3", 5, &tl).depends_on(["S2"])))
        .and_then(|g| g.with(timed_node("S4", 5, &tl).depends_on(["S3"])))
        .unwrap();

    let results = DependencyTaskScheduler::default().run_graph(graph).unwrap();
    assert_eq!(results.len(), 4);
    assert!(results.values().all(|o| o.is_success()));

    for (before, after) in [("S1", "S2"), ("S2", "S3"), ("S3", "S4")] {
        let (_, finished) = span(&tl, before);
        let (started, _) = span(&tl, after);
        assert!(started >= finished, "{after} started before {before} finished");
    }
}

#[test]
fn test_batch_concurrency_is_bounded_by_workers() {
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<Task<usize>> = (0..8)
        .map(|i| {
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            Task::new(format!("t{i}"), move || {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(40));
                active.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, String>(i)
            })
        })
        .collect();

    let scheduler = DependencyTaskScheduler::with_workers(3).unwrap();
    let results = scheduler.run_batch(tasks).unwrap();

    assert_eq!(results.len(), 8);
    let peak = peak.load(Ordering::SeqCst);
    assert!(peak > 1, "tasks never overlapped");
    assert!(peak <= 3, "peak concurrency {peak} exceeded the worker limit");
}

#[test]
fn test_independent_roots_share_a_wave() {
    let tl = timeline();
    let graph = TaskGraph::new()
        .with(timed_node("left", 60, &tl))
        .and_then(|g| g.with(timed_node("right", 60, &tl)))
        .and_then(|g| g.with(timed_node("join", 1, &tl).depends_on(["left", "right"])))
        .unwrap();

    assert_eq!(
        graph.waves().unwrap(),
        vec![vec!["left".to_string(), "right".to_string()], vec!["join".to_string()]]
    );

    DependencyTaskScheduler::default().run_graph(graph).unwrap();
    let (left_start, left_end) = span(&tl, "left");
    let (right_start, right_end) = span(&tl, "right");
    assert!(left_start < right_end && right_start < left_end, "roots did not overlap");
}

#[test]
fn test_missing_dependency_is_structural_error() {
    let graph = TaskGraph::new()
        .with(TaskNode::new("report", || Ok::<_, String>(())).depends_on(["summary"]))
        .unwrap();
    let err = DependencyTaskScheduler::default().run_graph(graph).unwrap_err();
    assert_eq!(
        err,
        SchedulerError::Unsatisfiable {
            stuck: vec!["report".to_string()],
            missing: vec!["summary".to_string()],
        }
    );
}

#[test]
fn test_empty_graph() {
    let results = DependencyTaskScheduler::default()
        .run_graph(TaskGraph::<()>::new())
        .unwrap();
    assert!(results.is_empty());
}

/// Random DAG: node `i` may only depend on nodes with a smaller index
fn dag_strategy() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1usize..12).prop_flat_map(|n| {
        (0..n)
            .map(|i| proptest::sample::subsequence((0..i).collect::<Vec<_>>(), 0..=i))
            .collect::<Vec<_>>()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_acyclic_graph_completes_each_task_once(deps in dag_strategy()) {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut graph = TaskGraph::new();
        for (i, parents) in deps.iter().enumerate() {
            let runs = Arc::clone(&runs);
            let node = TaskNode::new(format!("n{i}"), move || {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(i)
            })
            .depends_on(parents.iter().map(|p| format!("n{p}")));
            graph.add(node).unwrap();
        }

        let results = DependencyTaskScheduler::default().run_graph(graph).unwrap();
        prop_assert_eq!(results.len(), deps.len());
        prop_assert_eq!(runs.load(Ordering::SeqCst), deps.len());
        for i in 0..deps.len() {
            prop_assert_eq!(results[&format!("n{i}")].success(), Some(&i));
        }
    }

    #[test]
    fn prop_back_edge_is_unsatisfiable(n in 2usize..8) {
        let mut graph = TaskGraph::new();
        for i in 0..n {
            // node i depends on i+1 and the last node closes the loop
            let next = (i + 1) % n;
            graph
                .add(TaskNode::new(format!("c{i}"), || Ok::<_, String>(())).depends_on([format!("c{next}")]))
                .unwrap();
        }
        let is_unsatisfiable = matches!(
            DependencyTaskScheduler::default().run_graph(graph),
            Err(SchedulerError::Unsatisfiable { ref stuck, .. }) if stuck.len() == n
        );
        prop_assert!(is_unsatisfiable);
    }
}
