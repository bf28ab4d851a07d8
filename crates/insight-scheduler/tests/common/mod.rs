//! Shared utilities for scheduler integration tests

use insight_scheduler::TaskNode;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Start and finish instants recorded by each task
pub type Timeline = Arc<Mutex<Vec<(String, Instant, Instant)>>>;

pub fn timeline() -> Timeline {
    Arc::new(Mutex::new(Vec::new()))
}

/// A node that sleeps for `millis` and records when it ran
pub fn timed_node(id: &str, millis: u64, timeline: &Timeline) -> TaskNode<String> {
    let timeline = Arc::clone(timeline);
    let name = id.to_string();
    TaskNode::new(id, move || {
        let start = Instant::now();
        thread::sleep(Duration::from_millis(millis));
        let end = Instant::now();
        timeline
            .lock()
            .map_err(|e| e.to_string())?
            .push((name.clone(), start, end));
        Ok::<_, String>(name)
    })
}

pub fn span(timeline: &Timeline, id: &str) -> (Instant, Instant) {
    let entries = timeline.lock().unwrap();
    let (_, start, end) = entries
        .iter()
        .find(|(name, _, _)| name == id)
        .unwrap_or_else(|| panic!("{id} never ran"));
    (*start, *end)
}
