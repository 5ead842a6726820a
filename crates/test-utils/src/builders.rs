#![allow(dead_code)]

use std::sync::Arc;

use taskgraph::{TaskFn, TaskGraph, TaskId, TaskOptions};

use crate::fake_runner::FakeRunner;

/// Fluent builder for constructing a [`TaskGraph`] in tests. Every task
/// added via [`task`](Self::task) shares one [`FakeRunner`], so a test can
/// inspect dispatch order or mark ids to fail without touching the graph
/// directly.
pub struct TaskGraphBuilder {
    graph: TaskGraph,
    runner: FakeRunner,
}

impl TaskGraphBuilder {
    pub fn new() -> Self {
        TaskGraphBuilder {
            graph: TaskGraph::new(),
            runner: FakeRunner::new(),
        }
    }

    pub fn with_runner(runner: FakeRunner) -> Self {
        TaskGraphBuilder {
            graph: TaskGraph::new(),
            runner,
        }
    }

    pub fn runner(&self) -> &FakeRunner {
        &self.runner
    }

    /// Registers `id` using the shared fake runner.
    pub fn task(mut self, id: &str) -> Self {
        let func = self.runner.task_fn();
        self.graph
            .add_task(id, func, TaskOptions::default())
            .expect("duplicate task id in test builder");
        self
    }

    /// Registers `id` with a custom `TaskFn`, bypassing the shared runner.
    pub fn task_with_fn(mut self, id: &str, func: Arc<dyn TaskFn>) -> Self {
        self.graph
            .add_task(id, func, TaskOptions::default())
            .expect("duplicate task id in test builder");
        self
    }

    /// Declares that `id` depends on every id in `prereqs`.
    pub fn depends_on<const N: usize>(mut self, id: &str, prereqs: [&str; N]) -> Self {
        let prereqs: Vec<TaskId> = prereqs.iter().map(|p| TaskId::from(*p)).collect();
        self.graph
            .add_dependency(id, prereqs)
            .expect("invalid dependency in test builder");
        self
    }

    pub fn build(self) -> (TaskGraph, FakeRunner) {
        (self.graph, self.runner)
    }
}

impl Default for TaskGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
