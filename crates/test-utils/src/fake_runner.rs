use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use taskgraph::{TaskFn, TaskId, TaskOutput};

/// A scriptable `TaskFn` factory for scheduler tests: records dispatch order
/// and lets a test mark specific task ids to fail, with an optional
/// artificial delay shared by every task it produces.
///
/// One `FakeRunner` is typically shared across every task registered in a
/// test's graph (`graph.add_task(id, runner.task_fn(), opts)`), the same way
/// the teacher crate's fake executor records everything it is asked to run.
#[derive(Clone, Default)]
pub struct FakeRunner {
    executed: Arc<Mutex<Vec<TaskId>>>,
    failures: Arc<Mutex<HashSet<TaskId>>>,
    delay: Option<Duration>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Marks `id` to fail the next (and every subsequent) time it runs.
    pub fn fail(self, id: impl Into<TaskId>) -> Self {
        self.failures.lock().unwrap().insert(id.into());
        self
    }

    /// Ids in the order their `TaskFn` actually ran, including failures.
    pub fn executed(&self) -> Vec<TaskId> {
        self.executed.lock().unwrap().clone()
    }

    pub fn task_fn(&self) -> Arc<dyn TaskFn> {
        let executed = Arc::clone(&self.executed);
        let failures = Arc::clone(&self.failures);
        let delay = self.delay;
        Arc::new(move |id: TaskId| {
            let executed = Arc::clone(&executed);
            let failures = Arc::clone(&failures);
            async move {
                if let Some(d) = delay {
                    tokio::time::sleep(d).await;
                }
                executed.lock().unwrap().push(id.clone());
                if failures.lock().unwrap().contains(&id) {
                    Err(anyhow::anyhow!("scripted failure for {id}"))
                } else {
                    let out: TaskOutput = Arc::new(());
                    Ok(out)
                }
            }
        })
    }
}
