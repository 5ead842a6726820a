// src/scheduler/events.rs

use crate::graph::TaskId;

use super::task_state::Stats;

/// Lightweight task description carried on `task-start`/`task-complete`/
/// `task-error` events. The full `Task` record (which owns the boxed
/// `TaskFn`) is not itself part of the payload — it is not meaningfully
/// serializable and subscribers only ever need the id and label.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub id: TaskId,
    pub label: Option<String>,
}

/// Everything the Scheduler publishes on its event bus. See `6. EXTERNAL
/// INTERFACES` for the payload shapes this mirrors.
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    TaskStart {
        task: TaskInfo,
    },
    TaskComplete {
        task: TaskInfo,
        result: crate::graph::TaskOutput,
    },
    TaskError {
        task: TaskInfo,
        error: String,
    },
    QueueComplete(Stats),
    /// Additive event (see design notes): emitted when the scheduler reaches
    /// quiescence without completing, i.e. failures blocked the remainder.
    QueueStalled(Stats),
    Paused,
    Resumed,
    Stopped,
    Reset,
    ConcurrencyChanged(usize),
}
