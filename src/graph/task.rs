// src/graph/task.rs

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Error as AnyError;

/// Opaque, user-supplied identifier for a task, unique within one [`TaskGraph`](super::TaskGraph).
///
/// Cheap to clone (backed by an `Arc<str>`) since ids are passed around the
/// scheduler's running set, ready queue and every emitted event.
#[derive(Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TaskId(Arc<str>);

impl TaskId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId(Arc::from(s))
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        TaskId(Arc::from(s.as_str()))
    }
}

impl serde::Serialize for TaskId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

/// Result produced by a successful [`TaskFn`] run.
///
/// The engine never inspects the payload; it is opaque user data carried
/// through to the `task-complete` event.
pub type TaskOutput = Arc<dyn std::any::Any + Send + Sync>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The unit of work a task performs: given its own id, produce a result or
/// fail with an error. Tasks are a capability, not a class hierarchy — any
/// closure with this shape qualifies.
pub trait TaskFn: Send + Sync {
    fn run(&self, task_id: TaskId) -> BoxFuture<'static, Result<TaskOutput, AnyError>>;
}

impl<F, Fut> TaskFn for F
where
    F: Fn(TaskId) -> Fut + Send + Sync,
    Fut: Future<Output = Result<TaskOutput, AnyError>> + Send + 'static,
{
    fn run(&self, task_id: TaskId) -> BoxFuture<'static, Result<TaskOutput, AnyError>> {
        Box::pin(self(task_id))
    }
}

/// Per-task options recognized by `AddTask`. Empty today but kept as a
/// struct (rather than threading bare arguments) so new knobs don't break
/// callers — mirrors how the rest of the construction-time options in this
/// crate are modeled.
#[derive(Debug, Clone, Default)]
pub struct TaskOptions {
    /// Free-form label surfaced in logs and on the `Task` record; does not
    /// affect scheduling.
    pub label: Option<String>,
}

/// An immutable task record. Never mutated after registration; completion
/// is tracked separately by the graph.
pub struct Task {
    pub id: TaskId,
    pub opts: TaskOptions,
    pub(crate) func: Arc<dyn TaskFn>,
}

impl Task {
    pub fn new(id: TaskId, func: Arc<dyn TaskFn>, opts: TaskOptions) -> Self {
        Task { id, opts, func }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

impl Clone for Task {
    fn clone(&self) -> Self {
        Task {
            id: self.id.clone(),
            opts: self.opts.clone(),
            func: Arc::clone(&self.func),
        }
    }
}
