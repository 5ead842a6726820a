// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::graph::TaskId;

/// Every failure kind the engine can raise, synchronously or via an event.
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("task {0:?} is already registered")]
    DuplicateTask(TaskId),

    #[error("task {0:?} is not registered")]
    UnknownTask(TaskId),

    #[error("adding this dependency would introduce a cycle at {0:?}")]
    Cycle(TaskId),

    #[error("invalid argument: {0}")]
    Validation(String),

    /// Wraps a user `TaskFn` failure. Never raised synchronously; only carried
    /// on a `task-error` event.
    #[error("task {task_id:?} failed: {message}")]
    TaskExecution { task_id: TaskId, message: String },

    #[error("failed to sample host utilization: {0}")]
    Sampling(String),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        EngineError::Other(format!("{err:#}"))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
