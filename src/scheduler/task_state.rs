// src/scheduler/task_state.rs

use std::time::SystemTime;

use serde::Serialize;

/// Mode the scheduler's state machine is in. Transitions only happen via
/// `Start`/`Pause`/`Resume`/`Stop`/`Reset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Running,
    Paused,
    Stopped,
}

/// What a settled (no longer running) task produced.
#[derive(Debug, Clone)]
pub enum Outcome {
    Success(crate::graph::TaskOutput),
    Failure(String),
}

/// A point-in-time snapshot of scheduler counters, handed out by `Stats()`
/// and carried on `queue-complete`/`queue-stalled` events.
#[derive(Debug, Clone, Serialize, Default)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub running: usize,
    pub queued: usize,
    pub concurrency: usize,
    pub processing: bool,
    pub paused: bool,
    pub started_at: Option<SystemTime>,
    pub ended_at: Option<SystemTime>,
}
