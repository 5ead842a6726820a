// src/scheduler/mod.rs

//! The Scheduler (Queue Manager): drives a [`TaskGraph`](crate::graph::TaskGraph)
//! to completion under a bounded, runtime-adjustable worker pool.
//!
//! The pure coordination state machine lives in [`core`]; the async/IO
//! shell that actually spawns worker tasks is in [`engine`].

mod core;
mod engine;
mod events;
mod options;
mod task_state;

pub use core::{CoreStep, SchedulerCore};
pub use engine::Scheduler;
pub use events::{SchedulerEvent, TaskInfo};
pub use options::SchedulerOptions;
pub use task_state::{Mode, Outcome, Stats};
