// src/graph/mod.rs

//! The Task Graph: dependency storage, incremental cycle detection, and the
//! ready-set / topological-order queries the scheduler drives off of.

mod dag;
mod task;

pub use dag::TaskGraph;
pub use task::{BoxFuture, Task, TaskFn, TaskId, TaskOptions, TaskOutput};
