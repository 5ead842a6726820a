// src/lib.rs

//! A local, in-process engine that executes a user-supplied set of tasks
//! whose ordering is constrained by a DAG of dependencies, under a bounded,
//! dynamically adjustable degree of concurrency.
//!
//! Three pieces, in dependency order:
//! - [`graph`]: the Task Graph — dependency storage, incremental cycle
//!   detection, ready-set and topological-order queries.
//! - [`scheduler`]: the bounded-concurrency Scheduler that drives a graph to
//!   completion and publishes lifecycle events.
//! - [`controller`]: the Adaptive Controller, an out-of-band advisor that
//!   samples host utilization and proposes new concurrency bounds.
//!
//! [`events::EventBus`] is the publish/subscribe primitive both the
//! scheduler and the controller use to talk to external collaborators (a
//! monitoring dashboard, distribution adapters) — none of which live in
//! this crate; they consume the narrow interfaces these modules expose.

pub mod controller;
pub mod errors;
pub mod events;
pub mod graph;
pub mod logging;
pub mod scheduler;

pub use controller::{AdaptiveController, ControllerEvent, ControllerOptions};
pub use errors::{EngineError, Result};
pub use graph::{Task, TaskFn, TaskGraph, TaskId, TaskOptions, TaskOutput};
pub use scheduler::{Scheduler, SchedulerEvent, SchedulerOptions};
