// src/controller/events.rs

use std::time::SystemTime;

use serde::Serialize;

/// Everything the Adaptive Controller publishes. Unlike `SchedulerEvent`
/// these payloads are plain numbers and derive `Serialize` directly — a
/// Monitor adapter can forward them as-is.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum ControllerEvent {
    ConcurrencyUpdate(usize),
    Metrics {
        timestamp: SystemTime,
        cpu_usage: f64,
        memory_usage: f64,
        new_concurrency: usize,
        previous_concurrency: usize,
    },
    Error(String),
}
