// src/scheduler/options.rs

use crate::errors::{EngineError, Result};

/// Construction-time options recognized by the Scheduler (see `6. EXTERNAL
/// INTERFACES`). Plain data, validated once rather than loaded from a file
/// — there is no configuration file in this crate's scope.
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// Initial concurrency bound.
    pub concurrency: usize,
    /// Begin dispatching immediately on construction.
    pub auto_start: bool,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        SchedulerOptions {
            concurrency: 4,
            auto_start: false,
        }
    }
}

impl SchedulerOptions {
    pub fn validate(self) -> Result<Self> {
        if self.concurrency == 0 {
            return Err(EngineError::Validation(
                "concurrency must be a positive integer".into(),
            ));
        }
        Ok(self)
    }
}
