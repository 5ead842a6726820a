// src/controller/options.rs

use std::time::Duration;

use crate::errors::{EngineError, Result};

use super::sampler::host_cpu_count;

/// Construction-time options for the [`AdaptiveController`](super::AdaptiveController),
/// see `6. EXTERNAL INTERFACES`.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub min_concurrency: usize,
    pub max_concurrency: usize,
    pub initial_concurrency: usize,
    pub target_cpu_utilization: f64,
    pub target_memory_utilization: f64,
    pub check_interval: Duration,
    pub adjustment_step: usize,
    pub history_size: usize,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        ControllerOptions {
            min_concurrency: 1,
            max_concurrency: host_cpu_count(),
            initial_concurrency: 4,
            target_cpu_utilization: 70.0,
            target_memory_utilization: 80.0,
            check_interval: Duration::from_millis(5000),
            adjustment_step: 1,
            history_size: 3,
        }
    }
}

impl ControllerOptions {
    pub fn validate(self) -> Result<Self> {
        if self.min_concurrency == 0 {
            return Err(EngineError::Validation(
                "min_concurrency must be a positive integer".into(),
            ));
        }
        if self.max_concurrency < self.min_concurrency {
            return Err(EngineError::Validation(format!(
                "max_concurrency ({}) must be >= min_concurrency ({})",
                self.max_concurrency, self.min_concurrency
            )));
        }
        if self.history_size == 0 {
            return Err(EngineError::Validation("history_size must be at least 1".into()));
        }
        if self.adjustment_step == 0 {
            return Err(EngineError::Validation("adjustment_step must be at least 1".into()));
        }
        Ok(self)
    }

    fn clamp(&self, n: i64) -> usize {
        n.clamp(self.min_concurrency as i64, self.max_concurrency as i64) as usize
    }

    pub(super) fn clamp_initial(&self) -> usize {
        self.clamp(self.initial_concurrency as i64)
    }

    pub(super) fn clamp_proposal(&self, n: i64) -> usize {
        self.clamp(n)
    }
}
