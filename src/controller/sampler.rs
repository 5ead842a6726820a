// src/controller/sampler.rs

use sysinfo::System;

use crate::errors::{EngineError, Result};

/// Narrow boundary between the control law in [`super::AdaptiveController`]
/// and wherever CPU/memory numbers actually come from. Production code
/// reads the real host via `sysinfo`; tests substitute a scripted sampler
/// so scenario S6 and friends are deterministic.
pub trait HostSampler: Send {
    /// Returns `(cpu_percent, memory_percent)`, each in `0.0..=100.0`.
    fn sample(&mut self) -> Result<(f64, f64)>;
}

/// Whole-host CPU/memory sampler backed by `sysinfo`.
pub struct SysinfoSampler {
    system: System,
}

impl SysinfoSampler {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        system.refresh_memory();
        SysinfoSampler { system }
    }
}

impl Default for SysinfoSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl HostSampler for SysinfoSampler {
    fn sample(&mut self) -> Result<(f64, f64)> {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();

        let cpus = self.system.cpus();
        if cpus.is_empty() {
            return Err(EngineError::Sampling("no CPUs reported by host".into()));
        }
        let cpu_pct = cpus.iter().map(|c| c.cpu_usage() as f64).sum::<f64>() / cpus.len() as f64;

        let total = self.system.total_memory();
        if total == 0 {
            return Err(EngineError::Sampling("host reported zero total memory".into()));
        }
        let mem_pct = (self.system.used_memory() as f64 / total as f64) * 100.0;

        Ok((cpu_pct, mem_pct))
    }
}

/// Returns the number of logical CPUs on this host, used as the Adaptive
/// Controller's default `max_concurrency`. Falls back to 1 if detection
/// reports nothing.
pub fn host_cpu_count() -> usize {
    let mut system = System::new();
    system.refresh_cpu_usage();
    system.cpus().len().max(1)
}
