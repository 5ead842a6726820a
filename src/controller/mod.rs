// src/controller/mod.rs

//! The Adaptive Controller: an out-of-band advisor that samples host CPU
//! and memory utilization and proposes a new concurrency bound. It shares
//! no state with the Scheduler — see `4.3`'s "pure advisor" contract.

mod events;
mod options;
mod sampler;

pub use events::ControllerEvent;
pub use options::ControllerOptions;
pub use sampler::{host_cpu_count, HostSampler, SysinfoSampler};

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::events::{EventBus, SubscriptionId};

/// Snapshot returned by `Metrics()`.
#[derive(Debug, Clone, Serialize, Default)]
pub struct ControllerSnapshot {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub concurrency: usize,
}

struct History {
    cpu: VecDeque<f64>,
    mem: VecDeque<f64>,
    capacity: usize,
}

impl History {
    fn new(capacity: usize) -> Self {
        History {
            cpu: VecDeque::with_capacity(capacity),
            mem: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, cpu: f64, mem: f64) {
        if self.cpu.len() == self.capacity {
            self.cpu.pop_front();
        }
        if self.mem.len() == self.capacity {
            self.mem.pop_front();
        }
        self.cpu.push_back(cpu);
        self.mem.push_back(mem);
    }

    fn averages(&self) -> (f64, f64) {
        let avg = |w: &VecDeque<f64>| {
            if w.is_empty() {
                0.0
            } else {
                w.iter().sum::<f64>() / w.len() as f64
            }
        };
        (avg(&self.cpu), avg(&self.mem))
    }
}

struct State {
    history: Mutex<History>,
    current: Mutex<ControllerSnapshot>,
    sampler: Mutex<Box<dyn HostSampler>>,
    bus: EventBus<ControllerEvent>,
    handle: Mutex<Option<JoinHandle<()>>>,
    options: ControllerOptions,
}

impl State {
    /// One interval's worth of work: sample, fold into the rolling window,
    /// apply the control law from `4.3`, clamp, and emit on change.
    fn tick(&self) {
        let sample = self.sampler.lock().unwrap().sample();
        let (cpu, mem) = match sample {
            Ok(reading) => reading,
            Err(err) => {
                warn!(error = %err, "adaptive controller sampling failed");
                self.bus.publish(&ControllerEvent::Error(err.to_string()));
                return;
            }
        };

        let (avg_cpu, avg_mem) = {
            let mut history = self.history.lock().unwrap();
            history.push(cpu, mem);
            history.averages()
        };

        let previous = self.current.lock().unwrap().concurrency;
        let opts = &self.options;

        let mut proposal = previous as i64;
        if avg_cpu > opts.target_cpu_utilization + 10.0 {
            proposal = previous as i64 - opts.adjustment_step as i64;
        } else if avg_cpu < opts.target_cpu_utilization - 10.0 && avg_mem < opts.target_memory_utilization {
            proposal = previous as i64 + opts.adjustment_step as i64;
        }
        if avg_mem > opts.target_memory_utilization + 10.0 {
            proposal = previous as i64 - opts.adjustment_step as i64;
        }

        let clamped = opts.clamp_proposal(proposal);
        debug!(avg_cpu, avg_mem, previous, clamped, "adaptive controller sampled");

        if clamped != previous {
            {
                let mut current = self.current.lock().unwrap();
                current.concurrency = clamped;
                current.cpu_usage = cpu;
                current.memory_usage = mem;
            }
            info!(previous, new = clamped, "concurrency-update proposed");
            self.bus.publish(&ControllerEvent::ConcurrencyUpdate(clamped));
            self.bus.publish(&ControllerEvent::Metrics {
                timestamp: SystemTime::now(),
                cpu_usage: cpu,
                memory_usage: mem,
                new_concurrency: clamped,
                previous_concurrency: previous,
            });
        } else {
            let mut current = self.current.lock().unwrap();
            current.cpu_usage = cpu;
            current.memory_usage = mem;
        }
    }
}

/// See `4.3`. Construct with [`AdaptiveController::new`], call `start()` to
/// begin sampling, and either poll `metrics()` or subscribe for
/// `concurrency-update` proposals.
pub struct AdaptiveController {
    state: Arc<State>,
}

impl AdaptiveController {
    pub fn new(options: ControllerOptions, sampler: Box<dyn HostSampler>) -> Result<Self> {
        let options = options.validate()?;
        let initial = options.clamp_initial();
        let state = Arc::new(State {
            history: Mutex::new(History::new(options.history_size)),
            current: Mutex::new(ControllerSnapshot {
                cpu_usage: 0.0,
                memory_usage: 0.0,
                concurrency: initial,
            }),
            sampler: Mutex::new(sampler),
            bus: EventBus::new(),
            handle: Mutex::new(None),
            options,
        });
        Ok(AdaptiveController { state })
    }

    pub fn with_default_sampler(options: ControllerOptions) -> Result<Self> {
        Self::new(options, Box::new(SysinfoSampler::new()))
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&ControllerEvent) + Send + Sync + 'static,
    {
        self.state.bus.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.state.bus.unsubscribe(id);
    }

    /// Idempotent: does nothing if sampling is already running.
    pub fn start(&self) {
        let mut handle = self.state.handle.lock().unwrap();
        if handle.is_some() {
            return;
        }
        let state = Arc::clone(&self.state);
        let interval = state.options.check_interval;
        *handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately; skip it
            loop {
                ticker.tick().await;
                state.tick();
            }
        }));
    }

    /// Idempotent: does nothing if sampling is already stopped.
    pub fn stop(&self) {
        if let Some(handle) = self.state.handle.lock().unwrap().take() {
            handle.abort();
        }
    }

    /// Manual override, clamped to `[min, max]`. Always emits
    /// `concurrency-update` even if the clamped value is unchanged, per the
    /// spec's "manual override" wording.
    pub fn set_concurrency(&self, n: usize) {
        let clamped = self.state.options.clamp_proposal(n as i64);
        self.state.current.lock().unwrap().concurrency = clamped;
        self.state.bus.publish(&ControllerEvent::ConcurrencyUpdate(clamped));
    }

    pub fn metrics(&self) -> ControllerSnapshot {
        self.state.current.lock().unwrap().clone()
    }
}

impl Drop for AdaptiveController {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedSampler {
        readings: VecDeque<(f64, f64)>,
    }

    impl HostSampler for ScriptedSampler {
        fn sample(&mut self) -> Result<(f64, f64)> {
            Ok(self.readings.pop_front().unwrap_or((50.0, 50.0)))
        }
    }

    fn controller_with(readings: Vec<(f64, f64)>, opts: ControllerOptions) -> AdaptiveController {
        let sampler = Box::new(ScriptedSampler {
            readings: readings.into(),
        });
        AdaptiveController::new(opts, sampler).unwrap()
    }

    #[test]
    fn hot_cpu_proposes_downshift() {
        let opts = ControllerOptions {
            min_concurrency: 1,
            max_concurrency: 8,
            initial_concurrency: 4,
            target_cpu_utilization: 50.0,
            target_memory_utilization: 80.0,
            check_interval: std::time::Duration::from_millis(10),
            adjustment_step: 1,
            history_size: 1,
        };
        let controller = controller_with(vec![(90.0, 10.0)], opts);
        controller.state.tick();
        assert_eq!(controller.metrics().concurrency, 3);
    }

    #[test]
    fn downshift_never_crosses_minimum() {
        let opts = ControllerOptions {
            min_concurrency: 1,
            max_concurrency: 8,
            initial_concurrency: 1,
            target_cpu_utilization: 50.0,
            target_memory_utilization: 80.0,
            check_interval: std::time::Duration::from_millis(10),
            adjustment_step: 1,
            history_size: 1,
        };
        let controller = controller_with(vec![(90.0, 10.0)], opts);
        controller.state.tick();
        assert_eq!(controller.metrics().concurrency, 1);
    }

    #[test]
    fn headroom_proposes_upshift() {
        let opts = ControllerOptions {
            min_concurrency: 1,
            max_concurrency: 8,
            initial_concurrency: 2,
            target_cpu_utilization: 70.0,
            target_memory_utilization: 80.0,
            check_interval: std::time::Duration::from_millis(10),
            adjustment_step: 1,
            history_size: 1,
        };
        let controller = controller_with(vec![(10.0, 10.0)], opts);
        controller.state.tick();
        assert_eq!(controller.metrics().concurrency, 3);
    }

    #[test]
    fn memory_pressure_dominates_cpu_headroom() {
        let opts = ControllerOptions {
            min_concurrency: 1,
            max_concurrency: 8,
            initial_concurrency: 4,
            target_cpu_utilization: 70.0,
            target_memory_utilization: 50.0,
            check_interval: std::time::Duration::from_millis(10),
            adjustment_step: 1,
            history_size: 1,
        };
        // Low CPU (headroom) but memory far over target: memory wins.
        let controller = controller_with(vec![(10.0, 95.0)], opts);
        controller.state.tick();
        assert_eq!(controller.metrics().concurrency, 3);
    }

    #[test]
    fn unchanged_proposal_does_not_emit() {
        let opts = ControllerOptions {
            min_concurrency: 1,
            max_concurrency: 8,
            initial_concurrency: 4,
            target_cpu_utilization: 70.0,
            target_memory_utilization: 80.0,
            check_interval: std::time::Duration::from_millis(10),
            adjustment_step: 1,
            history_size: 1,
        };
        let controller = controller_with(vec![(70.0, 70.0)], opts);
        let emitted = Arc::new(AtomicUsize::new(0));
        let e = Arc::clone(&emitted);
        controller.subscribe(move |_| {
            e.fetch_add(1, Ordering::SeqCst);
        });
        controller.state.tick();
        assert_eq!(emitted.load(Ordering::SeqCst), 0);
        assert_eq!(controller.metrics().concurrency, 4);
    }

    #[test]
    fn manual_override_is_clamped_and_emits() {
        let opts = ControllerOptions {
            min_concurrency: 1,
            max_concurrency: 4,
            initial_concurrency: 2,
            ..ControllerOptions::default()
        };
        let controller = controller_with(vec![], opts);
        controller.set_concurrency(100);
        assert_eq!(controller.metrics().concurrency, 4);
    }
}
