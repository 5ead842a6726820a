// src/scheduler/engine.rs

//! The async shell around [`SchedulerCore`]: owns the coordination mutex,
//! spawns worker tasks, and turns `CoreStep`s into actual dispatches and
//! published events.

use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use tracing::instrument;

use crate::errors::Result;
use crate::events::EventBus;
use crate::graph::TaskGraph;

use super::core::{CoreStep, SchedulerCore};
use super::events::SchedulerEvent;
use super::options::SchedulerOptions;
use super::task_state::{Mode, Outcome, Stats};

struct Inner {
    core: Mutex<SchedulerCore>,
    bus: EventBus<SchedulerEvent>,
    idle: Notify,
}

impl Inner {
    fn apply(self: &Arc<Self>, step: CoreStep) {
        // Carried through to `on_task_settled` below so a settlement that
        // arrives after an intervening `reset`/`stop` can be recognized as
        // belonging to an abandoned run rather than the current one.
        let generation = step.generation;
        for event in step.events {
            self.bus.publish(&event);
        }
        for task_id in step.dispatch {
            let task = {
                let core = self.core.lock().unwrap();
                core.graph.get_task(&task_id).expect("dispatched id is registered").clone()
            };
            let this = Arc::clone(self);
            tokio::spawn(async move {
                let outcome = match task.func.run(task_id.clone()).await {
                    Ok(result) => Outcome::Success(result),
                    Err(err) => Outcome::Failure(format!("{err:#}")),
                };
                let step = {
                    let mut core = this.core.lock().unwrap();
                    core.on_task_settled(task_id, outcome, generation)
                };
                this.apply(step);
                this.maybe_notify_idle();
            });
        }
    }

    fn maybe_notify_idle(&self) {
        let core = self.core.lock().unwrap();
        if core.running_count() == 0 {
            drop(core);
            self.idle.notify_waiters();
        }
    }
}

/// Drives a borrowed [`TaskGraph`] to completion under a bounded,
/// runtime-adjustable worker pool. See `4.2` for the full contract.
///
/// The graph is taken by value at construction (Rust's `'static` bound on
/// spawned tasks rules out holding a plain borrow across the run) and can be
/// reclaimed with [`Scheduler::into_graph`] once the scheduler is no longer
/// needed — a run started again after `reset()` reuses the same graph in
/// place, which satisfies the "graph may outlive the scheduler and be
/// reused" requirement without literally borrowing it.
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    pub fn new(graph: TaskGraph, options: SchedulerOptions) -> Result<Self> {
        let options = options.validate()?;
        let core = SchedulerCore::new(graph, options.concurrency);
        let inner = Arc::new(Inner {
            core: Mutex::new(core),
            bus: EventBus::new(),
            idle: Notify::new(),
        });
        let scheduler = Scheduler { inner };
        if options.auto_start {
            scheduler.start();
        }
        Ok(scheduler)
    }

    pub fn subscribe<F>(&self, handler: F) -> crate::events::SubscriptionId
    where
        F: Fn(&SchedulerEvent) + Send + Sync + 'static,
    {
        self.inner.bus.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: crate::events::SubscriptionId) {
        self.inner.bus.unsubscribe(id);
    }

    /// Wires an [`AdaptiveController`](crate::controller::AdaptiveController)'s
    /// `concurrency-update` proposals into this scheduler's `SetConcurrency`,
    /// as a one-way subscription (the controller never learns the result).
    pub fn adopt_concurrency_from(&self, controller: &crate::controller::AdaptiveController) {
        let this = self.clone_handle();
        controller.subscribe(move |event| {
            if let crate::controller::ControllerEvent::ConcurrencyUpdate(n) = event {
                // Best-effort: validation failures here would mean the
                // controller proposed zero, which its own clamp prevents.
                let _ = this.set_concurrency(*n);
            }
        });
    }

    fn clone_handle(&self) -> Scheduler {
        Scheduler { inner: Arc::clone(&self.inner) }
    }

    #[instrument(skip(self))]
    pub fn start(&self) -> &Self {
        let step = self.inner.core.lock().unwrap().start();
        self.inner.apply(step);
        self
    }

    pub fn pause(&self) -> &Self {
        let step = self.inner.core.lock().unwrap().pause();
        self.inner.apply(step);
        self
    }

    pub fn resume(&self) -> &Self {
        let step = self.inner.core.lock().unwrap().resume();
        self.inner.apply(step);
        self
    }

    /// `Stop(waitForRunning)`. When `wait_for_running` is true, awaits every
    /// in-flight task to settle before returning.
    pub async fn stop(&self, wait_for_running: bool) {
        let step = self.inner.core.lock().unwrap().stop();
        self.inner.apply(step);
        if wait_for_running {
            loop {
                // Register interest in the next `notify_waiters()` call
                // *before* checking `running_count()`: checking first and
                // only then constructing `notified()` would miss a
                // `notify_waiters()` fired in between, hanging forever.
                let notified = self.inner.idle.notified();
                if self.inner.core.lock().unwrap().running_count() == 0 {
                    break;
                }
                notified.await;
            }
        }
    }

    pub fn reset(&self) -> &Self {
        let step = self.inner.core.lock().unwrap().reset();
        self.inner.apply(step);
        self
    }

    pub fn set_concurrency(&self, n: usize) -> Result<&Self> {
        let step = self.inner.core.lock().unwrap().set_concurrency(n)?;
        self.inner.apply(step);
        Ok(self)
    }

    pub fn stats(&self) -> Stats {
        self.inner.core.lock().unwrap().stats()
    }

    pub fn mode(&self) -> Mode {
        self.inner.core.lock().unwrap().mode()
    }

    /// Reclaims ownership of the underlying graph. Only meaningful once no
    /// dispatch is in flight (e.g. after `stop(true)` or at quiescence).
    pub fn into_graph(self) -> TaskGraph {
        Arc::try_unwrap(self.inner)
            .unwrap_or_else(|_| panic!("scheduler still has outstanding references"))
            .core
            .into_inner()
            .unwrap()
            .graph
    }
}
