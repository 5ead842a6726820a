// src/scheduler/core.rs

//! Pure, synchronous scheduling state machine. No Tokio, no I/O, no `.await`
//! anywhere in this file — it is unit-testable on its own, the same split
//! the rest of this crate's coordination code follows (decide what to do,
//! let an async shell actually do it).

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::SystemTime;

use tracing::{debug, info, warn};

use crate::errors::{EngineError, Result};
use crate::graph::{TaskGraph, TaskId};

use super::events::{SchedulerEvent, TaskInfo};
use super::task_state::{Mode, Outcome, Stats};

/// Result of one state-machine transition: tasks newly moved into the
/// running set (for the shell to actually launch) plus the events that
/// transition produced, in emission order. `generation` is the epoch
/// `dispatch` was produced under; the shell must hand it back to
/// `on_task_settled` so a settlement that arrives after an intervening
/// `reset`/`stop` can be told apart from one that belongs to this step.
#[derive(Debug, Default)]
pub struct CoreStep {
    pub dispatch: Vec<TaskId>,
    pub events: Vec<SchedulerEvent>,
    pub generation: u64,
}

impl CoreStep {
    fn merge(&mut self, mut other: CoreStep) {
        self.dispatch.append(&mut other.dispatch);
        self.events.append(&mut other.events);
    }
}

pub struct SchedulerCore {
    pub graph: TaskGraph,
    mode: Mode,
    concurrency: usize,
    /// In-flight task ids mapped to the epoch they were dispatched under.
    /// Keying settlement-matching on this (rather than trusting any
    /// settlement for a still-registered id) is what lets `reset` safely
    /// re-dispatch an id while a now-abandoned worker for a prior epoch of
    /// that same id is still running.
    running: HashMap<TaskId, u64>,
    queue: VecDeque<TaskId>,
    queued_ids: HashSet<TaskId>,
    failed: HashSet<TaskId>,
    completed_count: usize,
    failed_count: usize,
    total: usize,
    started_at: Option<SystemTime>,
    ended_at: Option<SystemTime>,
    /// Bumped on `reset`/`stop`. Tags every dispatch so a settlement from a
    /// run that has since been abandoned can be dropped instead of
    /// mutating the graph/counters of whatever run is current now.
    generation: u64,
}

impl SchedulerCore {
    pub fn new(graph: TaskGraph, concurrency: usize) -> Self {
        SchedulerCore {
            graph,
            mode: Mode::Idle,
            concurrency,
            running: HashMap::new(),
            queue: VecDeque::new(),
            queued_ids: HashSet::new(),
            failed: HashSet::new(),
            completed_count: 0,
            failed_count: 0,
            total: 0,
            started_at: None,
            ended_at: None,
            generation: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.mode, Mode::Running | Mode::Paused)
    }

    fn task_info(&self, id: &TaskId) -> TaskInfo {
        let label = self
            .graph
            .get_task(id)
            .ok()
            .and_then(|t| t.opts.label.clone());
        TaskInfo { id: id.clone(), label }
    }

    pub fn stats(&self) -> Stats {
        Stats {
            total: self.total,
            completed: self.completed_count,
            failed: self.failed_count,
            running: self.running.len(),
            queued: self.queue.len(),
            concurrency: self.concurrency,
            processing: matches!(self.mode, Mode::Running),
            paused: matches!(self.mode, Mode::Paused),
            started_at: self.started_at,
            ended_at: self.ended_at,
        }
    }

    /// `Start()`. No-op if already processing.
    pub fn start(&mut self) -> CoreStep {
        if self.is_processing() {
            return CoreStep::default();
        }
        self.mode = Mode::Running;
        if self.started_at.is_none() {
            self.started_at = Some(SystemTime::now());
        }
        self.total = self.graph.len();
        self.queue.clear();
        self.queued_ids.clear();
        for id in self.graph.ready_tasks() {
            if !self.running.contains_key(&id) {
                self.queued_ids.insert(id.clone());
                self.queue.push_back(id);
            }
        }
        info!(total = self.total, "scheduler started");
        self.dispatch_step()
    }

    /// `Pause()`. In-flight tasks keep running; no new dispatch happens.
    pub fn pause(&mut self) -> CoreStep {
        if self.mode != Mode::Running {
            return CoreStep::default();
        }
        self.mode = Mode::Paused;
        CoreStep {
            dispatch: Vec::new(),
            events: vec![SchedulerEvent::Paused],
            generation: self.generation,
        }
    }

    /// `Resume()`. Behaves as `Start` if not currently processing.
    pub fn resume(&mut self) -> CoreStep {
        if self.mode == Mode::Idle || self.mode == Mode::Stopped {
            return self.start();
        }
        if self.mode != Mode::Paused {
            return CoreStep::default();
        }
        self.mode = Mode::Running;
        let mut step = CoreStep {
            dispatch: Vec::new(),
            events: vec![SchedulerEvent::Resumed],
            generation: self.generation,
        };
        step.merge(self.dispatch_step());
        step
    }

    /// `Stop(waitForRunning)`. Clears processing and drops the queue. The
    /// async shell is responsible for the actual waiting; this just updates
    /// state and reports it.
    ///
    /// Bumps the generation: any worker already dispatched for this run
    /// keeps its own (pre-bump) generation tag, so its eventual settlement
    /// still counts toward `running_count()` (what `stop(true)` waits on).
    /// The bump only matters if `start()` is called again without an
    /// intervening `reset()` — it guarantees a *third* party can't mistake
    /// a settlement for one it already accounted for.
    pub fn stop(&mut self) -> CoreStep {
        let was_processing = self.is_processing();
        self.mode = Mode::Stopped;
        self.queue.clear();
        self.queued_ids.clear();
        self.generation = self.generation.wrapping_add(1);
        if was_processing {
            self.ended_at = Some(SystemTime::now());
        }
        CoreStep {
            dispatch: Vec::new(),
            events: vec![SchedulerEvent::Stopped],
            generation: self.generation,
        }
    }

    /// `Reset()`. Stops without waiting, resets the graph's completion set,
    /// clears all scheduler-side state.
    ///
    /// Bumps the generation. `running` is cleared here, so a worker spawned
    /// for the abandoned run can end up dispatched again under a fresh
    /// generation for the same `TaskId` while the old worker is still in
    /// flight; the generation tag is what lets `on_task_settled` tell the
    /// two apart when the stale one eventually settles.
    pub fn reset(&mut self) -> CoreStep {
        self.mode = Mode::Idle;
        self.queue.clear();
        self.queued_ids.clear();
        self.running.clear();
        self.failed.clear();
        self.completed_count = 0;
        self.failed_count = 0;
        self.total = 0;
        self.started_at = None;
        self.ended_at = None;
        self.generation = self.generation.wrapping_add(1);
        self.graph.reset();
        CoreStep {
            dispatch: Vec::new(),
            events: vec![SchedulerEvent::Reset],
            generation: self.generation,
        }
    }

    /// `SetConcurrency(n)`. Widening dispatches immediately; narrowing never
    /// preempts running tasks.
    pub fn set_concurrency(&mut self, n: usize) -> Result<CoreStep> {
        if n == 0 {
            return Err(EngineError::Validation(format!(
                "concurrency must be a positive integer, got {n}"
            )));
        }
        self.concurrency = n;
        let mut step = CoreStep {
            dispatch: Vec::new(),
            events: vec![SchedulerEvent::ConcurrencyChanged(n)],
            generation: self.generation,
        };
        if self.mode == Mode::Running {
            step.merge(self.dispatch_step());
        }
        Ok(step)
    }

    /// Called by the async shell once a dispatched task's `TaskFn` settles.
    /// `generation` is the epoch the task was dispatched under (from the
    /// `CoreStep` that carried it); a settlement whose generation doesn't
    /// match what `running` still has on file for this id is from a run
    /// that `reset`/`stop` has since abandoned, and is dropped entirely —
    /// it must not mutate the graph, bump counters, or emit events for
    /// whatever run is current now.
    pub fn on_task_settled(&mut self, id: TaskId, outcome: Outcome, generation: u64) -> CoreStep {
        match self.running.get(&id) {
            Some(&tracked) if tracked == generation => {
                self.running.remove(&id);
            }
            _ => {
                debug!(task = %id, "dropping settlement from an abandoned generation");
                return CoreStep::default();
            }
        }

        let task = self.task_info(&id);
        let mut step = CoreStep::default();

        match outcome {
            Outcome::Success(result) => {
                // Graph mutation errors here are programmer bugs (id came
                // from our own running set), never user-facing.
                self.graph
                    .mark_completed(id.clone())
                    .expect("dispatched task id must be registered");
                self.completed_count += 1;
                step.events.push(SchedulerEvent::TaskComplete { task, result });
            }
            Outcome::Failure(message) => {
                self.failed.insert(id.clone());
                self.failed_count += 1;
                warn!(task = %id, %message, "task failed");
                step.events.push(SchedulerEvent::TaskError { task, error: message });
                // Deliberately NOT marked completed: dependents stay
                // blocked. See design notes on preserved source behavior.
            }
        }

        self.refresh_ready_queue();
        if self.mode == Mode::Running {
            step.merge(self.dispatch_step());
        }
        step.merge(self.maybe_finish());
        step.generation = self.generation;
        step
    }

    fn refresh_ready_queue(&mut self) {
        for id in self.graph.ready_tasks() {
            if !self.running.contains_key(&id) && !self.queued_ids.contains(&id) {
                self.queued_ids.insert(id.clone());
                self.queue.push_back(id);
            }
        }
    }

    fn dispatch_step(&mut self) -> CoreStep {
        let mut step = CoreStep::default();
        if self.mode != Mode::Running {
            return step;
        }
        while self.running.len() < self.concurrency {
            let Some(id) = self.queue.pop_front() else {
                break;
            };
            self.queued_ids.remove(&id);
            self.running.insert(id.clone(), self.generation);
            debug!(task = %id, "dispatching task");
            step.events.push(SchedulerEvent::TaskStart {
                task: self.task_info(&id),
            });
            step.dispatch.push(id);
        }
        step.generation = self.generation;
        step
    }

    /// After a settlement, check whether the run has reached quiescence —
    /// either `queue-complete` (graph fully completed) or the additive
    /// `queue-stalled` (nothing left runnable, but not everything finished).
    fn maybe_finish(&mut self) -> CoreStep {
        let mut step = CoreStep::default();
        if !self.is_processing() {
            return step;
        }
        if !self.running.is_empty() || !self.queue.is_empty() {
            return step;
        }
        self.ended_at = Some(SystemTime::now());
        let stats = self.stats();
        if self.graph.is_complete() {
            self.mode = Mode::Stopped;
            info!(completed = stats.completed, "queue complete");
            step.events.push(SchedulerEvent::QueueComplete(stats));
        } else {
            self.mode = Mode::Stopped;
            warn!(
                completed = stats.completed,
                failed = stats.failed,
                total = stats.total,
                "queue stalled: failures blocked the remainder"
            );
            step.events.push(SchedulerEvent::QueueStalled(stats));
        }
        step
    }
}
