// src/graph/dag.rs

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, trace};

use crate::errors::{EngineError, Result};

use super::task::{Task, TaskFn, TaskId, TaskOptions};

/// The dependency model: task records, forward/reverse adjacency, a
/// completion set, and a `petgraph` edge-per-dependency view used for
/// cycle detection and topological order.
///
/// `deps[x]` holds the prerequisites of `x` (edges point from dependent to
/// prerequisite conceptually, i.e. `y in deps[x]` means `x` depends on `y`);
/// `rdeps[y]` holds the ids that depend on `y`. Insertion order is preserved
/// in both so `ReadyTasks`/`TopologicalOrder` are stable for identical
/// construction sequences. `pg` mirrors the same edges (`prereq -> id`, the
/// direction a dependency actually runs in) as a `DiGraph<TaskId, ()>`.
#[derive(Debug, Default)]
pub struct TaskGraph {
    order: Vec<TaskId>,
    tasks: HashMap<TaskId, Task>,
    deps: HashMap<TaskId, Vec<TaskId>>,
    rdeps: HashMap<TaskId, Vec<TaskId>>,
    completed: HashSet<TaskId>,
    pg: DiGraph<TaskId, ()>,
    node_idx: HashMap<TaskId, NodeIndex>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new task. Fails with [`EngineError::DuplicateTask`] if
    /// `id` is already registered; the graph is left unchanged on failure.
    pub fn add_task(
        &mut self,
        id: impl Into<TaskId>,
        func: Arc<dyn TaskFn>,
        opts: TaskOptions,
    ) -> Result<&mut Self> {
        let id = id.into();
        if self.tasks.contains_key(&id) {
            return Err(EngineError::DuplicateTask(id));
        }
        self.order.push(id.clone());
        self.deps.insert(id.clone(), Vec::new());
        self.rdeps.insert(id.clone(), Vec::new());
        let node = self.pg.add_node(id.clone());
        self.node_idx.insert(id.clone(), node);
        debug!(task = %id, "registered task");
        self.tasks.insert(id.clone(), Task::new(id, func, opts));
        Ok(self)
    }

    /// Adds one or more prerequisites of `id`. Each `prereq` is validated and
    /// applied independently, in order; on the first failure the graph is
    /// left exactly as it was before the call (earlier prereqs in the same
    /// call are rolled back).
    pub fn add_dependency<I>(&mut self, id: impl Into<TaskId>, prereqs: I) -> Result<&mut Self>
    where
        I: IntoIterator,
        I::Item: Into<TaskId>,
    {
        let id = id.into();
        if !self.tasks.contains_key(&id) {
            return Err(EngineError::UnknownTask(id));
        }
        let mut applied = Vec::new();
        for prereq in prereqs {
            let prereq = prereq.into();
            match self.add_single_dependency(&id, &prereq) {
                Ok(()) => applied.push(prereq),
                Err(err) => {
                    for p in applied.into_iter().rev() {
                        self.remove_single_dependency(&id, &p);
                    }
                    return Err(err);
                }
            }
        }
        Ok(self)
    }

    fn add_single_dependency(&mut self, id: &TaskId, prereq: &TaskId) -> Result<()> {
        if !self.tasks.contains_key(prereq) {
            return Err(EngineError::UnknownTask(prereq.clone()));
        }
        if prereq == id {
            return Err(EngineError::Cycle(id.clone()));
        }
        if self.deps[id].contains(prereq) {
            trace!(task = %id, prereq = %prereq, "dependency already recorded, skipping");
            return Ok(());
        }
        // `id` depending on `prereq` would cycle iff `id` already reaches
        // `prereq` via existing edges (prereq -> dependent).
        if self.reachable(id, prereq) {
            return Err(EngineError::Cycle(id.clone()));
        }
        self.deps.get_mut(id).unwrap().push(prereq.clone());
        self.rdeps.get_mut(prereq).unwrap().push(id.clone());
        self.pg.add_edge(self.node_idx[prereq], self.node_idx[id], ());
        debug!(task = %id, prereq = %prereq, "added dependency");
        Ok(())
    }

    fn remove_single_dependency(&mut self, id: &TaskId, prereq: &TaskId) {
        if let Some(v) = self.deps.get_mut(id) {
            v.retain(|p| p != prereq);
        }
        if let Some(v) = self.rdeps.get_mut(prereq) {
            v.retain(|d| d != id);
        }
        if let Some(edge) = self.pg.find_edge(self.node_idx[prereq], self.node_idx[id]) {
            self.pg.remove_edge(edge);
        }
    }

    /// Is `target` reachable from `start` by following existing `prereq ->
    /// dependent` edges? Used to answer "would `id` depending on `prereq`
    /// create a cycle" by checking whether `prereq` is already reachable
    /// from `id`.
    fn reachable(&self, start: &TaskId, target: &TaskId) -> bool {
        if start == target {
            return true;
        }
        match (self.node_idx.get(start), self.node_idx.get(target)) {
            (Some(&a), Some(&b)) => has_path_connecting(&self.pg, a, b, None),
            _ => false,
        }
    }

    /// Ids that are registered, not completed, and whose every dependency is
    /// completed. Order is deterministic (registration order).
    pub fn ready_tasks(&self) -> Vec<TaskId> {
        self.order
            .iter()
            .filter(|id| !self.completed.contains(*id))
            .filter(|id| self.deps[*id].iter().all(|d| self.completed.contains(d)))
            .cloned()
            .collect()
    }

    /// Marks `id` completed. Idempotent; does not check that its
    /// dependencies are satisfied (callers enforce that).
    pub fn mark_completed(&mut self, id: impl Into<TaskId>) -> Result<()> {
        let id = id.into();
        if !self.tasks.contains_key(&id) {
            return Err(EngineError::UnknownTask(id));
        }
        self.completed.insert(id);
        Ok(())
    }

    /// Empties the completed set. Tasks and edges are untouched.
    pub fn reset(&mut self) {
        self.completed.clear();
    }

    pub fn is_complete(&self) -> bool {
        self.completed.len() == self.tasks.len()
    }

    pub fn is_completed(&self, id: &TaskId) -> bool {
        self.completed.contains(id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// A total order consistent with `deps` (a prerequisite precedes its
    /// dependents). `petgraph::algo::toposort` fails on a cycle, which
    /// should be unreachable given the mutation invariants `add_dependency`
    /// enforces.
    pub fn topological_order(&self) -> Result<Vec<TaskId>> {
        match toposort(&self.pg, None) {
            Ok(nodes) => Ok(nodes.into_iter().map(|n| self.pg[n].clone()).collect()),
            Err(cycle) => Err(EngineError::Cycle(self.pg[cycle.node_id()].clone())),
        }
    }

    pub fn get_task(&self, id: &TaskId) -> Result<&Task> {
        self.tasks.get(id).ok_or_else(|| EngineError::UnknownTask(id.clone()))
    }

    pub fn deps(&self, id: &TaskId) -> Result<&[TaskId]> {
        self.deps
            .get(id)
            .map(Vec::as_slice)
            .ok_or_else(|| EngineError::UnknownTask(id.clone()))
    }

    pub fn rdeps(&self, id: &TaskId) -> Result<&[TaskId]> {
        self.rdeps
            .get(id)
            .map(Vec::as_slice)
            .ok_or_else(|| EngineError::UnknownTask(id.clone()))
    }

    pub fn all_tasks(&self) -> impl Iterator<Item = &TaskId> {
        self.order.iter()
    }
}
