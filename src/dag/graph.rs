// src/dag/graph.rs

use std::collections::HashMap;

use crate::dag::task::{Edge, Task, TaskId};

/// Immutable task graph: an arena of [`Task`]s addressed by [`TaskId`].
///
/// Edges are owned by their source task's successor list. Cycles are allowed
/// as long as every cycle contains at least one weak edge; this is checked by
/// [`GraphBuilder::build`](crate::dag::GraphBuilder::build), which is the only
/// way to obtain a `Graph`. There is no API to change the topology afterwards,
/// so a run can share the graph freely across threads.
#[derive(Debug)]
pub struct Graph {
    tasks: Vec<Task>,
    by_name: HashMap<String, TaskId>,
}

impl Graph {
    pub(crate) fn from_parts(tasks: Vec<Task>, by_name: HashMap<String, TaskId>) -> Self {
        Self { tasks, by_name }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// All tasks in id order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(id.0)
    }

    pub fn task_by_name(&self, name: &str) -> Option<&Task> {
        self.id_of(name).and_then(|id| self.task(id))
    }

    pub fn id_of(&self, name: &str) -> Option<TaskId> {
        self.by_name.get(name).copied()
    }

    /// Name of a task, or `"<unknown>"` for an id from another graph.
    pub fn name_of(&self, id: TaskId) -> &str {
        self.task(id).map(Task::name).unwrap_or("<unknown>")
    }

    /// Tasks with no incoming edges; these form the initial ready set.
    pub fn sources(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks.iter().filter(|t| t.is_source()).map(Task::id)
    }

    /// Every edge in the graph, grouped by source in id order.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.tasks.iter().flat_map(Task::edges)
    }

    pub fn num_dependents(&self, id: TaskId) -> Option<u32> {
        self.task(id).map(Task::num_dependents)
    }

    pub fn num_strong_dependents(&self, id: TaskId) -> Option<u32> {
        self.task(id).map(Task::num_strong_dependents)
    }

    pub fn num_weak_dependents(&self, id: TaskId) -> Option<u32> {
        self.task(id).map(Task::num_weak_dependents)
    }
}
