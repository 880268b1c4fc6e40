// src/dag/builder.rs

use std::collections::HashMap;

use tracing::debug;

use crate::dag::graph::Graph;
use crate::dag::task::{Body, Task, TaskId};
use crate::dag::validate::{validate_shape, NodeShape};
use crate::errors::GraphError;
use crate::types::TaskKind;

#[derive(Debug)]
struct PendingTask {
    name: String,
    body: Body,
    successors: Vec<TaskId>,
}

/// Incrementally assembles a [`Graph`].
///
/// Tasks get consecutive [`TaskId`]s in insertion order. Edges are appended
/// to the source task's successor list, so for a condition task the order of
/// `precede` calls defines its branch indices.
///
/// ```
/// use branchflow::dag::GraphBuilder;
///
/// let mut b = GraphBuilder::new();
/// let init = b.add_static("init", || Ok(())).unwrap();
/// let cond = b.add_condition("cond", || Ok(1)).unwrap();
/// let stop = b.add_static("stop", || Ok(())).unwrap();
/// b.precede(init, cond).unwrap();
/// b.precede_all(cond, &[cond, stop]).unwrap();
///
/// let graph = b.build().unwrap();
/// assert_eq!(graph.num_weak_dependents(cond), Some(1));
/// assert_eq!(graph.num_strong_dependents(cond), Some(1));
/// ```
#[derive(Debug, Default)]
pub struct GraphBuilder {
    tasks: Vec<PendingTask>,
    by_name: HashMap<String, TaskId>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task with an explicit body. Names must be unique.
    pub fn add_task(&mut self, name: impl Into<String>, body: Body) -> Result<TaskId, GraphError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(GraphError::DuplicateTask(name));
        }

        let id = TaskId(self.tasks.len());
        self.by_name.insert(name.clone(), id);
        self.tasks.push(PendingTask {
            name,
            body,
            successors: Vec::new(),
        });
        Ok(id)
    }

    pub fn add_static<F>(&mut self, name: impl Into<String>, f: F) -> Result<TaskId, GraphError>
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.add_task(name, Body::from_static(f))
    }

    pub fn add_condition<F>(&mut self, name: impl Into<String>, f: F) -> Result<TaskId, GraphError>
    where
        F: Fn() -> anyhow::Result<i64> + Send + Sync + 'static,
    {
        self.add_task(name, Body::from_condition(f))
    }

    pub fn id_of(&self, name: &str) -> Option<TaskId> {
        self.by_name.get(name).copied()
    }

    /// Add the edge `from -> to` at the next ordinal of `from`.
    pub fn precede(&mut self, from: TaskId, to: TaskId) -> Result<(), GraphError> {
        if to.0 >= self.tasks.len() {
            return Err(GraphError::TaskNotFound(to.to_string()));
        }
        let source = self
            .tasks
            .get_mut(from.0)
            .ok_or_else(|| GraphError::TaskNotFound(from.to_string()))?;
        source.successors.push(to);
        Ok(())
    }

    /// Add edges `from -> to` for every target, in order.
    pub fn precede_all(&mut self, from: TaskId, targets: &[TaskId]) -> Result<(), GraphError> {
        for &to in targets {
            self.precede(from, to)?;
        }
        Ok(())
    }

    /// Freeze the topology, compute dependency counts and validate.
    pub fn build(self) -> Result<Graph, GraphError> {
        let successor_indices: Vec<Vec<usize>> = self
            .tasks
            .iter()
            .map(|t| t.successors.iter().map(|id| id.0).collect())
            .collect();
        let shapes: Vec<NodeShape<'_>> = self
            .tasks
            .iter()
            .zip(&successor_indices)
            .map(|(t, successors)| NodeShape {
                name: &t.name,
                kind: t.body.kind(),
                successors,
            })
            .collect();
        validate_shape(&shapes)?;

        let mut strong = vec![0u32; self.tasks.len()];
        let mut weak = vec![0u32; self.tasks.len()];
        for pending in &self.tasks {
            let counts = match pending.body.kind() {
                TaskKind::Static => &mut strong,
                TaskKind::Condition => &mut weak,
            };
            for target in &pending.successors {
                counts[target.0] += 1;
            }
        }

        let tasks: Vec<Task> = self
            .tasks
            .into_iter()
            .enumerate()
            .map(|(index, pending)| Task {
                id: TaskId(index),
                name: pending.name,
                body: pending.body,
                successors: pending.successors,
                strong_dependents: strong[index],
                weak_dependents: weak[index],
            })
            .collect();

        debug!(tasks = tasks.len(), "graph built and validated");
        Ok(Graph::from_parts(tasks, self.by_name))
    }
}
