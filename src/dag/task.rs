// src/dag/task.rs

//! Task nodes and their outgoing edges.

use std::fmt;
use std::sync::Arc;

use crate::types::TaskKind;

/// Stable index of a task inside a [`Graph`](crate::dag::Graph) arena.
///
/// Ids are handed out by [`GraphBuilder`](crate::dag::GraphBuilder) in
/// insertion order and never change for the lifetime of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub(crate) usize);

impl TaskId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Body of a static task.
pub type StaticFn = dyn Fn() -> anyhow::Result<()> + Send + Sync;

/// Body of a condition task; the returned value is the branch index.
pub type ConditionFn = dyn Fn() -> anyhow::Result<i64> + Send + Sync;

/// Callable attached to a task. The variant *is* the task kind.
#[derive(Clone)]
pub enum Body {
    Static(Arc<StaticFn>),
    Condition(Arc<ConditionFn>),
}

impl Body {
    pub fn from_static<F>(f: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Body::Static(Arc::new(f))
    }

    pub fn from_condition<F>(f: F) -> Self
    where
        F: Fn() -> anyhow::Result<i64> + Send + Sync + 'static,
    {
        Body::Condition(Arc::new(f))
    }

    pub fn kind(&self) -> TaskKind {
        match self {
            Body::Static(_) => TaskKind::Static,
            Body::Condition(_) => TaskKind::Condition,
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Static(_) => f.write_str("Body::Static(..)"),
            Body::Condition(_) => f.write_str("Body::Condition(..)"),
        }
    }
}

/// Strength of an edge, always derived from the kind of its source task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Strong,
    Weak,
}

impl From<TaskKind> for EdgeKind {
    fn from(kind: TaskKind) -> Self {
        match kind {
            TaskKind::Static => EdgeKind::Strong,
            TaskKind::Condition => EdgeKind::Weak,
        }
    }
}

/// A directed edge as seen from its source task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub source: TaskId,
    pub target: TaskId,
    /// Position among the source's outgoing edges, in construction order.
    /// For a condition task this is the branch index that selects the edge.
    pub ordinal: usize,
    pub kind: EdgeKind,
}

/// A graph vertex: identity, body, ordered successors and the static
/// dependency counts computed when the graph was built.
#[derive(Debug)]
pub struct Task {
    pub(crate) id: TaskId,
    pub(crate) name: String,
    pub(crate) body: Body,
    pub(crate) successors: Vec<TaskId>,
    pub(crate) strong_dependents: u32,
    pub(crate) weak_dependents: u32,
}

impl Task {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TaskKind {
        self.body.kind()
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Total number of incoming edges (strong + weak).
    pub fn num_dependents(&self) -> u32 {
        self.strong_dependents + self.weak_dependents
    }

    /// Number of incoming edges whose source is a static task.
    pub fn num_strong_dependents(&self) -> u32 {
        self.strong_dependents
    }

    /// Number of incoming edges whose source is a condition task.
    pub fn num_weak_dependents(&self) -> u32 {
        self.weak_dependents
    }

    pub fn num_successors(&self) -> usize {
        self.successors.len()
    }

    /// Successor at the given ordinal, if any.
    pub fn successor(&self, ordinal: usize) -> Option<TaskId> {
        self.successors.get(ordinal).copied()
    }

    /// Successors as `(target, ordinal)` pairs in construction order.
    pub fn successors(&self) -> impl Iterator<Item = (TaskId, usize)> + '_ {
        self.successors
            .iter()
            .copied()
            .enumerate()
            .map(|(ordinal, target)| (target, ordinal))
    }

    /// Outgoing edges with their derived strength.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        let kind = EdgeKind::from(self.kind());
        self.successors().map(move |(target, ordinal)| Edge {
            source: self.id,
            target,
            ordinal,
            kind,
        })
    }

    /// A source task has no incoming edges at all and is readied at run start.
    pub fn is_source(&self) -> bool {
        self.num_dependents() == 0
    }
}
