// src/dag/validate.rs

//! Structural checks run before a graph is allowed to execute.
//!
//! Two conditions make a graph unrunnable:
//! - a cycle made only of strong edges (its join counters can never reach
//!   zero, so the tasks on it would wait on each other forever);
//! - no source task (nothing is ready at run start).
//!
//! Cycles through at least one weak edge are how loops are expressed and are
//! accepted.

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::GraphError;
use crate::types::TaskKind;

/// Topology-only view of one node, so the same checks serve both the graph
/// builder and config validation (which runs before any body exists).
#[derive(Debug, Clone, Copy)]
pub(crate) struct NodeShape<'a> {
    pub name: &'a str,
    pub kind: TaskKind,
    /// Indices into the same node slice, in construction order.
    pub successors: &'a [usize],
}

pub(crate) fn validate_shape(nodes: &[NodeShape<'_>]) -> Result<(), GraphError> {
    ensure_has_source(nodes)?;
    ensure_no_strong_cycle(nodes)?;
    Ok(())
}

fn ensure_has_source(nodes: &[NodeShape<'_>]) -> Result<(), GraphError> {
    let mut has_incoming = vec![false; nodes.len()];
    for node in nodes {
        for &target in node.successors {
            if let Some(slot) = has_incoming.get_mut(target) {
                *slot = true;
            }
        }
    }

    if has_incoming.iter().any(|incoming| !incoming) {
        Ok(())
    } else {
        Err(GraphError::NoSourceTask)
    }
}

fn ensure_no_strong_cycle(nodes: &[NodeShape<'_>]) -> Result<(), GraphError> {
    // Only edges out of static tasks take part; any cycle left in this
    // subgraph is strong-only.
    let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();

    for index in 0..nodes.len() {
        graph.add_node(index);
    }

    for (source, node) in nodes.iter().enumerate() {
        if node.kind != TaskKind::Static {
            continue;
        }
        for &target in node.successors {
            if target == source {
                return Err(GraphError::StrongCycle(node.name.to_string()));
            }
            graph.add_edge(source, target, ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let name = nodes
                .get(cycle.node_id())
                .map(|n| n.name)
                .unwrap_or("<unknown>");
            Err(GraphError::StrongCycle(name.to_string()))
        }
    }
}
