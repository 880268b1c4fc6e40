#![allow(dead_code, unused_imports)]

pub use branchflow_test_utils::{builders, fixtures, init_tracing, scripted_executor, with_timeout};

use branchflow::dag::{Graph, TaskId};

/// Id of `name`, panicking with a readable message if it does not exist.
pub fn id(graph: &Graph, name: &str) -> TaskId {
    graph
        .id_of(name)
        .unwrap_or_else(|| panic!("no task named {name}"))
}

/// Names of `ids`, in order.
pub fn names(graph: &Graph, ids: &[TaskId]) -> Vec<String> {
    ids.iter().map(|&t| graph.name_of(t).to_string()).collect()
}
