use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Kind of a task, which also decides the strength of its outgoing edges.
///
/// - `Static`: body returns nothing that affects control flow; every outgoing
///   edge is *strong* and counts towards the target's join counter.
/// - `Condition`: body returns a branch index selecting exactly one outgoing
///   edge; every outgoing edge is *weak* and bypasses join counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Static,
    Condition,
}

impl Default for TaskKind {
    fn default() -> Self {
        TaskKind::Static
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Static => f.write_str("static"),
            TaskKind::Condition => f.write_str("condition"),
        }
    }
}

/// What a run does after a task body fails.
///
/// - `Cancel`: stop readying tasks immediately; bodies already running are
///   allowed to finish, then the run reports the failure (default).
/// - `Continue`: successors of the failed task are never notified, but
///   independent branches keep running until the run is quiescent. The run
///   still reports the first failure at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    Cancel,
    Continue,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::Cancel
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cancel" => Ok(FailurePolicy::Cancel),
            "continue" => Ok(FailurePolicy::Continue),
            other => Err(format!(
                "invalid on_failure: {other} (expected \"cancel\" or \"continue\")"
            )),
        }
    }
}
