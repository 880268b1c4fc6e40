// src/dag/scheduler_step.rs

//! Result type for a single scheduler step.

use crate::dag::task::TaskId;

/// Structured result of handling one completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerStep {
    /// Tasks that became ready as a result of this step, in the order they
    /// were readied.
    pub newly_ready: Vec<TaskId>,
    /// Whether this step left the run with nothing ready or running.
    pub quiescent: bool,
}
