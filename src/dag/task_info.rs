// src/dag/task_info.rs

//! Per-run task status and the description of a task handed to an executor.

use crate::dag::task::{Body, TaskId};
use crate::engine::TaskName;
use crate::types::TaskKind;

/// Per-run status of a task.
///
/// `Completed` is "currently idle", not "finished for good": a task inside a
/// loop goes back to `Ready` every time it is re-entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskStatus {
    /// Waiting on dependencies (or never reached in this run).
    Pending = 0,
    /// Readied by the scheduler, not yet handed to a worker.
    Ready = 1,
    /// Body is executing on a worker.
    Running = 2,
    /// Last activation finished.
    Completed = 3,
}

impl TaskStatus {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => TaskStatus::Ready,
            2 => TaskStatus::Running,
            3 => TaskStatus::Completed,
            _ => TaskStatus::Pending,
        }
    }

    /// Whether the task occupies the run (it keeps the run from quiescing).
    pub fn is_active(self) -> bool {
        matches!(self, TaskStatus::Ready | TaskStatus::Running)
    }
}

/// A task the scheduler wants an executor to run now.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub name: TaskName,
    pub kind: TaskKind,
    pub body: Body,
    /// Identifier of the run this activation belongs to.
    pub run_id: u64,
}
