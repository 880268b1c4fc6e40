// src/dag/mod.rs

//! Task graph and scheduling core.
//!
//! - [`task`] defines task nodes, bodies and derived edge strength.
//! - [`graph`] is the immutable arena of tasks.
//! - [`builder`] assembles and validates graphs.
//! - [`validate`] rejects strong-only cycles and graphs without a source.
//! - [`counter`] is the atomic join counter protocol.
//! - [`run_context`] holds the mutable state of one run.
//! - [`scheduler`] decides which tasks become ready on each completion.
//! - [`scheduler_step`] defines the result type for scheduler steps.
//! - [`task_info`] provides task status and scheduled task types.

pub mod builder;
pub mod counter;
pub mod graph;
pub mod run_context;
pub mod scheduler;
pub mod scheduler_step;
pub mod task;
pub mod task_info;
pub(crate) mod validate;

pub use builder::GraphBuilder;
pub use counter::JoinCounter;
pub use graph::Graph;
pub use run_context::{RunContext, TaskState};
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use task::{Body, Edge, EdgeKind, Task, TaskId};
pub use task_info::{ScheduledTask, TaskStatus};
