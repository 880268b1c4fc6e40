// src/engine/mod.rs

//! Orchestration engine for branchflow.
//!
//! This module ties together:
//! - the scheduler and the state of the current run
//! - the main runtime event loop that reacts to:
//!   - task completion events reported by the executor
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::dag::{Graph, Scheduler, TaskId};
use crate::errors::{BranchflowError, Result};
use crate::exec::WorkerPoolBackend;
use crate::types::FailurePolicy;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// What a task body produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// A static body returned normally.
    Success,
    /// A condition body returned this branch index.
    Branch(i64),
    /// The body returned an error or panicked.
    Failed(String),
}

/// Options shared by the scheduler, the core and the worker pool.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub failure_policy: FailurePolicy,
    /// Maximum number of bodies running at the same time.
    pub workers: usize,
    /// Warn about (and count) tasks readied while still ready or running.
    pub detect_races: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            workers: default_workers(),
            detect_races: false,
        }
    }
}

pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Events flowing into the runtime from executors and signal handlers.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// One activation of a task finished.
    TaskCompleted { task: TaskId, outcome: TaskOutcome },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Summary of a run that reached quiescence without errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: u64,
    /// Task names in the order they were handed to the executor.
    pub dispatched: Vec<TaskName>,
    /// Number of completion events processed.
    pub completed: usize,
    /// Task races seen by the optional diagnostic (always 0 when disabled).
    pub races_observed: u64,
}

pub mod core;
pub mod event_handlers;
pub mod runtime;

pub use self::core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::Runtime;

/// Run `graph` to quiescence on the current Tokio runtime with the default
/// worker pool.
pub async fn run_graph(graph: Arc<Graph>, options: RunOptions) -> Result<RunReport> {
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = WorkerPoolBackend::new(rt_tx, options.workers);
    let core = CoreRuntime::new(Scheduler::new(graph, &options));
    Runtime::new(core, rt_rx, executor).run().await
}

/// Blocking variant of [`run_graph`]: builds a private multi-threaded Tokio
/// runtime and returns only once the run is quiescent.
///
/// Must not be called from inside an async context.
pub fn run_graph_blocking(graph: Arc<Graph>, options: RunOptions) -> Result<RunReport> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(BranchflowError::IoError)?;
    runtime.block_on(run_graph(graph, options))
}
