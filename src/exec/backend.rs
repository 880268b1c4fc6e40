// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of a raw mpsc sender.
//! This makes it easy to swap in a fake executor in tests while keeping the
//! production worker pool in [`executor_loop`](super::executor_loop).
//!
//! - `WorkerPoolBackend` is the default implementation. It wraps the
//!   `spawn_executor` loop and just forwards scheduled tasks over an mpsc
//!   channel.
//! - Tests can provide their own `ExecutorBackend` that, for example, records
//!   which tasks were scheduled and directly emits `TaskCompleted` events.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::errors::{Error, Result};

use super::executor_loop::spawn_executor;

/// Trait abstracting how scheduled tasks are executed.
///
/// Whatever the implementation does, it must eventually report exactly one
/// `RuntimeEvent::TaskCompleted` per dispatched task, or the run never
/// becomes quiescent.
pub trait ExecutorBackend: Send {
    /// Dispatch the given tasks for execution.
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Worker pool backend used in production.
///
/// Runs bodies on Tokio's blocking pool, at most `workers` at a time.
pub struct WorkerPoolBackend {
    tx: mpsc::Sender<ScheduledTask>,
}

impl WorkerPoolBackend {
    /// Create a new backend, wiring it to the given runtime event sender.
    ///
    /// This spawns the background executor loop immediately, so it must be
    /// called from within a Tokio runtime.
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, workers: usize) -> Self {
        let tx = spawn_executor(runtime_tx, workers);
        Self { tx }
    }
}

impl ExecutorBackend for WorkerPoolBackend {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();

        Box::pin(async move {
            for task in tasks {
                tx.send(task).await.map_err(Error::from)?;
            }
            Ok(())
        })
    }
}
