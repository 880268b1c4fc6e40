// src/exec/executor_loop.rs

//! Main executor loop that hands scheduled tasks to workers.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::exec::task_runner::run_task;

/// Spawn the background executor loop.
///
/// The returned `mpsc::Sender<ScheduledTask>` is what `WorkerPoolBackend`
/// uses to submit work. Every scheduled task gets its own Tokio task that
/// first waits for one of `workers` permits, so at most `workers` bodies run
/// at once. The loop itself never waits on a permit; it only spawns, which
/// keeps the runtime's dispatch path from backing up behind busy workers.
pub fn spawn_executor(
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    workers: usize,
) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(32);
    let workers = workers.max(1);
    let permits = Arc::new(Semaphore::new(workers));

    tokio::spawn(async move {
        info!(workers, "executor loop started");

        while let Some(task) = rx.recv().await {
            let permits = Arc::clone(&permits);
            let rt_tx = runtime_tx.clone();

            tokio::spawn(async move {
                let permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        debug!(task = %task.name, "worker pool closed; failing task");
                        let _ = rt_tx
                            .send(RuntimeEvent::TaskCompleted {
                                task: task.id,
                                outcome: TaskOutcome::Failed("worker pool closed".to_string()),
                            })
                            .await;
                        return;
                    }
                };
                run_task(task, rt_tx, permit).await;
            });
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}
