// src/exec/task_runner.rs

//! Runs a single task body on the blocking pool.

use std::any::Any;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, OwnedSemaphorePermit};
use tokio::task::JoinError;
use tracing::{debug, error, info, warn};

use crate::dag::{Body, ScheduledTask};
use crate::engine::{RuntimeEvent, TaskOutcome};

/// Run one activation of a task and report its outcome to the runtime.
///
/// The worker permit is held while the body runs and released before the
/// completion is sent. A body error or panic becomes
/// `TaskOutcome::Failed`; the scheduler decides what that means for the run.
pub async fn run_task(
    task: ScheduledTask,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    permit: OwnedSemaphorePermit,
) {
    let task_name = task.name.clone();
    let run_id = task.run_id;
    if let Err(err) = run_task_inner(task, &runtime_tx, permit).await {
        error!(
            task = %task_name,
            run_id,
            error = %err,
            "could not report task completion"
        );
    }
}

async fn run_task_inner(
    task: ScheduledTask,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
    permit: OwnedSemaphorePermit,
) -> Result<()> {
    debug!(
        task = %task.name,
        run_id = task.run_id,
        kind = %task.kind,
        "starting task body"
    );

    let body = task.body.clone();
    let joined = tokio::task::spawn_blocking(move || invoke(&body)).await;
    drop(permit);

    let outcome = match joined {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(err)) => {
            warn!(
                task = %task.name,
                run_id = task.run_id,
                error = %format!("{err:#}"),
                "task body returned an error"
            );
            TaskOutcome::Failed(format!("{err:#}"))
        }
        Err(join_err) => {
            let message = join_failure_message(join_err);
            error!(
                task = %task.name,
                run_id = task.run_id,
                error = %message,
                "task body did not finish"
            );
            TaskOutcome::Failed(message)
        }
    };

    info!(
        task = %task.name,
        run_id = task.run_id,
        outcome = ?outcome,
        "task finished"
    );

    runtime_tx
        .send(RuntimeEvent::TaskCompleted {
            task: task.id,
            outcome,
        })
        .await
        .with_context(|| {
            format!(
                "sending TaskCompleted event for task '{}' to runtime",
                task.name
            )
        })?;

    Ok(())
}

/// Call a body synchronously and translate its return value.
pub fn invoke(body: &Body) -> Result<TaskOutcome> {
    match body {
        Body::Static(f) => f().map(|()| TaskOutcome::Success),
        Body::Condition(f) => f().map(TaskOutcome::Branch),
    }
}

fn join_failure_message(err: JoinError) -> String {
    if err.is_panic() {
        format!("task panicked: {}", panic_payload(err.into_panic()))
    } else {
        "task was cancelled before finishing".to_string()
    }
}

fn panic_payload(payload: Box<dyn Any + Send + 'static>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}
