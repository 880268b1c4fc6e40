// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{debug, info, warn};

use crate::dag::{RunContext, ScheduledTask, Scheduler, TaskId};
use crate::engine::TaskOutcome;
use crate::errors::SchedulerError;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// The run is over (quiescent, or stopped for good).
    RequestExit,
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

/// What happened so far in the current run, beyond the scheduler's own state.
#[derive(Debug, Default)]
pub struct RunRecord {
    /// Tasks in the order they were handed to the executor.
    pub dispatched: Vec<TaskId>,
    /// Completion events processed.
    pub completed: usize,
    /// First runtime error; later ones are only logged.
    pub failure: Option<SchedulerError>,
    /// A shutdown was requested before the run quiesced.
    pub interrupted: bool,
}

/// Seed the run with its initial ready set.
pub fn seed_initial_ready(
    scheduler: &Scheduler,
    ctx: &RunContext,
    record: &mut RunRecord,
) -> CoreStep {
    let ready = scheduler.initial_ready_set(ctx);

    let mut commands = Vec::new();
    if let Some(command) = dispatch_command(scheduler, ctx, record, ready) {
        commands.push(command);
    }

    finish_step(ctx, commands)
}

/// Handle a task completion event.
///
/// Errors from the scheduler (invalid branch, failed body, ...) do not stop
/// the loop by themselves: the scheduler has already halted the run if the
/// error is fatal, and the loop keeps draining completions of bodies that
/// were in flight until the run is quiescent.
pub fn handle_task_completion(
    scheduler: &Scheduler,
    ctx: &RunContext,
    record: &mut RunRecord,
    task: TaskId,
    outcome: TaskOutcome,
) -> CoreStep {
    record.completed += 1;
    let mut commands = Vec::new();

    match scheduler.on_completion(ctx, task, outcome) {
        Ok(step) => {
            if let Some(command) = dispatch_command(scheduler, ctx, record, step.newly_ready) {
                commands.push(command);
            }
        }
        Err(err) => {
            if record.failure.is_none() {
                warn!(error = %err, run_id = ctx.run_id(), "run failure recorded");
                record.failure = Some(err);
            } else {
                debug!(error = %err, "additional failure after the first one");
            }
        }
    }

    finish_step(ctx, commands)
}

/// Handle a shutdown request.
///
/// The first request halts scheduling and lets in-flight bodies drain; a
/// second one stops the loop immediately.
pub fn handle_shutdown(ctx: &RunContext, record: &mut RunRecord) -> CoreStep {
    if record.interrupted {
        info!("second shutdown request; stopping without draining");
        return CoreStep {
            commands: vec![CoreCommand::RequestExit],
            keep_running: false,
        };
    }

    record.interrupted = true;
    ctx.halt();
    info!(
        outstanding = ctx.outstanding(),
        "shutdown requested; waiting for running tasks to finish"
    );

    finish_step(ctx, Vec::new())
}

/// Turn newly ready ids into a dispatch command, marking them `Running`.
fn dispatch_command(
    scheduler: &Scheduler,
    ctx: &RunContext,
    record: &mut RunRecord,
    ready: Vec<TaskId>,
) -> Option<CoreCommand> {
    if ready.is_empty() {
        return None;
    }

    let tasks: Vec<ScheduledTask> = ready
        .into_iter()
        .filter_map(|id| {
            let task = scheduler.scheduled_task(ctx, id)?;
            scheduler.mark_running(ctx, id);
            record.dispatched.push(id);
            Some(task)
        })
        .collect();

    Some(CoreCommand::DispatchTasks(tasks))
}

fn finish_step(ctx: &RunContext, mut commands: Vec<CoreCommand>) -> CoreStep {
    let keep_running = !ctx.is_quiescent();
    if !keep_running {
        commands.push(CoreCommand::RequestExit);
    }

    CoreStep {
        commands,
        keep_running,
    }
}
