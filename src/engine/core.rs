// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated run state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - sending `ScheduledTask`s to the executor
//!
//! The core is intended to be unit tested without any Tokio, channels or
//! worker threads: feed it completions by hand and inspect the commands.

use crate::dag::{RunContext, Scheduler};
use crate::engine::event_handlers::{
    handle_shutdown, handle_task_completion, seed_initial_ready, CoreStep, RunRecord,
};
use crate::engine::{RunReport, RuntimeEvent, TaskName};
use crate::errors::{BranchflowError, Result};

/// Pure core runtime state.
///
/// This owns:
/// - the scheduler
/// - the [`RunContext`] of the one run it drives
/// - the record of dispatches and failures
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    ctx: RunContext,
    record: RunRecord,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler) -> Self {
        let ctx = scheduler.start_run();
        Self {
            scheduler,
            ctx,
            record: RunRecord::default(),
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub fn is_quiescent(&self) -> bool {
        self.ctx.is_quiescent()
    }

    /// Names of dispatched tasks so far, in dispatch order.
    pub fn dispatched_names(&self) -> Vec<TaskName> {
        let graph = self.scheduler.graph();
        self.record
            .dispatched
            .iter()
            .map(|&id| graph.name_of(id).to_string())
            .collect()
    }

    /// Ready the source tasks. Call once, before feeding any event.
    pub fn start(&mut self) -> CoreStep {
        seed_initial_ready(&self.scheduler, &self.ctx, &mut self.record)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskCompleted { task, outcome } => handle_task_completion(
                &self.scheduler,
                &self.ctx,
                &mut self.record,
                task,
                outcome,
            ),
            RuntimeEvent::ShutdownRequested => handle_shutdown(&self.ctx, &mut self.record),
        }
    }

    /// The event source went away before the run finished.
    pub fn mark_interrupted(&mut self) {
        self.record.interrupted = true;
        self.ctx.halt();
    }

    /// Consume the core and produce the run's result.
    ///
    /// The first recorded failure wins over an interruption; a run that
    /// stopped before quiescence without either counts as interrupted.
    pub fn finish(self) -> Result<RunReport> {
        let dispatched = self.dispatched_names();
        let CoreRuntime { ctx, record, .. } = self;

        if let Some(failure) = record.failure {
            return Err(BranchflowError::Scheduler(failure));
        }
        if record.interrupted || !ctx.is_quiescent() {
            return Err(BranchflowError::Interrupted);
        }

        Ok(RunReport {
            run_id: ctx.run_id(),
            dispatched,
            completed: record.completed,
            races_observed: ctx.races_observed(),
        })
    }
}
