use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, error, info, warn};

use crate::dag::graph::Graph;
use crate::dag::run_context::RunContext;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::task::{Task, TaskId};
use crate::dag::task_info::{ScheduledTask, TaskStatus};
use crate::engine::{RunOptions, TaskOutcome};
use crate::errors::SchedulerError;
use crate::types::{FailurePolicy, TaskKind};

/// Decision engine for one graph.
///
/// The scheduler owns the immutable [`Graph`] and the policy knobs; all
/// per-run state lives in the [`RunContext`] passed to every call. Every
/// method takes `&self`, so one scheduler can serve concurrent completions
/// (and several runs, each with its own context).
///
/// It is responsible for:
/// - the initial ready set (all source tasks)
/// - notifying strong successors when a static task completes
/// - dispatching exactly one weak successor when a condition task completes
/// - applying the failure policy when a body fails
/// - reporting quiescence
#[derive(Debug)]
pub struct Scheduler {
    graph: Arc<Graph>,
    failure_policy: FailurePolicy,
    detect_races: bool,
    /// Monotonically increasing run ID.
    run_counter: AtomicU64,
}

impl Scheduler {
    pub fn new(graph: Arc<Graph>, options: &RunOptions) -> Self {
        Self {
            graph,
            failure_policy: options.failure_policy,
            detect_races: options.detect_races,
            run_counter: AtomicU64::new(0),
        }
    }

    /// Scheduler with [`RunOptions::default`].
    pub fn from_graph(graph: Arc<Graph>) -> Self {
        Self::new(graph, &RunOptions::default())
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// Create the state for a new run.
    pub fn start_run(&self) -> RunContext {
        let run_id = self.run_counter.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(run_id, tasks = self.graph.len(), "scheduler: starting new run");
        RunContext::new(&self.graph, run_id, self.detect_races)
    }

    /// Ready every source task. Only the first call on a context readies
    /// anything; later calls return an empty set.
    pub fn initial_ready_set(&self, ctx: &RunContext) -> Vec<TaskId> {
        if !ctx.mark_started() {
            warn!(run_id = ctx.run_id(), "initial ready set requested twice; ignored");
            return Vec::new();
        }

        let ready: Vec<TaskId> = self.graph.sources().collect();
        for &task in &ready {
            ctx.make_ready(task);
        }

        info!(
            run_id = ctx.run_id(),
            sources = ?ready.iter().map(|&t| self.graph.name_of(t)).collect::<Vec<_>>(),
            "initial ready set"
        );
        ready
    }

    /// Record that an executor picked `task` up.
    pub fn mark_running(&self, ctx: &RunContext, task: TaskId) {
        let previous = ctx.mark_running(task);
        if previous != TaskStatus::Ready {
            debug!(
                task = %self.graph.name_of(task),
                previous = ?previous,
                "task started without being in Ready state"
            );
        }
    }

    /// Package `task` for an executor.
    pub fn scheduled_task(&self, ctx: &RunContext, task: TaskId) -> Option<ScheduledTask> {
        let node = self.graph.task(task)?;
        Some(ScheduledTask {
            id: task,
            name: node.name().to_string(),
            kind: node.kind(),
            body: node.body().clone(),
            run_id: ctx.run_id(),
        })
    }

    /// Handle the completion of one activation of `task`.
    ///
    /// On success the step lists the tasks readied by it. Errors are
    /// reported after the completion has been fully accounted for, so
    /// [`RunContext::is_quiescent`] is accurate afterwards either way. A
    /// completion for a task with no activation in flight is rejected with
    /// [`SchedulerError::UnexpectedCompletion`] and changes nothing.
    pub fn on_completion(
        &self,
        ctx: &RunContext,
        task: TaskId,
        outcome: TaskOutcome,
    ) -> Result<SchedulerStep, SchedulerError> {
        let node = self
            .graph
            .task(task)
            .ok_or(SchedulerError::UnknownTask(task))?;

        if !ctx.claim_completion(task) {
            error!(
                task = %node.name(),
                run_id = ctx.run_id(),
                "completion for a task with no activation in flight"
            );
            return Err(SchedulerError::UnexpectedCompletion(node.name().to_string()));
        }

        let previous = ctx.mark_completed(task);
        if previous != TaskStatus::Running {
            debug!(
                task = %node.name(),
                previous = ?previous,
                "completion for a task that was not marked Running"
            );
        }

        let result = if ctx.is_halted() {
            debug!(
                task = %node.name(),
                run_id = ctx.run_id(),
                "run halted; not scheduling successors"
            );
            match outcome {
                TaskOutcome::Failed(message) => Err(SchedulerError::TaskFailed {
                    task: node.name().to_string(),
                    message,
                }),
                _ => Ok(Vec::new()),
            }
        } else {
            self.dispatch_successors(ctx, node, outcome)
        };

        let quiescent = ctx.finish_activation();
        if quiescent {
            info!(run_id = ctx.run_id(), "run reached quiescence");
        }

        result.map(|newly_ready| SchedulerStep {
            newly_ready,
            quiescent,
        })
    }

    fn dispatch_successors(
        &self,
        ctx: &RunContext,
        node: &Task,
        outcome: TaskOutcome,
    ) -> Result<Vec<TaskId>, SchedulerError> {
        match (node.kind(), outcome) {
            (TaskKind::Static, TaskOutcome::Success) => {
                Ok(self.notify_strong_successors(ctx, node))
            }
            (TaskKind::Condition, TaskOutcome::Branch(value)) => {
                self.dispatch_branch(ctx, node, value).map(|t| vec![t])
            }
            (_, TaskOutcome::Failed(message)) => Err(self.handle_failure(ctx, node, message)),
            (kind, _) => {
                ctx.halt();
                error!(
                    task = %node.name(),
                    %kind,
                    "outcome does not match task kind; halting run"
                );
                Err(SchedulerError::OutcomeMismatch {
                    task: node.name().to_string(),
                    kind,
                })
            }
        }
    }

    /// Static completion: one strong notification per outgoing edge. Only the
    /// notification that drives a counter to zero readies the successor, and
    /// it resets the counter first so the successor can be joined again.
    fn notify_strong_successors(&self, ctx: &RunContext, node: &Task) -> Vec<TaskId> {
        let mut ready = Vec::new();

        for (target, _ordinal) in node.successors() {
            if !ctx.notify_strong(target) {
                continue;
            }

            ctx.init(target);
            ctx.make_ready(target);
            debug!(
                task = %node.name(),
                successor = %self.graph.name_of(target),
                run_id = ctx.run_id(),
                "strong dependencies satisfied; join counter reset, successor ready"
            );
            ready.push(target);
        }

        ready
    }

    /// Condition completion: ready exactly the successor at `value`,
    /// bypassing its join counter.
    fn dispatch_branch(
        &self,
        ctx: &RunContext,
        node: &Task,
        value: i64,
    ) -> Result<TaskId, SchedulerError> {
        let target = usize::try_from(value)
            .ok()
            .and_then(|ordinal| node.successor(ordinal));

        let Some(target) = target else {
            ctx.halt();
            error!(
                task = %node.name(),
                value,
                successors = node.num_successors(),
                "condition returned an invalid branch index; halting run"
            );
            return Err(SchedulerError::InvalidBranchIndex {
                task: node.name().to_string(),
                value,
                successors: node.num_successors(),
            });
        };

        ctx.notify_weak_bypass(target);
        debug!(
            task = %node.name(),
            branch = value,
            successor = %self.graph.name_of(target),
            run_id = ctx.run_id(),
            "condition selected branch"
        );
        Ok(target)
    }

    fn handle_failure(&self, ctx: &RunContext, node: &Task, message: String) -> SchedulerError {
        match self.failure_policy {
            FailurePolicy::Cancel => {
                if ctx.halt() {
                    warn!(
                        task = %node.name(),
                        run_id = ctx.run_id(),
                        error = %message,
                        "task failed; cancelling remaining work"
                    );
                }
            }
            FailurePolicy::Continue => {
                warn!(
                    task = %node.name(),
                    run_id = ctx.run_id(),
                    error = %message,
                    "task failed; its successors will not run, independent branches continue"
                );
            }
        }

        SchedulerError::TaskFailed {
            task: node.name().to_string(),
            message,
        }
    }
}
