// src/dag/run_context.rs

//! Mutable state of a single run.
//!
//! The graph never changes; everything that does change while tasks execute
//! lives here: one join counter and one status word per task, the number of
//! outstanding activations and a halt flag. A fresh context is created for
//! every run, so repeated runs of one graph never share state.
//!
//! Every method takes `&self` and only touches atomics, so completions may
//! be reported from any number of threads at once.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, AtomicU64, AtomicUsize, Ordering};

use tracing::{debug, warn};

use crate::dag::counter::JoinCounter;
use crate::dag::graph::Graph;
use crate::dag::task::TaskId;
use crate::dag::task_info::TaskStatus;

#[derive(Debug)]
pub struct TaskState {
    counter: JoinCounter,
    status: AtomicU8,
    activations: AtomicU64,
    /// Activations readied but not yet completed. Above one only under a
    /// task race.
    in_flight: AtomicU32,
}

impl TaskState {
    fn new(strong_dependents: u32) -> Self {
        Self {
            counter: JoinCounter::new(strong_dependents),
            status: AtomicU8::new(TaskStatus::Pending as u8),
            activations: AtomicU64::new(0),
            in_flight: AtomicU32::new(0),
        }
    }

    pub fn counter(&self) -> &JoinCounter {
        &self.counter
    }

    pub fn status(&self) -> TaskStatus {
        TaskStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// How many times the task was readied in this run.
    pub fn activations(&self) -> u64 {
        self.activations.load(Ordering::Acquire)
    }

    /// Activations of this task still waiting for their completion.
    pub fn in_flight(&self) -> u32 {
        self.in_flight.load(Ordering::Acquire)
    }

    fn transition(&self, to: TaskStatus) -> TaskStatus {
        TaskStatus::from_u8(self.status.swap(to as u8, Ordering::AcqRel))
    }
}

#[derive(Debug)]
pub struct RunContext {
    run_id: u64,
    states: Vec<TaskState>,
    outstanding: AtomicUsize,
    started: AtomicBool,
    halted: AtomicBool,
    detect_races: bool,
    races: AtomicU64,
}

impl RunContext {
    /// Fresh state for `graph`: every task `Pending`, every join counter at
    /// its task's strong dependent count.
    pub fn new(graph: &Graph, run_id: u64, detect_races: bool) -> Self {
        let states = graph
            .tasks()
            .map(|t| TaskState::new(t.num_strong_dependents()))
            .collect();

        Self {
            run_id,
            states,
            outstanding: AtomicUsize::new(0),
            started: AtomicBool::new(false),
            halted: AtomicBool::new(false),
            detect_races,
            races: AtomicU64::new(0),
        }
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub fn state(&self, task: TaskId) -> Option<&TaskState> {
        self.states.get(task.0)
    }

    pub fn status_of(&self, task: TaskId) -> Option<TaskStatus> {
        self.state(task).map(TaskState::status)
    }

    pub fn join_counter(&self, task: TaskId) -> Option<u32> {
        self.state(task).map(|s| s.counter.load())
    }

    pub fn activations(&self, task: TaskId) -> Option<u64> {
        self.state(task).map(TaskState::activations)
    }

    /// Activations readied but not yet completed.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// No task is ready or running.
    pub fn is_quiescent(&self) -> bool {
        self.outstanding() == 0
    }

    /// The initial ready set has been seeded.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }

    /// Readying transitions that found the task already ready or running.
    /// Only counted when race detection is enabled.
    pub fn races_observed(&self) -> u64 {
        self.races.load(Ordering::Acquire)
    }

    /// Stop readying tasks for the rest of this run. Returns `true` for the
    /// call that actually halted it.
    pub fn halt(&self) -> bool {
        !self.halted.swap(true, Ordering::AcqRel)
    }

    /// Mark the run as seeded. Returns `true` only for the first call.
    pub(crate) fn mark_started(&self) -> bool {
        !self.started.swap(true, Ordering::AcqRel)
    }

    /// Reset the join counter of `task` to its strong dependent count.
    pub fn init(&self, task: TaskId) {
        if let Some(state) = self.state(task) {
            state.counter.init();
        }
    }

    /// Decrement the join counter of `task`; `true` iff this call satisfied
    /// the last outstanding strong dependency.
    pub fn notify_strong(&self, task: TaskId) -> bool {
        self.state(task)
            .map(|s| s.counter.notify_strong())
            .unwrap_or(false)
    }

    /// Ready `task` through a weak edge. The join counter is not consulted
    /// nor modified.
    pub fn notify_weak_bypass(&self, task: TaskId) -> TaskStatus {
        self.make_ready(task)
    }

    /// Transition `task` to `Ready` and account for the new activation.
    /// Returns the status the task had before.
    pub(crate) fn make_ready(&self, task: TaskId) -> TaskStatus {
        let Some(state) = self.state(task) else {
            return TaskStatus::Pending;
        };

        // Count the activation before it becomes visible as ready, so the
        // outstanding count cannot reach zero while it is in flight.
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        state.in_flight.fetch_add(1, Ordering::AcqRel);
        state.activations.fetch_add(1, Ordering::AcqRel);
        let previous = state.transition(TaskStatus::Ready);

        if self.detect_races && previous.is_active() {
            self.races.fetch_add(1, Ordering::AcqRel);
            warn!(
                task = %task,
                run_id = self.run_id,
                previous = ?previous,
                "task race: task readied again while still active"
            );
        }

        previous
    }

    pub(crate) fn mark_running(&self, task: TaskId) -> TaskStatus {
        self.state(task)
            .map(|s| s.transition(TaskStatus::Running))
            .unwrap_or(TaskStatus::Pending)
    }

    /// Claim one in-flight activation of `task` for a completion. Returns
    /// `false`, leaving every count untouched, when none is in flight.
    pub(crate) fn claim_completion(&self, task: TaskId) -> bool {
        self.state(task).is_some_and(|s| {
            s.in_flight
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
                .is_ok()
        })
    }

    pub(crate) fn mark_completed(&self, task: TaskId) -> TaskStatus {
        self.state(task)
            .map(|s| s.transition(TaskStatus::Completed))
            .unwrap_or(TaskStatus::Pending)
    }

    /// Retire one activation. Returns `true` if the run is now quiescent.
    pub(crate) fn finish_activation(&self) -> bool {
        match self
            .outstanding
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        {
            Ok(previous) => previous == 1,
            Err(_) => {
                debug!(
                    run_id = self.run_id,
                    "completion without an outstanding activation; ignored"
                );
                true
            }
        }
    }
}
