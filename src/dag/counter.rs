// src/dag/counter.rs

//! Atomic join counter for strong dependencies.
//!
//! A counter starts at the task's number of strong dependents. Every strong
//! predecessor completion decrements it once; the caller whose decrement
//! lands on zero "wins" and is the only one allowed to ready the task. The
//! winner then resets the counter so the task can be joined again in a later
//! loop iteration of the same run.
//!
//! The winner is decided by the value the atomic read-modify-write observed,
//! never by a lock, so concurrent completions on different threads contend
//! only on this one word.

use std::sync::atomic::{AtomicU32, Ordering};

use tracing::warn;

#[derive(Debug)]
pub struct JoinCounter {
    strong: u32,
    remaining: AtomicU32,
}

impl JoinCounter {
    /// New counter, already initialised to `strong`.
    pub fn new(strong: u32) -> Self {
        Self {
            strong,
            remaining: AtomicU32::new(strong),
        }
    }

    /// Reset to the static number of strong dependents.
    pub fn init(&self) {
        self.remaining.store(self.strong, Ordering::Release);
    }

    /// Decrement by one. Returns `true` iff this call moved the counter from
    /// one to zero.
    ///
    /// A decrement on a counter that is already zero leaves it at zero and
    /// returns `false`; it only happens when a task is joined more often than
    /// it has strong edges (a task race).
    pub fn notify_strong(&self) -> bool {
        match self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        {
            Ok(previous) => previous == 1,
            Err(_) => {
                warn!(
                    strong = self.strong,
                    "strong notification on a join counter already at zero; ignored"
                );
                false
            }
        }
    }

    /// Current value.
    pub fn load(&self) -> u32 {
        self.remaining.load(Ordering::Acquire)
    }

    /// Static number of strong dependents this counter resets to.
    pub fn strong(&self) -> u32 {
        self.strong
    }
}
