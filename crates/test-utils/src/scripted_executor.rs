use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use branchflow::dag::ScheduledTask;
use branchflow::engine::{RuntimeEvent, TaskOutcome};
use branchflow::errors::{Error, Result};
use branchflow::exec::ExecutorBackend;
use branchflow::types::TaskKind;

/// A fake executor that never runs bodies. It:
/// - records which tasks were dispatched, in order
/// - answers condition tasks from a per-task script of branch indices
/// - reports `Failed` for tasks in the failing set
/// - immediately sends one `TaskCompleted` per dispatched task.
///
/// Completions are sent on the runtime's own event channel while the
/// runtime awaits this call, so give that channel enough capacity for the
/// largest batch.
pub struct ScriptedExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<String>>>,
    branches: HashMap<String, VecDeque<i64>>,
    failing: HashSet<String>,
}

impl ScriptedExecutor {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        executed: Arc<Mutex<Vec<String>>>,
    ) -> Self {
        Self {
            runtime_tx,
            executed,
            branches: HashMap::new(),
            failing: HashSet::new(),
        }
    }

    /// Branch indices returned by successive activations of `task`. Once
    /// the script is exhausted the last value repeats.
    pub fn with_branches(mut self, task: &str, script: &[i64]) -> Self {
        self.branches
            .insert(task.to_string(), script.iter().copied().collect());
        self
    }

    /// Every activation of `task` fails.
    pub fn failing(mut self, task: &str) -> Self {
        self.failing.insert(task.to_string());
        self
    }

    fn outcome_for(&mut self, task: &ScheduledTask) -> TaskOutcome {
        if self.failing.contains(&task.name) {
            return TaskOutcome::Failed(format!("scripted failure of {}", task.name));
        }
        match task.kind {
            TaskKind::Static => TaskOutcome::Success,
            TaskKind::Condition => {
                let value = match self.branches.get_mut(&task.name) {
                    Some(script) if script.len() > 1 => script.pop_front().unwrap_or(0),
                    Some(script) => script.front().copied().unwrap_or(0),
                    None => 0,
                };
                TaskOutcome::Branch(value)
            }
        }
    }
}

impl ExecutorBackend for ScriptedExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let completions: Vec<RuntimeEvent> = tasks
            .iter()
            .map(|t| RuntimeEvent::TaskCompleted {
                task: t.id,
                outcome: self.outcome_for(t),
            })
            .collect();

        {
            let mut guard = self.executed.lock().unwrap();
            guard.extend(tasks.iter().map(|t| t.name.clone()));
        }

        let tx = self.runtime_tx.clone();
        Box::pin(async move {
            for event in completions {
                tx.send(event).await.map_err(Error::from)?;
            }
            Ok(())
        })
    }
}
