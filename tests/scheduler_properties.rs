// tests/scheduler_properties.rs

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use proptest::prelude::*;

use branchflow::dag::{Graph, GraphBuilder, Scheduler, TaskId};
use branchflow::engine::TaskOutcome;
use branchflow::types::TaskKind;

/// Shape of one generated task: kind, forward targets, loop budget.
#[derive(Debug, Clone)]
struct TaskSpec {
    condition: bool,
    forward: BTreeSet<usize>,
    loops: u64,
}

// Strong edges only point forward, so there is never a strong cycle, and
// task 0 is always a static source. Condition tasks get a self-loop at
// branch 0 plus at least one forward target, and leave the loop once their
// budget is spent.
fn graph_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<TaskSpec>> {
    (2..=max_tasks).prop_flat_map(|n| {
        proptest::collection::vec(
            (
                any::<bool>(),
                proptest::collection::vec(any::<usize>(), 0..4),
                0..3u64,
            ),
            n,
        )
        .prop_map(move |raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, (condition, targets, loops))| {
                    let remaining = n - i - 1;
                    let condition = condition && i > 0 && remaining > 0;
                    let mut forward: BTreeSet<usize> = targets
                        .into_iter()
                        .filter(|_| remaining > 0)
                        .map(|t| i + 1 + t % remaining.max(1))
                        .collect();
                    if condition && forward.is_empty() {
                        forward.insert(i + 1);
                    }
                    TaskSpec {
                        condition,
                        forward,
                        loops,
                    }
                })
                .collect()
        })
    })
}

fn build(specs: &[TaskSpec]) -> Arc<Graph> {
    let mut b = GraphBuilder::new();
    let ids: Vec<TaskId> = specs
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            if spec.condition {
                b.add_condition(format!("t{i}"), || Ok(0)).unwrap()
            } else {
                b.add_static(format!("t{i}"), || Ok(())).unwrap()
            }
        })
        .collect();

    for (i, spec) in specs.iter().enumerate() {
        if spec.condition {
            b.precede(ids[i], ids[i]).unwrap();
        }
        for &target in &spec.forward {
            b.precede(ids[i], ids[target]).unwrap();
        }
    }

    Arc::new(b.build().unwrap())
}

/// Drive one run to quiescence with a FIFO of ready tasks. Returns the
/// readied sequence, or `None` if the step budget ran out.
fn simulate(
    scheduler: &Scheduler,
    specs: &[TaskSpec],
) -> Option<(Vec<TaskId>, branchflow::dag::RunContext)> {
    let ctx = scheduler.start_run();
    let initial = scheduler.initial_ready_set(&ctx);
    let mut readied = initial.clone();
    let mut queue: VecDeque<TaskId> = initial.into();

    for _ in 0..10_000 {
        let Some(task) = queue.pop_front() else {
            return Some((readied, ctx));
        };
        scheduler.mark_running(&ctx, task);

        let spec = &specs[task.index()];
        let outcome = if spec.condition {
            let activations = ctx.activations(task).unwrap_or(0);
            if activations <= spec.loops {
                TaskOutcome::Branch(0)
            } else {
                let exits = spec.forward.len() as u64;
                TaskOutcome::Branch(1 + ((activations + task.index() as u64) % exits) as i64)
            }
        } else {
            TaskOutcome::Success
        };

        let step = scheduler.on_completion(&ctx, task, outcome).ok()?;
        readied.extend(step.newly_ready.iter().copied());
        queue.extend(step.newly_ready);
    }

    None
}

proptest! {
    #[test]
    fn runs_reach_quiescence_with_counters_reset(specs in graph_strategy(10)) {
        let graph = build(&specs);
        let scheduler = Scheduler::from_graph(Arc::clone(&graph));

        let (readied, ctx) = simulate(&scheduler, &specs).expect("run did not terminate");

        prop_assert!(ctx.is_quiescent());
        prop_assert!(!readied.is_empty());
        for task in graph.tasks() {
            let strong = task.num_strong_dependents();
            let counter = ctx.join_counter(task.id()).unwrap();
            prop_assert!(counter <= strong);
            // The winning notification resets immediately, so no counter
            // is ever left resting at zero.
            if strong > 0 {
                prop_assert!(counter > 0, "{} left at zero", task.name());
            }
        }
    }

    #[test]
    fn repeated_runs_ready_identical_sequences(specs in graph_strategy(10)) {
        let graph = build(&specs);
        let scheduler = Scheduler::from_graph(graph);

        let (first, _) = simulate(&scheduler, &specs).expect("first run did not terminate");
        let (second, _) = simulate(&scheduler, &specs).expect("second run did not terminate");

        prop_assert_eq!(first, second);
    }

    #[test]
    fn static_dags_run_every_task_exactly_once(specs in graph_strategy(10)) {
        let specs: Vec<TaskSpec> = specs
            .into_iter()
            .map(|s| TaskSpec { condition: false, ..s })
            .collect();
        let graph = build(&specs);
        let scheduler = Scheduler::from_graph(Arc::clone(&graph));

        let (readied, ctx) = simulate(&scheduler, &specs).expect("run did not terminate");

        prop_assert_eq!(readied.len(), graph.len());
        for task in graph.tasks() {
            prop_assert_eq!(task.kind(), TaskKind::Static);
            prop_assert_eq!(ctx.activations(task.id()), Some(1));
        }
    }
}
