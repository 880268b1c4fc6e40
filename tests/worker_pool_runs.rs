// tests/worker_pool_runs.rs

mod common;
use crate::common::fixtures::{feedback_loop, logged_static, mixed_graph, BodyLog};
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use branchflow::dag::GraphBuilder;
use branchflow::engine::{run_graph, run_graph_blocking, RunOptions, TaskOutcome};
use branchflow::errors::{BranchflowError, SchedulerError};
use branchflow::exec::task_runner::invoke;

type TestResult = Result<(), Box<dyn Error>>;

fn options(workers: usize) -> RunOptions {
    RunOptions {
        workers,
        ..RunOptions::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn feedback_loop_runs_condition_until_it_picks_stop() -> TestResult {
    init_tracing();
    let log = BodyLog::new();
    let (graph, _ids) = feedback_loop(3, &log);

    let report = with_timeout(run_graph(graph, options(4))).await?;

    assert_eq!(
        log.entries(),
        vec!["init", "cond", "cond", "cond", "cond", "stop"]
    );
    assert_eq!(report.dispatched, log.entries());
    assert_eq!(report.completed, 6);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn mixed_graph_runs_every_reachable_task() -> TestResult {
    init_tracing();
    let log = BodyLog::new();
    let graph = mixed_graph(&log);

    let report = with_timeout(run_graph(graph, options(4))).await?;

    for (name, expected) in [
        ("A", 1),
        ("B", 2),
        ("C", 2),
        ("D", 2),
        ("cond1", 2),
        ("E", 1),
        ("K", 1),
        ("F", 1),
        ("cond2", 1),
        ("G", 0),
        ("H", 1),
        ("I", 1),
        ("cond3", 3),
        ("L", 1),
        ("M", 1),
    ] {
        assert_eq!(log.count(name), expected, "activations of {name}");
    }
    assert_eq!(report.completed, 20);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn graph_can_be_run_repeatedly() -> TestResult {
    init_tracing();
    let log = BodyLog::new();
    // `cond` always returns 1, so every run takes the same path.
    let (graph, _ids) = feedback_loop(0, &log);

    let first = with_timeout(run_graph(Arc::clone(&graph), options(2))).await?;
    let second = with_timeout(run_graph(graph, options(2))).await?;

    assert_eq!(first.dispatched, vec!["init", "cond", "stop"]);
    assert_eq!(first.dispatched, second.dispatched);
    assert_eq!(log.entries().len(), 6);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn body_error_fails_run() -> TestResult {
    init_tracing();
    let log = BodyLog::new();
    let mut b = GraphBuilder::new();
    let start = logged_static(&mut b, "start", &log);
    let bad = b
        .add_static("bad", || Err(anyhow::anyhow!("disk full")))
        .unwrap();
    let after = logged_static(&mut b, "after", &log);
    b.precede(start, bad).unwrap();
    b.precede(bad, after).unwrap();
    let graph = Arc::new(b.build()?);

    let result = with_timeout(run_graph(graph, options(2))).await;

    match result {
        Err(BranchflowError::Scheduler(SchedulerError::TaskFailed { task, message })) => {
            assert_eq!(task, "bad");
            assert!(message.contains("disk full"), "message: {message}");
        }
        other => panic!("expected TaskFailed, got {other:?}"),
    }
    assert_eq!(log.entries(), vec!["start"]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn panicking_body_is_reported_as_failure() -> TestResult {
    init_tracing();
    let mut b = GraphBuilder::new();
    b.add_condition("explode", || -> anyhow::Result<i64> { panic!("kaboom") })
        .unwrap();
    let graph = Arc::new(b.build()?);

    let result = with_timeout(run_graph(graph, options(1))).await;

    match result {
        Err(BranchflowError::Scheduler(SchedulerError::TaskFailed { task, message })) => {
            assert_eq!(task, "explode");
            assert!(message.contains("kaboom"), "message: {message}");
        }
        other => panic!("expected TaskFailed, got {other:?}"),
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn worker_limit_bounds_concurrent_bodies() -> TestResult {
    init_tracing();
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let mut b = GraphBuilder::new();
    let src = b.add_static("src", || Ok(())).unwrap();
    for i in 0..8 {
        let running = Arc::clone(&running);
        let peak = Arc::clone(&peak);
        let t = b
            .add_static(format!("w{i}"), move || {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(20));
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();
        b.precede(src, t).unwrap();
    }
    let graph = Arc::new(b.build()?);

    let report = with_timeout(run_graph(graph, options(2))).await?;

    assert_eq!(report.completed, 9);
    assert!(peak.load(Ordering::SeqCst) <= 2, "peak {}", peak.load(Ordering::SeqCst));
    assert!(peak.load(Ordering::SeqCst) >= 1);
    Ok(())
}

#[test]
fn blocking_entry_point_returns_after_quiescence() -> TestResult {
    init_tracing();
    let log = BodyLog::new();
    let (graph, _ids) = feedback_loop(2, &log);

    let report = run_graph_blocking(graph, options(2))?;

    assert_eq!(report.dispatched.len(), 5);
    assert_eq!(log.count("cond"), 3);
    assert_eq!(log.count("stop"), 1);
    Ok(())
}

#[test]
fn invoke_translates_body_results() {
    let mut b = GraphBuilder::new();
    let s = b.add_static("s", || Ok(())).unwrap();
    let c = b.add_condition("c", || Ok(7)).unwrap();
    b.precede(s, c).unwrap();
    let graph = b.build().unwrap();

    let outcome = invoke(graph.task(s).unwrap().body()).unwrap();
    assert_eq!(outcome, TaskOutcome::Success);
    let outcome = invoke(graph.task(c).unwrap().body()).unwrap();
    assert_eq!(outcome, TaskOutcome::Branch(7));
}
