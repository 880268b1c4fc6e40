// tests/config_loading.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, TaskConfigBuilder};
use crate::common::{id, init_tracing};

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use branchflow::config::{build_graph, load_and_validate, load_from_path, validate_config};
use branchflow::errors::{BranchflowError, GraphError};
use branchflow::types::{FailurePolicy, TaskKind};

type TestResult = Result<(), Box<dyn Error>>;

/// Write `contents` to `Branchflow.toml` inside a fresh temp dir.
fn write_flow(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Branchflow.toml");
    fs::write(&path, contents).unwrap();
    (dir, path)
}

const LOOP_FLOW: &str = r#"
[config]
on_failure = "continue"
workers = 3
detect_races = true

[task.init]
cmd = "echo init"
precede = ["cond"]

[task.cond]
kind = "condition"
cmd = "echo 1"
precede = ["cond", "stop"]

[task.stop]
cmd = "echo done"
"#;

#[test]
fn loads_flow_file_with_config_section() -> TestResult {
    init_tracing();
    let (_dir, path) = write_flow(LOOP_FLOW);

    let cfg = load_and_validate(&path)?;
    let options = cfg.run_options();
    assert_eq!(options.failure_policy, FailurePolicy::Continue);
    assert_eq!(options.workers, 3);
    assert!(options.detect_races);

    let cond = &cfg.task["cond"];
    assert_eq!(cond.kind, TaskKind::Condition);
    assert_eq!(cond.precede, vec!["cond", "stop"]);
    assert_eq!(cfg.task["stop"].kind, TaskKind::Static);

    let graph = build_graph(&cfg)?;
    let cond = id(&graph, "cond");
    let task = graph.task(cond).unwrap();
    assert_eq!(task.successor(0), Some(cond));
    assert_eq!(task.successor(1), Some(id(&graph, "stop")));
    assert_eq!(graph.num_strong_dependents(cond), Some(1));
    assert_eq!(graph.num_weak_dependents(cond), Some(1));
    Ok(())
}

#[test]
fn defaults_apply_when_config_section_is_missing() -> TestResult {
    let (_dir, path) = write_flow(
        r#"
[task.only]
cmd = "true"
"#,
    );

    let cfg = load_and_validate(&path)?;
    let options = cfg.run_options();
    assert_eq!(options.failure_policy, FailurePolicy::Cancel);
    assert!(options.workers >= 1);
    assert!(!options.detect_races);
    Ok(())
}

#[test]
fn unknown_successor_is_rejected() {
    let (_dir, path) = write_flow(
        r#"
[task.a]
cmd = "true"
precede = ["ghost"]
"#,
    );

    match load_and_validate(&path) {
        Err(BranchflowError::ConfigError(msg)) => {
            assert!(msg.contains("unknown successor 'ghost'"), "msg: {msg}");
        }
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn strong_cycle_in_flow_file_is_rejected() {
    let (_dir, path) = write_flow(
        r#"
[task.start]
cmd = "true"
precede = ["x"]

[task.x]
cmd = "true"
precede = ["y"]

[task.y]
cmd = "true"
precede = ["x"]
"#,
    );

    assert!(matches!(
        load_and_validate(&path),
        Err(BranchflowError::Graph(GraphError::StrongCycle(_)))
    ));
}

#[test]
fn flow_without_source_is_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_task("a", TaskConfigBuilder::condition("echo 0").precede("b").build())
        .with_task("b", TaskConfigBuilder::new("true").precede("a").build())
        .raw();

    assert!(matches!(
        validate_config(&raw),
        Err(BranchflowError::Graph(GraphError::NoSourceTask))
    ));
}

#[test]
fn empty_flow_and_zero_workers_are_rejected() {
    let raw = ConfigFileBuilder::new().raw();
    assert!(matches!(
        validate_config(&raw),
        Err(BranchflowError::ConfigError(_))
    ));

    let raw = ConfigFileBuilder::new()
        .workers(0)
        .with_task("a", TaskConfigBuilder::new("true").build())
        .raw();
    match validate_config(&raw) {
        Err(BranchflowError::ConfigError(msg)) => assert!(msg.contains("workers")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn unknown_task_kind_is_a_parse_error() {
    let (_dir, path) = write_flow(
        r#"
[task.a]
kind = "sometimes"
cmd = "true"
"#,
    );

    assert!(matches!(
        load_from_path(&path),
        Err(BranchflowError::TomlError(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_and_validate(dir.path().join("nope.toml"));
    assert!(matches!(result, Err(BranchflowError::IoError(_))));
}

#[cfg(unix)]
mod shell_commands {
    use super::*;

    use branchflow::engine::run_graph;
    use branchflow::errors::SchedulerError;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn condition_command_selects_branch_from_stdout() -> TestResult {
        init_tracing();
        let cfg = ConfigFileBuilder::new()
            .workers(2)
            .with_task("start", TaskConfigBuilder::new("true").precede("pick").build())
            .with_task(
                "pick",
                TaskConfigBuilder::condition("echo thinking; echo 1")
                    .precede("left")
                    .precede("right")
                    .build(),
            )
            .with_task("left", TaskConfigBuilder::new("true").build())
            .with_task("right", TaskConfigBuilder::new("true").build())
            .build();
        let graph = build_graph(&cfg)?;

        let report = run_graph(graph, cfg.run_options()).await?;
        assert_eq!(report.dispatched, vec!["start", "pick", "right"]);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn loop_driven_by_counter_file_terminates() -> TestResult {
        init_tracing();
        let dir = tempfile::tempdir()?;
        let counter = dir.path().join("count");
        let counter = counter.display();

        // Loops while fewer than three lines were written, then exits.
        let check = format!(
            "echo x >> {counter}; if [ $(wc -l < {counter}) -lt 3 ]; then echo 0; else echo 1; fi"
        );
        let cfg = ConfigFileBuilder::new()
            .with_task("init", TaskConfigBuilder::new("true").precede("cond").build())
            .with_task(
                "cond",
                TaskConfigBuilder::condition(&check)
                    .precede("cond")
                    .precede("stop")
                    .build(),
            )
            .with_task("stop", TaskConfigBuilder::new("true").build())
            .build();
        let graph = build_graph(&cfg)?;

        let report = run_graph(graph, cfg.run_options()).await?;
        assert_eq!(report.dispatched, vec!["init", "cond", "cond", "cond", "stop"]);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn failing_command_fails_run() -> TestResult {
        init_tracing();
        let cfg = ConfigFileBuilder::new()
            .with_task("bad", TaskConfigBuilder::new("exit 3").build())
            .build();
        let graph = build_graph(&cfg)?;

        match run_graph(graph, cfg.run_options()).await {
            Err(BranchflowError::Scheduler(SchedulerError::TaskFailed { task, message })) => {
                assert_eq!(task, "bad");
                assert!(message.contains("exited with code 3"), "message: {message}");
            }
            other => panic!("expected TaskFailed, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn condition_printing_garbage_fails_run() -> TestResult {
        init_tracing();
        let cfg = ConfigFileBuilder::new()
            .with_task("cond", TaskConfigBuilder::condition("echo maybe").build())
            .build();
        let graph = build_graph(&cfg)?;

        match run_graph(graph, cfg.run_options()).await {
            Err(BranchflowError::Scheduler(SchedulerError::TaskFailed { message, .. })) => {
                assert!(message.contains("expected an integer"), "message: {message}");
            }
            other => panic!("expected TaskFailed, got {other:?}"),
        }
        Ok(())
    }
}
