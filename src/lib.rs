// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use anyhow::{bail, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{build_graph, load_and_validate};
use crate::dag::{Graph, Scheduler};
use crate::engine::{CoreRuntime, RunOptions, Runtime, RuntimeEvent};
use crate::exec::WorkerPoolBackend;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - flow file loading and validation
/// - scheduler / core runtime
/// - worker pool executor
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;
    let options = apply_overrides(cfg.run_options(), &args)?;
    let graph = build_graph(&cfg)?;

    if args.dry_run {
        print_dry_run(&graph, &options);
        return Ok(());
    }

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let executor = WorkerPoolBackend::new(rt_tx.clone(), options.workers);

    // Ctrl-C → drain running tasks; a second Ctrl-C stops immediately.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            loop {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    eprintln!("failed to listen for Ctrl+C: {e}");
                    return;
                }
                if tx.send(RuntimeEvent::ShutdownRequested).await.is_err() {
                    return;
                }
            }
        });
    }

    let core = CoreRuntime::new(Scheduler::new(graph, &options));
    let runtime = Runtime::new(core, rt_rx, executor);
    let report = runtime.run().await?;

    info!(
        run_id = report.run_id,
        dispatched = report.dispatched.len(),
        completed = report.completed,
        races_observed = report.races_observed,
        "run finished"
    );
    Ok(())
}

fn apply_overrides(mut options: RunOptions, args: &CliArgs) -> Result<RunOptions> {
    if let Some(workers) = args.workers {
        if workers == 0 {
            bail!("--workers must be >= 1");
        }
        options.workers = workers;
    }
    if let Some(policy) = args.on_failure {
        options.failure_policy = policy;
    }
    if args.detect_races {
        options.detect_races = true;
    }
    Ok(options)
}

/// Dry-run output: tasks with kind, dependency counts and ordered successors.
fn print_dry_run(graph: &Graph, options: &RunOptions) {
    println!("branchflow dry-run");
    println!("  config.on_failure = {:?}", options.failure_policy);
    println!("  config.workers = {}", options.workers);
    println!("  config.detect_races = {}", options.detect_races);
    println!();

    println!("tasks ({}):", graph.len());
    for task in graph.tasks() {
        println!("  - {} ({})", task.name(), task.kind());
        println!(
            "      dependents: {} (strong {}, weak {})",
            task.num_dependents(),
            task.num_strong_dependents(),
            task.num_weak_dependents()
        );
        if task.num_successors() > 0 {
            let successors: Vec<String> = task
                .successors()
                .map(|(target, ordinal)| format!("{ordinal}:{}", graph.name_of(target)))
                .collect();
            println!("      precede: [{}]", successors.join(", "));
        }
        if task.is_source() {
            println!("      source: true");
        }
    }

    debug!("dry-run complete (no execution)");
}
