// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;
use crate::types::FailurePolicy;

/// Command-line arguments for `branchflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "branchflow",
    version,
    about = "Run a task graph with conditional branches and loops.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the flow file (TOML).
    ///
    /// Default: `Branchflow.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BRANCHFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the graph, but don't run any task.
    #[arg(long)]
    pub dry_run: bool,

    /// Override `[config].workers`.
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Override `[config].on_failure` ("cancel" or "continue").
    #[arg(long, value_name = "POLICY")]
    pub on_failure: Option<FailurePolicy>,

    /// Warn when a task is readied again while still ready or running.
    #[arg(long)]
    pub detect_races: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
