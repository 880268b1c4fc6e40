// src/errors.rs

//! Crate-wide error types and aliases.

use thiserror::Error;

use crate::dag::TaskId;
use crate::types::TaskKind;

#[derive(Error, Debug)]
pub enum BranchflowError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid graph: {0}")]
    Graph(#[from] GraphError),

    #[error("Run failed: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Run interrupted before reaching quiescence")]
    Interrupted,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Problems detected while building a graph, before any task runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("duplicate task name: {0}")]
    DuplicateTask(String),

    #[error("cycle of strong edges detected involving task '{0}'")]
    StrongCycle(String),

    #[error("no source task: every task has at least one incoming edge, nothing can start")]
    NoSourceTask,
}

/// Problems reported while a run is in progress.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("condition task '{task}' returned branch {value}, but it only has {successors} successor(s)")]
    InvalidBranchIndex {
        task: String,
        value: i64,
        successors: usize,
    },

    #[error("task '{task}' failed: {message}")]
    TaskFailed { task: String, message: String },

    #[error("task '{task}' is a {kind} task but reported an outcome of the other kind")]
    OutcomeMismatch { task: String, kind: TaskKind },

    #[error("completion reported for unknown task {0}")]
    UnknownTask(TaskId),

    #[error("completion reported for task '{0}', which has no activation in flight")]
    UnexpectedCompletion(String),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BranchflowError>;
