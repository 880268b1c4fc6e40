// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::engine::{default_workers, RunOptions};
use crate::types::{FailurePolicy, TaskKind};

/// Flow file exactly as deserialized from TOML, before validation.
///
/// ```toml
/// [config]
/// on_failure = "cancel"
/// workers = 4
///
/// [task.init]
/// cmd = "echo init"
/// precede = ["cond"]
///
/// [task.cond]
/// kind = "condition"
/// cmd = "./check.sh"
/// precede = ["cond", "stop"]
///
/// [task.stop]
/// cmd = "echo done"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Global run behaviour from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// A flow file that passed validation. Obtain one through
/// `ConfigFile::try_from(RawConfigFile)` or [`load_and_validate`](super::load_and_validate).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(config: ConfigSection, task: BTreeMap<String, TaskConfig>) -> Self {
        Self { config, task }
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            failure_policy: self.config.on_failure,
            workers: self.config.workers,
            detect_races: self.config.detect_races,
        }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// `"cancel"` (default) or `"continue"`.
    #[serde(default)]
    pub on_failure: FailurePolicy,

    /// Maximum number of task bodies running at once. Defaults to the
    /// available parallelism.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Warn about tasks readied again while still ready or running.
    #[serde(default)]
    pub detect_races: bool,
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            on_failure: FailurePolicy::default(),
            workers: default_workers(),
            detect_races: false,
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// The command to execute.
    pub cmd: String,

    /// `"static"` (default) or `"condition"`.
    #[serde(default)]
    pub kind: TaskKind,

    /// Successors of this task, in order. For a condition task, position
    /// `i` in this list is the target of branch index `i`.
    #[serde(default)]
    pub precede: Vec<String>,
}
