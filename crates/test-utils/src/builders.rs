#![allow(dead_code)]

use std::collections::BTreeMap;

use branchflow::config::{ConfigFile, ConfigSection, RawConfigFile, TaskConfig};
use branchflow::errors::Result;
use branchflow::types::{FailurePolicy, TaskKind};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn on_failure(mut self, policy: FailurePolicy) -> Self {
        self.config.config.on_failure = policy;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.config.workers = workers;
        self
    }

    pub fn detect_races(mut self, val: bool) -> Self {
        self.config.config.detect_races = val;
        self
    }

    /// The raw file, for tests that exercise validation failures.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                cmd: cmd.to_string(),
                kind: TaskKind::Static,
                precede: vec![],
            },
        }
    }

    /// A condition task running `cmd`.
    pub fn condition(cmd: &str) -> Self {
        Self::new(cmd).kind(TaskKind::Condition)
    }

    pub fn kind(mut self, kind: TaskKind) -> Self {
        self.task.kind = kind;
        self
    }

    /// Append `succ` to the ordered successor list.
    pub fn precede(mut self, succ: &str) -> Self {
        self.task.precede.push(succ.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
