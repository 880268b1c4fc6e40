// src/config/validate.rs

use std::collections::HashMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::dag::validate::{validate_shape, NodeShape};
use crate::errors::{BranchflowError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = BranchflowError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.task))
    }
}

/// Run every check on a raw flow file.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_task_successors(cfg)?;
    validate_graph_shape(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(BranchflowError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    // on_failure is strongly typed and validated during deserialization.

    if cfg.config.workers == 0 {
        return Err(BranchflowError::ConfigError(
            "[config].workers must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_task_successors(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for succ in task.precede.iter() {
            if !cfg.task.contains_key(succ) {
                return Err(BranchflowError::ConfigError(format!(
                    "task '{}' has unknown successor '{}' in `precede`",
                    name, succ
                )));
            }
        }
    }
    Ok(())
}

/// Strong-only cycles and missing source tasks, checked on names alone so
/// the flow file is rejected before any body is built.
fn validate_graph_shape(cfg: &RawConfigFile) -> Result<()> {
    let index: HashMap<&str, usize> = cfg
        .task
        .keys()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    let successors: Vec<Vec<usize>> = cfg
        .task
        .values()
        .map(|t| {
            t.precede
                .iter()
                .filter_map(|s| index.get(s.as_str()).copied())
                .collect()
        })
        .collect();

    let shapes: Vec<NodeShape<'_>> = cfg
        .task
        .iter()
        .zip(&successors)
        .map(|((name, task), successors)| NodeShape {
            name,
            kind: task.kind,
            successors,
        })
        .collect();

    validate_shape(&shapes)?;
    Ok(())
}
