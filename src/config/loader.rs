// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::dag::{Graph, GraphBuilder};
use crate::errors::{GraphError, Result};
use crate::exec::command_body;

/// Load a flow file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a flow file from path and run validation.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - unknown `precede` references,
///   - cycles made only of strong edges,
///   - a missing source task,
///   - basic global config sanity.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Build the runnable graph described by a validated flow file.
///
/// Task ids follow the name order of the `[task.*]` tables; successor order
/// follows each task's `precede` list.
pub fn build_graph(cfg: &ConfigFile) -> Result<Arc<Graph>> {
    let mut builder = GraphBuilder::new();

    for (name, task) in cfg.task.iter() {
        builder.add_task(name.clone(), command_body(name, task.kind, &task.cmd))?;
    }

    for (name, task) in cfg.task.iter() {
        let from = builder
            .id_of(name)
            .ok_or_else(|| GraphError::TaskNotFound(name.clone()))?;
        for succ in task.precede.iter() {
            let to = builder
                .id_of(succ)
                .ok_or_else(|| GraphError::TaskNotFound(succ.clone()))?;
            builder.precede(from, to)?;
        }
    }

    Ok(Arc::new(builder.build()?))
}

/// Default flow file path: `Branchflow.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Branchflow.toml")
}
