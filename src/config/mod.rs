// src/config/mod.rs

//! Flow file loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a flow file from disk and turn it into a graph (`loader.rs`).
//! - Validate it before anything runs (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{build_graph, default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, ConfigSection, RawConfigFile, TaskConfig};
pub use validate::validate_config;
