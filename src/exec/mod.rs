// src/exec/mod.rs

//! Task execution layer.
//!
//! This module is responsible for actually running task bodies on worker
//! threads and reporting back to the orchestration runtime via
//! `RuntimeEvent`s.
//!
//! - [`executor_loop`] owns the loop that hands tasks to bounded workers.
//! - [`task_runner`] runs an individual body and reports its outcome.
//! - [`command`] builds bodies that run shell commands (flow files).
//! - [`backend`] provides the `ExecutorBackend` trait and the concrete
//!   `WorkerPoolBackend` the runtime uses in production, and which tests can
//!   replace with a fake implementation.

pub mod backend;
pub mod command;
pub mod executor_loop;
pub mod task_runner;

pub use backend::{ExecutorBackend, WorkerPoolBackend};
pub use command::command_body;
pub use executor_loop::spawn_executor;
