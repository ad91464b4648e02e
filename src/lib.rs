//! agent-bench: benchmark harness for autonomous coding agents.
//!
//! Runs each configured agent on every task in an isolated copy of the
//! task's starter repository, verifies the result with the task's hidden
//! tests, and compares agents on correctness, speed and token usage.

pub mod cli;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod report;
pub mod runner;
pub mod scoring;
pub mod task;
pub mod utils;

// Re-export commonly used error types
pub use error::{ConfigError, TaskError, WorkspaceError};
