//! Command-line interface for agent-bench.
//!
//! Provides commands for running the benchmark and listing tasks.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands};
