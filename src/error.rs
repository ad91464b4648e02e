//! Error types for agent-bench operations.
//!
//! Defines the typed errors for the subsystems whose failures the caller
//! has to tell apart:
//! - Configuration loading and validation
//! - Task discovery
//! - Workspace preparation
//!
//! Per-pair failures (agent crashes, test timeouts, missing runners) are not
//! errors in this sense; they are recorded in the pair's own result records.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading the benchmark configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Missing required field '{field}' for {owner}")]
    MissingField { owner: String, field: String },

    #[error("Agent '{agent}' has invalid timeout_seconds: must be greater than 0")]
    InvalidTimeout { agent: String },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Errors that can occur during task discovery.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Tasks directory does not exist: {0}")]
    NotFound(PathBuf),

    #[error("Invalid metadata in '{path}': {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while preparing a workspace.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Source directory does not exist: {0}")]
    MissingSource(PathBuf),

    #[error("Failed to create workspace: {0}")]
    Create(#[source] std::io::Error),

    #[error("Failed to copy '{from}' to '{to}': {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}
