//! Agent adapters.
//!
//! An adapter turns a prompt and a prepared workspace into an
//! [`AgentResult`]. Agents are black boxes: only their exit status, output
//! and elapsed time are observed. Per-agent conventions (how the workspace
//! is passed, how usage is reported) are selected by [`AgentKind`].

pub mod command;
pub mod dry_run;

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::usage::{TokenUsage, UsageFormat};
use crate::config::AgentConfig;

pub use command::CommandAdapter;
pub use dry_run::DryRunAdapter;

/// Known agent families, identified by agent name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Claude Code: one JSON document on stdout.
    ClaudeCode,
    /// Codex: JSON event stream, workspace passed with `-C`.
    Codex,
    /// Any other agent: runs in the workspace, reports no usage.
    Other,
}

/// How the workspace is handed to the agent process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceMode {
    /// The process runs with the workspace as its working directory.
    WorkingDir,
    /// The workspace path is appended after this flag; no working directory is set.
    Flag(&'static str),
}

impl AgentKind {
    /// Resolves the agent family from a configured agent name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "claude-code" => AgentKind::ClaudeCode,
            "codex" => AgentKind::Codex,
            _ => AgentKind::Other,
        }
    }

    /// Usage convention of this agent family.
    pub fn usage_format(&self) -> UsageFormat {
        match self {
            AgentKind::ClaudeCode => UsageFormat::JsonDocument,
            AgentKind::Codex => UsageFormat::JsonEvents {
                event_type: "turn.completed",
            },
            AgentKind::Other => UsageFormat::None,
        }
    }

    /// Workspace convention of this agent family.
    pub fn workspace_mode(&self) -> WorkspaceMode {
        match self {
            AgentKind::Codex => WorkspaceMode::Flag("-C"),
            AgentKind::ClaudeCode | AgentKind::Other => WorkspaceMode::WorkingDir,
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentKind::ClaudeCode => write!(f, "claude-code"),
            AgentKind::Codex => write!(f, "codex"),
            AgentKind::Other => write!(f, "other"),
        }
    }
}

/// Result of one agent invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    /// Agent name.
    pub agent: String,
    /// Model, if configured.
    pub model: Option<String>,
    /// Spawn-to-exit time, rounded to two decimals.
    pub wall_clock_seconds: f64,
    /// Input tokens reported by the agent.
    pub input_tokens: u64,
    /// Output tokens reported by the agent.
    pub output_tokens: u64,
    /// Whether the agent was killed at its deadline.
    pub timed_out: bool,
    /// Failure description; `None` on a clean exit.
    pub error: Option<String>,
    /// Captured stdout.
    pub raw_output: String,
}

impl AgentResult {
    /// Token usage as a single value.
    pub fn usage(&self) -> TokenUsage {
        TokenUsage::new(self.input_tokens, self.output_tokens)
    }

    /// True if the agent exited cleanly.
    pub fn is_success(&self) -> bool {
        !self.timed_out && self.error.is_none()
    }
}

/// Trait for agent adapters.
#[async_trait]
pub trait AgentAdapter: Send + Sync {
    /// Agent name the results are attributed to.
    fn name(&self) -> &str;

    /// Runs the agent on `prompt` inside `workspace`. Never fails: every
    /// problem is reported through the result.
    async fn invoke(&self, prompt: &str, workspace: &Path) -> AgentResult;
}

/// Creates the adapter for `agent`; dry runs never spawn the agent.
pub fn create_adapter(agent: &AgentConfig, dry_run: bool) -> Box<dyn AgentAdapter> {
    if dry_run {
        Box::new(DryRunAdapter::new(agent))
    } else {
        Box::new(CommandAdapter::new(agent.clone()))
    }
}
