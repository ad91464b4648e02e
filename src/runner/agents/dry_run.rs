//! Dry-run adapter: reports an instant, clean run without spawning anything,
//! so the untouched starter repository is what gets tested.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use super::{AgentAdapter, AgentResult};
use crate::config::AgentConfig;

/// Marker stored as the raw output of dry runs.
pub const DRY_RUN_OUTPUT: &str = "(dry run)";

/// Adapter that never runs the agent.
pub struct DryRunAdapter {
    name: String,
    model: Option<String>,
}

impl DryRunAdapter {
    /// Creates a dry-run stand-in for `config`.
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            name: config.name.clone(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl AgentAdapter for DryRunAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, _prompt: &str, workspace: &Path) -> AgentResult {
        debug!(agent = %self.name, workspace = %workspace.display(), "Dry run, skipping agent");
        AgentResult {
            agent: self.name.clone(),
            model: self.model.clone(),
            wall_clock_seconds: 0.0,
            input_tokens: 0,
            output_tokens: 0,
            timed_out: false,
            error: None,
            raw_output: DRY_RUN_OUTPUT.to_string(),
        }
    }
}
