//! Command-line agent adapter.
//!
//! Runs the configured agent executable with templated arguments under the
//! agent's timeout.

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{AgentAdapter, AgentKind, AgentResult, WorkspaceMode};
use crate::config::AgentConfig;
use crate::runner::process::run_with_timeout;
use crate::utils::{render_template, round2};

/// Adapter that launches a CLI agent as a child process.
pub struct CommandAdapter {
    config: AgentConfig,
    kind: AgentKind,
}

impl CommandAdapter {
    /// Creates an adapter; conventions follow the agent's name.
    pub fn new(config: AgentConfig) -> Self {
        let kind = AgentKind::from_name(&config.name);
        Self { config, kind }
    }

    /// The agent family this adapter follows.
    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    /// Builds the argument vector for one invocation.
    pub fn build_args(&self, prompt: &str, workspace: &Path) -> Vec<String> {
        let workspace_str = workspace.to_string_lossy();
        let mut vars = vec![("{prompt}", prompt), ("{workspace}", workspace_str.as_ref())];
        if let Some(model) = &self.config.model {
            vars.push(("{model}", model.as_str()));
        }

        let mut args: Vec<String> = self
            .config
            .args
            .iter()
            .map(|arg| render_template(arg, &vars))
            .collect();

        if let WorkspaceMode::Flag(flag) = self.kind.workspace_mode() {
            args.push(flag.to_string());
            args.push(workspace_str.to_string());
        }
        args
    }

    fn result(&self, elapsed: Duration) -> AgentResult {
        AgentResult {
            agent: self.config.name.clone(),
            model: self.config.model.clone(),
            wall_clock_seconds: round2(elapsed.as_secs_f64()),
            input_tokens: 0,
            output_tokens: 0,
            timed_out: false,
            error: None,
            raw_output: String::new(),
        }
    }
}

#[async_trait]
impl AgentAdapter for CommandAdapter {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn invoke(&self, prompt: &str, workspace: &Path) -> AgentResult {
        let mut cmd = Command::new(&self.config.command);
        cmd.args(self.build_args(prompt, workspace));
        if self.kind.workspace_mode() == WorkspaceMode::WorkingDir {
            cmd.current_dir(workspace);
        }

        let timeout = Duration::from_secs(self.config.timeout_seconds);
        info!(
            agent = %self.config.name,
            workspace = %workspace.display(),
            timeout_secs = self.config.timeout_seconds,
            "Invoking agent"
        );

        let start = Instant::now();
        let output = match run_with_timeout(cmd, timeout).await {
            Ok(output) => output,
            Err(e) => {
                warn!(agent = %self.config.name, error = %e, "Failed to spawn agent");
                let mut result = self.result(start.elapsed());
                result.error = Some(format!("Failed to spawn {}: {}", self.config.command, e));
                return result;
            }
        };

        let usage = self.kind.usage_format().parse(&output.stdout);
        let mut result = self.result(output.elapsed);
        result.input_tokens = usage.input_tokens;
        result.output_tokens = usage.output_tokens;

        if output.timed_out {
            warn!(agent = %self.config.name, "Agent timed out after {}s", self.config.timeout_seconds);
            result.timed_out = true;
            result.error = Some(format!("Timed out after {}s", self.config.timeout_seconds));
        } else if output.exit_code != 0 {
            debug!(agent = %self.config.name, exit_code = output.exit_code, "Agent exited with non-zero code");
            let stderr = output.stderr.trim_end();
            result.error = Some(if stderr.trim().is_empty() {
                format!("Exit code {}", output.exit_code)
            } else {
                stderr.to_string()
            });
        }
        result.raw_output = output.stdout;

        debug!(
            agent = %self.config.name,
            elapsed_secs = result.wall_clock_seconds,
            input_tokens = result.input_tokens,
            output_tokens = result.output_tokens,
            "Agent finished"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_build_args_substitutes_prompt_and_model() {
        let adapter = CommandAdapter::new(
            AgentConfig::new("claude-code", "claude")
                .with_args(["-p", "{prompt}", "--model", "{model}"])
                .with_model("opus"),
        );
        let args = adapter.build_args("Fix the bug", Path::new("/tmp/ws"));
        assert_eq!(args, vec!["-p", "Fix the bug", "--model", "opus"]);
    }

    #[test]
    fn test_build_args_without_model_leaves_placeholder() {
        let adapter = CommandAdapter::new(
            AgentConfig::new("other", "agent").with_args(["--model={model}", "{prompt}"]),
        );
        let args = adapter.build_args("go", Path::new("/tmp/ws"));
        assert_eq!(args, vec!["--model={model}", "go"]);
    }

    #[test]
    fn test_build_args_codex_appends_workspace_flag() {
        let adapter = CommandAdapter::new(
            AgentConfig::new("codex", "codex").with_args(["exec", "--json", "{prompt}"]),
        );
        let workspace = PathBuf::from("/tmp/bench-codex-abc");
        let args = adapter.build_args("do it", &workspace);
        assert_eq!(
            args,
            vec!["exec", "--json", "do it", "-C", "/tmp/bench-codex-abc"]
        );
        assert_eq!(adapter.kind(), AgentKind::Codex);
    }

    #[test]
    fn test_build_args_prompt_is_verbatim() {
        let adapter =
            CommandAdapter::new(AgentConfig::new("other", "agent").with_args(["{prompt}"]));
        let prompt = "Use 'quotes' and \"doubles\" and $HOME and {workspace}";
        let args = adapter.build_args(prompt, Path::new("/w"));
        assert_eq!(args, vec![prompt.to_string()]);
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use tempfile::TempDir;

        fn sh_agent(name: &str, script: &str) -> CommandAdapter {
            CommandAdapter::new(
                AgentConfig::new(name, "sh")
                    .with_args(["-c", script, "agent", "{prompt}"])
                    .with_timeout(10),
            )
        }

        #[tokio::test]
        async fn test_clean_exit_runs_in_workspace() {
            let workspace = TempDir::new().unwrap();
            let adapter = sh_agent("other", r#"printf '%s' "$1" > prompt.txt; echo done"#);

            let result = adapter.invoke("hello prompt", workspace.path()).await;
            assert!(result.is_success());
            assert_eq!(result.error, None);
            assert_eq!(result.raw_output, "done\n");
            assert_eq!(
                std::fs::read_to_string(workspace.path().join("prompt.txt")).unwrap(),
                "hello prompt"
            );
            assert!(result.wall_clock_seconds >= 0.0);
        }

        #[tokio::test]
        async fn test_nonzero_exit_reports_stderr() {
            let workspace = TempDir::new().unwrap();
            let adapter = sh_agent("other", "echo 'boom' >&2; exit 2");
            let result = adapter.invoke("x", workspace.path()).await;
            assert_eq!(result.error.as_deref(), Some("boom"));
            assert!(!result.timed_out);
        }

        #[tokio::test]
        async fn test_nonzero_exit_without_stderr() {
            let workspace = TempDir::new().unwrap();
            let adapter = sh_agent("other", "exit 7");
            let result = adapter.invoke("x", workspace.path()).await;
            assert_eq!(result.error.as_deref(), Some("Exit code 7"));
        }

        #[tokio::test]
        async fn test_timeout() {
            let workspace = TempDir::new().unwrap();
            let adapter = CommandAdapter::new(
                AgentConfig::new("other", "sh")
                    .with_args(["-c", "echo partial; exec sleep 30"])
                    .with_timeout(1),
            );
            let result = adapter.invoke("x", workspace.path()).await;
            assert!(result.timed_out);
            assert_eq!(result.error.as_deref(), Some("Timed out after 1s"));
            assert_eq!(result.raw_output, "partial\n");
            assert!(result.wall_clock_seconds < 10.0);
        }

        #[tokio::test]
        async fn test_codex_gets_workspace_flag_not_working_dir() {
            let workspace = TempDir::new().unwrap();
            // $1 is the prompt; the adapter appends `-C <workspace>` as $2 $3.
            let adapter = sh_agent("codex", r#"pwd; printf '%s\n' "$2" "$3""#);

            let result = adapter.invoke("x", workspace.path()).await;
            assert!(result.is_success());
            let lines: Vec<&str> = result.raw_output.lines().collect();
            assert_eq!(lines.len(), 3);
            let workspace_str = workspace.path().to_string_lossy();
            assert_ne!(lines[0], workspace_str);
            assert_eq!(lines[1], "-C");
            assert_eq!(lines[2], workspace_str);
        }

        #[tokio::test]
        async fn test_claude_code_usage_extracted() {
            let workspace = TempDir::new().unwrap();
            let adapter = sh_agent(
                "claude-code",
                r#"echo '{"result":"Done","usage":{"input_tokens":1000,"output_tokens":500}}'"#,
            );
            let result = adapter.invoke("x", workspace.path()).await;
            assert_eq!(result.input_tokens, 1000);
            assert_eq!(result.output_tokens, 500);
        }

        #[tokio::test]
        async fn test_unparseable_usage_is_zero() {
            let workspace = TempDir::new().unwrap();
            let adapter = sh_agent("claude-code", "echo 'not json at all'");
            let result = adapter.invoke("x", workspace.path()).await;
            assert!(result.is_success());
            assert_eq!(result.usage().total(), 0);
        }

        #[tokio::test]
        async fn test_spawn_failure_recorded() {
            let workspace = TempDir::new().unwrap();
            let adapter = CommandAdapter::new(AgentConfig::new("other", "/no/such/agent-binary"));
            let result = adapter.invoke("x", workspace.path()).await;
            assert!(!result.timed_out);
            assert!(result
                .error
                .as_deref()
                .unwrap()
                .starts_with("Failed to spawn /no/such/agent-binary"));
        }
    }
}
