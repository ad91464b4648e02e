//! Benchmark configuration: agents, per-language test runners and the
//! results directory, loaded from a YAML file.
//!
//! ```yaml
//! agents:
//!   claude-code:
//!     command: claude
//!     args: ["-p", "{prompt}", "--output-format", "json"]
//!     timeout_seconds: 600
//! test_runners:
//!   python:
//!     command: "python -m pytest {test_dir} -v"
//!     pattern: "tests/"
//! results_dir: results
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Default config file looked up when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "bench.yaml";

/// Default agent timeout in seconds.
pub const DEFAULT_AGENT_TIMEOUT_SECS: u64 = 300;

/// Default results directory.
pub const DEFAULT_RESULTS_DIR: &str = "results";

/// How an agent is launched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Unique agent identifier; also selects the agent's conventions.
    pub name: String,
    /// Executable to run.
    pub command: String,
    /// Argument templates (`{prompt}`, `{model}`, `{workspace}`).
    pub args: Vec<String>,
    /// Model identifier, if the agent takes one.
    pub model: Option<String>,
    /// Hard limit for one invocation.
    pub timeout_seconds: u64,
}

impl AgentConfig {
    /// Creates an agent config with no args, no model and the default timeout.
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            model: None,
            timeout_seconds: DEFAULT_AGENT_TIMEOUT_SECS,
        }
    }

    /// Sets the argument templates.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

/// Output convention of a test runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// `N passed, M failed` summary; exit code decides success.
    Pytest,
    /// `Tests: N passed, T total` summary; exit code decides success.
    Jest,
    /// `X/Y passed` summary or `[PASS]`/`[FAIL]` markers; counts decide success.
    Make,
    /// No structured output; exit code decides success.
    Plain,
}

impl OutputFormat {
    /// Returns the output family conventionally used for a language.
    pub fn for_language(language: &str) -> Self {
        match language {
            "python" => OutputFormat::Pytest,
            "typescript" | "javascript" | "angular" => OutputFormat::Jest,
            "c" | "cpp" => OutputFormat::Make,
            _ => OutputFormat::Plain,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Pytest => write!(f, "pytest"),
            OutputFormat::Jest => write!(f, "jest"),
            OutputFormat::Make => write!(f, "make"),
            OutputFormat::Plain => write!(f, "plain"),
        }
    }
}

/// How the tests of one language are run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRunnerConfig {
    /// Language key this runner serves.
    pub language: String,
    /// Shell command template (`{test_dir}`, `{workspace}`).
    pub command: String,
    /// Test directory, relative to the workspace root.
    pub pattern: String,
    /// Explicit output family, overriding the language default.
    pub format: Option<OutputFormat>,
}

impl TestRunnerConfig {
    /// Creates a runner config whose output family follows the language.
    pub fn new(
        language: impl Into<String>,
        command: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            language: language.into(),
            command: command.into(),
            pattern: pattern.into(),
            format: None,
        }
    }

    /// Forces a specific output family.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Output family used to parse this runner's output.
    pub fn output_format(&self) -> OutputFormat {
        self.format
            .unwrap_or_else(|| OutputFormat::for_language(&self.language))
    }
}

/// Fully loaded benchmark configuration.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Agents in declaration order.
    pub agents: Vec<AgentConfig>,
    /// Test runners keyed by language.
    pub test_runners: HashMap<String, TestRunnerConfig>,
    /// Where per-run result directories are written.
    pub results_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    agents: serde_yaml::Mapping,
    #[serde(default)]
    test_runners: HashMap<String, RawRunner>,
    #[serde(default)]
    results_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawAgent {
    #[serde(default)]
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawRunner {
    #[serde(default)]
    command: String,
    #[serde(default)]
    pattern: String,
    #[serde(default)]
    format: Option<OutputFormat>,
}

impl BenchmarkConfig {
    /// Loads and validates the config file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&content)?;
        debug!(
            path = %path.display(),
            agents = config.agents.len(),
            runners = config.test_runners.len(),
            "Loaded benchmark config"
        );
        Ok(config)
    }

    /// Parses and validates a YAML config document.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_yaml::from_str(content)?;

        // Iterate the mapping directly: its order is the declared agent order.
        let mut agents = Vec::with_capacity(raw.agents.len());
        for (key, value) in raw.agents {
            let name = key
                .as_str()
                .ok_or_else(|| ConfigError::Invalid(format!("agent name must be a string: {key:?}")))?
                .to_string();
            let agent: RawAgent = serde_yaml::from_value(value)?;
            if agent.command.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    owner: format!("agent '{name}'"),
                    field: "command".to_string(),
                });
            }
            let timeout_seconds = agent.timeout_seconds.unwrap_or(DEFAULT_AGENT_TIMEOUT_SECS);
            if timeout_seconds == 0 {
                return Err(ConfigError::InvalidTimeout { agent: name });
            }
            if agents.iter().any(|a: &AgentConfig| a.name == name) {
                return Err(ConfigError::Invalid(format!("duplicate agent '{name}'")));
            }
            agents.push(AgentConfig {
                name,
                command: agent.command,
                args: agent.args,
                model: agent.model,
                timeout_seconds,
            });
        }

        let mut test_runners = HashMap::with_capacity(raw.test_runners.len());
        for (language, runner) in raw.test_runners {
            if runner.command.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    owner: format!("test runner '{language}'"),
                    field: "command".to_string(),
                });
            }
            test_runners.insert(
                language.clone(),
                TestRunnerConfig {
                    language,
                    command: runner.command,
                    pattern: runner.pattern,
                    format: runner.format,
                },
            );
        }

        Ok(Self {
            agents,
            test_runners,
            results_dir: raw
                .results_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_DIR)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
agents:
  codex:
    command: codex
    args: ["exec", "--json", "{prompt}"]
    model: gpt-5
    timeout_seconds: 900
  claude-code:
    command: claude
    args: ["-p", "{prompt}", "--output-format", "json"]
test_runners:
  python:
    command: "python -m pytest {test_dir} -v"
    pattern: "tests/"
  c:
    command: "make -C {workspace} test"
    pattern: "tests/"
  rust:
    command: "cargo test"
    pattern: "tests/"
    format: plain
results_dir: out
"#;

    #[test]
    fn test_load_preserves_agent_order() {
        let config = BenchmarkConfig::from_yaml_str(SAMPLE).unwrap();
        let names: Vec<_> = config.agents.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["codex", "claude-code"]);
        assert_eq!(config.results_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_agent_defaults() {
        let config = BenchmarkConfig::from_yaml_str(SAMPLE).unwrap();
        let claude = &config.agents[1];
        assert_eq!(claude.timeout_seconds, DEFAULT_AGENT_TIMEOUT_SECS);
        assert_eq!(claude.model, None);

        let codex = &config.agents[0];
        assert_eq!(codex.timeout_seconds, 900);
        assert_eq!(codex.model.as_deref(), Some("gpt-5"));
        assert_eq!(codex.args.len(), 3);
    }

    #[test]
    fn test_runner_formats() {
        let config = BenchmarkConfig::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(config.test_runners["python"].output_format(), OutputFormat::Pytest);
        assert_eq!(config.test_runners["c"].output_format(), OutputFormat::Make);
        assert_eq!(config.test_runners["rust"].output_format(), OutputFormat::Plain);
        assert_eq!(config.test_runners["python"].language, "python");
    }

    #[test]
    fn test_results_dir_default() {
        let config = BenchmarkConfig::from_yaml_str("agents: {}\n").unwrap();
        assert!(config.agents.is_empty());
        assert_eq!(config.results_dir, PathBuf::from(DEFAULT_RESULTS_DIR));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let yaml = "agents:\n  a:\n    command: x\n    timeout_seconds: 0\n";
        let err = BenchmarkConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout { ref agent } if agent == "a"));
    }

    #[test]
    fn test_missing_command_rejected() {
        let yaml = "agents:\n  a:\n    args: []\n";
        let err = BenchmarkConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { .. }));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = BenchmarkConfig::from_yaml_str("agents: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = BenchmarkConfig::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_output_format_for_language() {
        assert_eq!(OutputFormat::for_language("typescript"), OutputFormat::Jest);
        assert_eq!(OutputFormat::for_language("angular"), OutputFormat::Jest);
        assert_eq!(OutputFormat::for_language("cpp"), OutputFormat::Make);
        assert_eq!(OutputFormat::for_language("go"), OutputFormat::Plain);
    }

    #[test]
    fn test_agent_config_builder() {
        let agent = AgentConfig::new("codex", "codex")
            .with_args(["exec", "{prompt}"])
            .with_model("o3")
            .with_timeout(60);
        assert_eq!(agent.args, vec!["exec".to_string(), "{prompt}".to_string()]);
        assert_eq!(agent.model.as_deref(), Some("o3"));
        assert_eq!(agent.timeout_seconds, 60);
    }
}
