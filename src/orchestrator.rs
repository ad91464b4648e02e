//! Benchmark orchestration.
//!
//! Drives every (task, agent) pair through the runner pipeline, one pair at
//! a time, and persists per-pair results plus a run summary:
//!
//! ```text
//! <results_dir>/<run_id>/<agent>/<task>.json
//! <results_dir>/<run_id>/summary.json
//! ```
//!
//! A failing agent, test runner or workspace only affects its own pair; the
//! run itself aborts only when there is nothing to run.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::BenchmarkConfig;
use crate::error::WorkspaceError;
use crate::report::{distinct_agents, format_report, format_single_agent};
use crate::runner::verifier::missing_runner_languages;
use crate::runner::{
    create_adapter, run_task_tests, AgentAdapter, AgentResult, TestResult, WorkspaceManager,
};
use crate::scoring::{compute_summary, AgentSummary, TaskScore};
use crate::task::{load_tasks, BenchmarkTask};

/// File name of the run summary.
pub const SUMMARY_FILE: &str = "summary.json";

/// What to run.
#[derive(Debug, Clone)]
pub struct BenchmarkOptions {
    /// Directory holding the task directories.
    pub tasks_dir: PathBuf,
    /// Path of the YAML config.
    pub config_path: PathBuf,
    /// Test the starter repositories without running any agent.
    pub dry_run: bool,
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct BenchmarkOutcome {
    /// Timestamp-derived run identifier.
    pub run_id: String,
    /// Directory the results were written to.
    pub results_dir: PathBuf,
    /// One score per completed pair, in execution order.
    pub scores: Vec<TaskScore>,
    /// Per-agent summary.
    pub summary: BTreeMap<String, AgentSummary>,
}

/// Persisted record of one (task, agent) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairRecord {
    pub task: String,
    pub test_languages: Vec<String>,
    pub agent: String,
    pub model: Option<String>,
    pub passed: bool,
    pub tests_total: u64,
    pub tests_passed: u64,
    pub wall_clock_seconds: f64,
    pub timed_out: bool,
    pub error: Option<String>,
}

impl PairRecord {
    fn new(task: &BenchmarkTask, agent: &AgentResult, tests: &TestResult) -> Self {
        Self {
            task: task.name.clone(),
            test_languages: task.test_languages.clone(),
            agent: agent.agent.clone(),
            model: agent.model.clone(),
            passed: tests.passed,
            tests_total: tests.tests_total,
            tests_passed: tests.tests_passed,
            wall_clock_seconds: agent.wall_clock_seconds,
            timed_out: agent.timed_out,
            error: agent.error.clone().or_else(|| tests.error.clone()),
        }
    }
}

/// Loads config and tasks, then runs the benchmark.
pub async fn run_benchmark(options: &BenchmarkOptions) -> Result<BenchmarkOutcome> {
    let config = BenchmarkConfig::load(&options.config_path)
        .with_context(|| format!("Failed to load config {}", options.config_path.display()))?;
    let tasks = load_tasks(&options.tasks_dir)
        .with_context(|| format!("Failed to load tasks from {}", options.tasks_dir.display()))?;
    run_tasks(&config, &tasks, options.dry_run).await
}

/// Runs every (task, agent) pair and writes the results.
pub async fn run_tasks(
    config: &BenchmarkConfig,
    tasks: &[BenchmarkTask],
    dry_run: bool,
) -> Result<BenchmarkOutcome> {
    if tasks.is_empty() {
        bail!("No tasks found. Exiting.");
    }
    if config.agents.is_empty() {
        bail!("No agents configured. Exiting.");
    }

    if dry_run {
        println!("DRY RUN: Loaded {} tasks (skipping agent invocation)", tasks.len());
    } else {
        println!("Loaded {} tasks, {} agents", tasks.len(), config.agents.len());
    }

    let run_id = Local::now().format("%Y-%m-%d-%H%M%S").to_string();
    let results_base = config.results_dir.join(&run_id);
    info!(run_id = %run_id, results = %results_base.display(), dry_run, "Starting benchmark run");

    let mut scores = Vec::new();
    for (task_idx, task) in tasks.iter().enumerate() {
        let agents = if dry_run {
            config.agents[..1].to_vec()
        } else {
            rotate_agents(&config.agents, task_idx)
        };

        for agent in &agents {
            let adapter = create_adapter(agent, dry_run);
            let label = if dry_run {
                format!("{} (dry-run)", agent.name)
            } else {
                agent.name.clone()
            };
            println!("\n[{}] Running {}...", task.name, label);

            let (agent_result, test_result) = match run_pair(task, adapter.as_ref(), config).await {
                Ok(pair) => pair,
                Err(e) => {
                    error!(task = %task.name, agent = %agent.name, error = %e, "Workspace setup failed, skipping pair");
                    println!("  SKIP {e}");
                    continue;
                }
            };

            if let Some(err) = &test_result.error {
                for language in missing_runner_languages(err) {
                    println!("  WARNING: No test runner for language '{language}'");
                }
            }

            let score = TaskScore::from_run(&task.name, &agent_result, &test_result);
            let icon = if agent_result.timed_out {
                "TIMEOUT"
            } else if test_result.passed {
                "PASS"
            } else {
                "FAIL"
            };
            println!(
                "  {icon} {}/{} tests, {:.1}s",
                test_result.tests_passed, test_result.tests_total, agent_result.wall_clock_seconds
            );

            let record = PairRecord::new(task, &agent_result, &test_result);
            if let Err(e) = write_pair_record(&results_base, &record) {
                warn!(task = %task.name, agent = %agent.name, error = %e, "Failed to write pair result");
            }
            scores.push(score);
        }
    }

    if distinct_agents(&scores) >= 2 {
        println!("\n{}", format_report(&scores));
    } else {
        let title = if dry_run { "DRY RUN RESULTS" } else { "RESULTS" };
        println!("\n{}", format_single_agent(&scores, title));
    }

    let summary = compute_summary(&scores);
    write_json(&results_base.join(SUMMARY_FILE), &summary).context("Failed to write run summary")?;
    println!("\nResults saved to {}", results_base.display());

    Ok(BenchmarkOutcome {
        run_id,
        results_dir: results_base,
        scores,
        summary,
    })
}

/// Agent order for the task at `task_index`: rotated left by
/// `task_index % len` so no agent always goes first.
pub fn rotate_agents<T: Clone>(agents: &[T], task_index: usize) -> Vec<T> {
    if agents.is_empty() {
        return Vec::new();
    }
    let mut rotated = agents.to_vec();
    rotated.rotate_left(task_index % agents.len());
    rotated
}

/// Runs one pair in its own workspace, which is removed on every path.
async fn run_pair(
    task: &BenchmarkTask,
    adapter: &dyn AgentAdapter,
    config: &BenchmarkConfig,
) -> Result<(AgentResult, TestResult), WorkspaceError> {
    let mut workspaces = WorkspaceManager::new(adapter.name());

    let outcome = async {
        let workspace = workspaces.prepare(&task.repo_dir)?;
        let agent_result = adapter.invoke(&task.prompt, &workspace).await;
        workspaces.overlay_tests(&task.tests_dir, &workspace)?;
        let test_result = run_task_tests(task, &workspace, &config.test_runners).await;
        Ok::<_, WorkspaceError>((agent_result, test_result))
    }
    .await;

    workspaces.cleanup();
    outcome
}

fn write_pair_record(results_base: &Path, record: &PairRecord) -> Result<()> {
    let path = results_base
        .join(&record.agent)
        .join(format!("{}.json", record.task));
    write_json(&path, record)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_rotate_agents() {
        let agents = vec!["a", "b", "c"];
        assert_eq!(rotate_agents(&agents, 0), vec!["a", "b", "c"]);
        assert_eq!(rotate_agents(&agents, 1), vec!["b", "c", "a"]);
        assert_eq!(rotate_agents(&agents, 2), vec!["c", "a", "b"]);
        assert_eq!(rotate_agents(&agents, 3), vec!["a", "b", "c"]);
        assert!(rotate_agents::<&str>(&[], 5).is_empty());
    }

    #[test]
    fn test_pair_record_error_precedence() {
        let task = BenchmarkTask {
            name: "t".to_string(),
            prompt: String::new(),
            language: "python".to_string(),
            test_languages: vec!["python".to_string()],
            category: "bugfix".to_string(),
            timeout_seconds: 60,
            repo_dir: PathBuf::new(),
            tests_dir: PathBuf::new(),
            task_dir: PathBuf::new(),
        };
        let agent = AgentResult {
            agent: "a".to_string(),
            model: None,
            wall_clock_seconds: 3.0,
            input_tokens: 0,
            output_tokens: 0,
            timed_out: true,
            error: Some("Timed out after 60s".to_string()),
            raw_output: String::new(),
        };
        let tests = TestResult::failure("python: Test execution timed out");

        let record = PairRecord::new(&task, &agent, &tests);
        assert_eq!(record.error.as_deref(), Some("Timed out after 60s"));
        assert!(record.timed_out);
        assert!(!record.passed);
    }

    #[tokio::test]
    async fn test_run_tasks_rejects_empty_inputs() {
        let config = BenchmarkConfig {
            agents: vec![AgentConfig::new("a", "true")],
            test_runners: HashMap::new(),
            results_dir: PathBuf::from("unused"),
        };
        let err = run_tasks(&config, &[], false).await.unwrap_err();
        assert!(err.to_string().contains("No tasks found"));

        let no_agents = BenchmarkConfig {
            agents: Vec::new(),
            ..config
        };
        let task = BenchmarkTask {
            name: "t".to_string(),
            prompt: "p".to_string(),
            language: "python".to_string(),
            test_languages: vec!["python".to_string()],
            category: "x".to_string(),
            timeout_seconds: 1,
            repo_dir: PathBuf::new(),
            tests_dir: PathBuf::new(),
            task_dir: PathBuf::new(),
        };
        let err = run_tasks(&no_agents, &[task], false).await.unwrap_err();
        assert!(err.to_string().contains("No agents configured"));
    }

    #[tokio::test]
    async fn test_missing_repo_skips_pair_and_still_writes_summary() {
        let temp = TempDir::new().unwrap();
        let config = BenchmarkConfig {
            agents: vec![AgentConfig::new("a", "true")],
            test_runners: HashMap::new(),
            results_dir: temp.path().join("results"),
        };
        let task = BenchmarkTask {
            name: "missing-repo".to_string(),
            prompt: "p".to_string(),
            language: "python".to_string(),
            test_languages: vec!["python".to_string()],
            category: "x".to_string(),
            timeout_seconds: 1,
            repo_dir: temp.path().join("nope/repo"),
            tests_dir: temp.path().join("nope/tests"),
            task_dir: temp.path().join("nope"),
        };

        let outcome = run_tasks(&config, &[task], true).await.unwrap();
        assert!(outcome.scores.is_empty());
        assert!(outcome.summary.is_empty());
        assert!(outcome.results_dir.join(SUMMARY_FILE).exists());
    }
}
