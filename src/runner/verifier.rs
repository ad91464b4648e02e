//! Task-level verification across every language a task requires.
//!
//! Each required language's runner is executed in turn and the results are
//! folded into one [`TestResult`]. A language without a configured runner
//! does not stop the others from running, but the task can no longer pass.

use std::collections::HashMap;
use std::path::Path;

use tracing::{info, warn};

use super::executor::{TestExecutor, TestResult};
use crate::config::TestRunnerConfig;
use crate::task::BenchmarkTask;

/// Prefix of the aggregation error for a language without a runner.
pub const MISSING_RUNNER_PREFIX: &str = "No test runner for ";

/// Folds per-language results into one task verdict.
#[derive(Debug, Clone)]
pub struct TestAggregator {
    tests_total: u64,
    tests_passed: u64,
    all_passed: bool,
    raw_outputs: Vec<String>,
    errors: Vec<String>,
}

impl Default for TestAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAggregator {
    /// Starts an empty aggregation.
    pub fn new() -> Self {
        Self {
            tests_total: 0,
            tests_passed: 0,
            all_passed: true,
            raw_outputs: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Records that `language` has no configured runner.
    pub fn missing_runner(&mut self, language: &str) {
        self.all_passed = false;
        self.errors.push(format!("{MISSING_RUNNER_PREFIX}{language}"));
    }

    /// Adds one language's result.
    pub fn record(&mut self, language: &str, result: TestResult) {
        self.tests_total = self.tests_total.saturating_add(result.tests_total);
        self.tests_passed = self.tests_passed.saturating_add(result.tests_passed);
        self.all_passed &= result.passed;
        self.raw_outputs
            .push(format!("[{language}]\n{}", result.raw_output));
        if let Some(error) = result.error {
            self.errors.push(format!("{language}: {error}"));
        }
    }

    /// Produces the combined result.
    pub fn finish(self) -> TestResult {
        let error = (!self.errors.is_empty()).then(|| self.errors.join("; "));
        TestResult {
            tests_total: self.tests_total,
            tests_passed: self.tests_passed.min(self.tests_total),
            passed: self.all_passed && error.is_none(),
            raw_output: self.raw_outputs.join("\n\n"),
            error,
        }
    }
}

/// Runs every test language of `task` against `workspace`.
pub async fn run_task_tests(
    task: &BenchmarkTask,
    workspace: &Path,
    runners: &HashMap<String, TestRunnerConfig>,
) -> TestResult {
    let mut aggregator = TestAggregator::new();

    for language in &task.test_languages {
        let Some(config) = runners.get(language) else {
            warn!(task = %task.name, language = %language, "No test runner configured");
            aggregator.missing_runner(language);
            continue;
        };
        let result = TestExecutor::new(config.clone()).run(workspace).await;
        aggregator.record(language, result);
    }

    let result = aggregator.finish();
    info!(
        task = %task.name,
        passed = result.tests_passed,
        total = result.tests_total,
        ok = result.passed,
        "Task tests finished"
    );
    result
}

/// Languages named by missing-runner errors in an aggregated error string.
pub fn missing_runner_languages(error: &str) -> Vec<&str> {
    error
        .split("; ")
        .filter_map(|part| part.strip_prefix(MISSING_RUNNER_PREFIX))
        .collect()
}
