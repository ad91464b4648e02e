//! Single-language test execution.
//!
//! Runs one language's test command in a workspace and turns its textual
//! output into pass/fail counts according to the runner's output family.

use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::process::run_with_timeout;
use crate::config::{OutputFormat, TestRunnerConfig};
use crate::utils::render_template;

/// Ceiling for one test command, independent of the agent timeout.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Error recorded when a test command hits [`TEST_TIMEOUT`].
pub const TEST_TIMEOUT_ERROR: &str = "Test execution timed out";

static PASSED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+) passed").expect("valid regex"));
static FAILED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+) failed").expect("valid regex"));
static TOTAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+) total").expect("valid regex"));
static JEST_TESTS_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*Tests:(.*)$").expect("valid regex"));
static MAKE_SUMMARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)/(\d+) passed").expect("valid regex"));

/// Uniform outcome of a test run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    /// Tests discovered.
    pub tests_total: u64,
    /// Tests that passed; never exceeds `tests_total`.
    pub tests_passed: u64,
    /// Whether the run counts as a pass.
    pub passed: bool,
    /// Combined runner output.
    pub raw_output: String,
    /// Execution problem, if any.
    pub error: Option<String>,
}

impl TestResult {
    /// Creates a result, clamping `tests_passed` to `tests_total`.
    pub fn new(tests_total: u64, tests_passed: u64, passed: bool, raw_output: impl Into<String>) -> Self {
        Self {
            tests_total,
            tests_passed: tests_passed.min(tests_total),
            passed,
            raw_output: raw_output.into(),
            error: None,
        }
    }

    /// Creates a failed result carrying an error and no counts.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            tests_total: 0,
            tests_passed: 0,
            passed: false,
            raw_output: String::new(),
            error: Some(error.into()),
        }
    }

    /// Result of a test command killed at the ceiling.
    pub fn timed_out() -> Self {
        Self::failure(TEST_TIMEOUT_ERROR)
    }
}

/// Parses pytest output: `N passed`, `M failed`; the exit code decides.
pub fn parse_pytest_output(output: &str, exit_code: i32) -> TestResult {
    let passed = first_count(&PASSED_RE, output);
    let failed = first_count(&FAILED_RE, output);
    TestResult::new(passed.saturating_add(failed), passed, exit_code == 0, output)
}

/// Parses jest output. The `Tests:` summary line wins over the `Test Suites:`
/// line; without one, the first `N passed` / `T total` anywhere are used.
pub fn parse_jest_output(output: &str, exit_code: i32) -> TestResult {
    let tests_line = JEST_TESTS_LINE_RE
        .captures_iter(output)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str());
    let scope = tests_line.unwrap_or(output);

    let passed = first_count(&PASSED_RE, scope);
    let total = first_count(&TOTAL_RE, scope);
    TestResult::new(total, passed, exit_code == 0, output)
}

/// Parses make-driven C/C++ harness output.
///
/// An explicit `X/Y passed` line is preferred over counting `[PASS]`/`[FAIL]`
/// markers. The exit code is ignored: success means every discovered test
/// passed.
pub fn parse_make_output(output: &str, _exit_code: i32) -> TestResult {
    let (passed, total) = match MAKE_SUMMARY_RE.captures(output) {
        Some(caps) => (capture_count(&caps, 1), capture_count(&caps, 2)),
        None => {
            let passed = output.matches("[PASS]").count() as u64;
            let failed = output.matches("[FAIL]").count() as u64;
            (passed, passed.saturating_add(failed))
        }
    };
    TestResult::new(total, passed, total > 0 && passed == total, output)
}

/// Output without a known structure: no counts, the exit code decides.
pub fn parse_plain_output(output: &str, exit_code: i32) -> TestResult {
    TestResult::new(0, 0, exit_code == 0, output)
}

/// Parses `output` according to `format`.
pub fn parse_output(format: OutputFormat, output: &str, exit_code: i32) -> TestResult {
    match format {
        OutputFormat::Pytest => parse_pytest_output(output, exit_code),
        OutputFormat::Jest => parse_jest_output(output, exit_code),
        OutputFormat::Make => parse_make_output(output, exit_code),
        OutputFormat::Plain => parse_plain_output(output, exit_code),
    }
}

fn first_count(re: &Regex, text: &str) -> u64 {
    re.captures(text)
        .map(|caps| capture_count(&caps, 1))
        .unwrap_or(0)
}

fn capture_count(caps: &regex::Captures<'_>, group: usize) -> u64 {
    caps.get(group)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Runs one language's tests.
pub struct TestExecutor {
    config: TestRunnerConfig,
    timeout: Duration,
}

impl TestExecutor {
    /// Creates an executor with the standard [`TEST_TIMEOUT`].
    pub fn new(config: TestRunnerConfig) -> Self {
        Self {
            config,
            timeout: TEST_TIMEOUT,
        }
    }

    /// Overrides the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Renders the shell command for `workspace`.
    pub fn command_line(&self, workspace: &Path) -> String {
        let test_dir = workspace.join(self.config.pattern.trim_end_matches('/'));
        let test_dir = test_dir.to_string_lossy();
        let workspace = workspace.to_string_lossy();
        render_template(
            &self.config.command,
            &[("{test_dir}", test_dir.as_ref()), ("{workspace}", workspace.as_ref())],
        )
    }

    /// Runs the tests in `workspace` and parses the result.
    pub async fn run(&self, workspace: &Path) -> TestResult {
        let command_line = self.command_line(workspace);
        let format = self.config.output_format();
        info!(
            language = %self.config.language,
            format = %format,
            command = %command_line,
            "Running tests"
        );

        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(&command_line).current_dir(workspace);

        let output = match run_with_timeout(cmd, self.timeout).await {
            Ok(output) => output,
            Err(e) => {
                warn!(language = %self.config.language, error = %e, "Failed to start test command");
                return TestResult::failure(format!("Failed to run test command: {e}"));
            }
        };

        if output.timed_out {
            warn!(language = %self.config.language, timeout = ?self.timeout, "Test execution timed out");
            return TestResult::timed_out();
        }

        let combined = format!("{}\n{}", output.stdout, output.stderr);
        let result = parse_output(format, &combined, output.exit_code);
        debug!(
            language = %self.config.language,
            exit_code = output.exit_code,
            passed = result.tests_passed,
            total = result.tests_total,
            "Tests finished"
        );
        result
    }
}
