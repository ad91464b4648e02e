//! Per-pair scores and per-agent summaries.
//!
//! A [`TaskScore`] is built once per (task, agent) pair and never changes.
//! Summaries are always recomputed from the full score list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::runner::{AgentResult, TestResult};
use crate::utils::round2;

/// Score of one agent on one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskScore {
    pub task: String,
    pub agent: String,
    pub model: Option<String>,
    pub tests_passed: u64,
    pub tests_total: u64,
    /// `tests_passed / tests_total`, or 0 without tests.
    pub correctness: f64,
    pub wall_clock_seconds: f64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub timed_out: bool,
    /// Agent error if any, otherwise test error.
    pub error: Option<String>,
}

impl TaskScore {
    /// Combines an agent run and its test verdict into a score.
    pub fn from_run(task: &str, agent: &AgentResult, tests: &TestResult) -> Self {
        let tests_passed = tests.tests_passed.min(tests.tests_total);
        Self {
            task: task.to_string(),
            agent: agent.agent.clone(),
            model: agent.model.clone(),
            tests_passed,
            tests_total: tests.tests_total,
            correctness: correctness(tests_passed, tests.tests_total),
            wall_clock_seconds: agent.wall_clock_seconds,
            input_tokens: agent.input_tokens,
            output_tokens: agent.output_tokens,
            timed_out: agent.timed_out,
            error: agent.error.clone().or_else(|| tests.error.clone()),
        }
    }

    /// Every test passed and there was at least one.
    pub fn is_fully_passed(&self) -> bool {
        self.tests_total > 0 && self.tests_passed == self.tests_total
    }

    /// Input plus output tokens.
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// Fraction of tests passed; 0 when there are no tests.
pub fn correctness(tests_passed: u64, tests_total: u64) -> f64 {
    if tests_total == 0 {
        0.0
    } else {
        tests_passed as f64 / tests_total as f64
    }
}

/// Aggregate statistics of one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub total_tasks: usize,
    pub tasks_fully_passed: usize,
    /// Mean correctness over all tasks, timed-out ones included.
    pub avg_correctness: f64,
    /// Mean wall-clock time over runs that did not time out.
    pub avg_speed_seconds: f64,
    /// Mean input+output tokens over runs that did not time out.
    pub avg_total_tokens: f64,
    pub scores: Vec<TaskScore>,
}

impl AgentSummary {
    fn from_scores(scores: Vec<TaskScore>) -> Self {
        let total_tasks = scores.len();
        let tasks_fully_passed = scores.iter().filter(|s| s.is_fully_passed()).count();
        let avg_correctness = mean(scores.iter().map(|s| s.correctness));

        let finished: Vec<&TaskScore> = scores.iter().filter(|s| !s.timed_out).collect();
        let avg_speed_seconds = mean(finished.iter().map(|s| s.wall_clock_seconds));
        let avg_total_tokens = mean(finished.iter().map(|s| s.total_tokens() as f64));

        Self {
            total_tasks,
            tasks_fully_passed,
            avg_correctness: round2(avg_correctness),
            avg_speed_seconds: round2(avg_speed_seconds),
            avg_total_tokens: round2(avg_total_tokens),
            scores,
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Groups `scores` by agent and summarises each group.
///
/// Pure: the same input always yields the same output, keyed by agent name
/// in sorted order. Each agent's scores keep their input order.
pub fn compute_summary(scores: &[TaskScore]) -> BTreeMap<String, AgentSummary> {
    let mut by_agent: BTreeMap<String, Vec<TaskScore>> = BTreeMap::new();
    for score in scores {
        by_agent
            .entry(score.agent.clone())
            .or_default()
            .push(score.clone());
    }

    by_agent
        .into_iter()
        .map(|(agent, scores)| (agent, AgentSummary::from_scores(scores)))
        .collect()
}
