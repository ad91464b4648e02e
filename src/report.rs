//! Plain-text benchmark reports.

use std::collections::{BTreeMap, BTreeSet};

use crate::scoring::{compute_summary, AgentSummary, TaskScore};

const TASK_COL: usize = 30;
const METRIC_COL: usize = 25;
const AGENT_COL: usize = 15;

/// Comparative report: per-task results followed by per-agent summary rows.
pub fn format_report(scores: &[TaskScore]) -> String {
    let summary = compute_summary(scores);
    let agents: Vec<&String> = summary.keys().collect();
    let task_width = TASK_COL + AGENT_COL * agents.len() + agents.len();
    let metric_width = METRIC_COL + AGENT_COL * agents.len() + agents.len();

    let mut by_task: BTreeMap<&str, BTreeMap<&str, &TaskScore>> = BTreeMap::new();
    for score in scores {
        by_task
            .entry(score.task.as_str())
            .or_default()
            .insert(score.agent.as_str(), score);
    }

    let mut lines = vec![
        "=".repeat(task_width),
        "  BENCHMARK RESULTS".to_string(),
        "=".repeat(task_width),
        String::new(),
        "TASK RESULTS".to_string(),
        "-".repeat(task_width),
        header_row("Task", TASK_COL, &agents),
        "-".repeat(task_width),
    ];

    for (task, task_scores) in &by_task {
        let mut row = format!("{:<w$}", task, w = TASK_COL);
        for agent in &agents {
            let cell = match task_scores.get(agent.as_str()) {
                None => "N/A".to_string(),
                Some(s) if s.timed_out => "TIMEOUT".to_string(),
                Some(s) => format!(
                    "{} {}/{} {:.0}s",
                    if s.is_fully_passed() { "PASS" } else { "FAIL" },
                    s.tests_passed,
                    s.tests_total,
                    s.wall_clock_seconds
                ),
            };
            row.push_str(&format!(" {:<w$}", cell, w = AGENT_COL));
        }
        lines.push(row);
    }

    lines.push(String::new());
    lines.push("SUMMARY".to_string());
    lines.push("-".repeat(metric_width));
    lines.push(header_row("Metric", METRIC_COL, &agents));
    lines.push("-".repeat(metric_width));

    let metrics: [(&str, fn(&AgentSummary) -> String); 4] = [
        ("Tasks fully passed", |s| format!("{}/{}", s.tasks_fully_passed, s.total_tasks)),
        ("Avg correctness", |s| s.avg_correctness.to_string()),
        ("Avg speed (s)", |s| s.avg_speed_seconds.to_string()),
        ("Avg tokens", |s| s.avg_total_tokens.to_string()),
    ];
    for (name, render) in metrics {
        let mut row = format!("{:<w$}", name, w = METRIC_COL);
        for agent in &agents {
            row.push_str(&format!(" {:<w$}", render(&summary[agent.as_str()]), w = AGENT_COL));
        }
        lines.push(row);
    }

    lines.join("\n")
}

/// Listing used when only one agent ran (e.g. dry runs).
pub fn format_single_agent(scores: &[TaskScore], title: &str) -> String {
    let mut lines = vec!["=".repeat(60), format!("  {title}"), "=".repeat(60)];
    for s in scores {
        let icon = if s.is_fully_passed() { "PASS" } else { "FAIL" };
        lines.push(format!(
            "  {icon} {}: {}/{} tests",
            s.task, s.tests_passed, s.tests_total
        ));
    }
    lines.join("\n")
}

/// Number of distinct agents among `scores`.
pub fn distinct_agents(scores: &[TaskScore]) -> usize {
    scores.iter().map(|s| s.agent.as_str()).collect::<BTreeSet<_>>().len()
}

fn header_row(label: &str, width: usize, agents: &[&String]) -> String {
    let mut row = format!("{label:<width$}");
    for agent in agents {
        row.push_str(&format!(" {:<w$}", agent, w = AGENT_COL));
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::correctness;

    fn score(agent: &str, task: &str, passed: u64, total: u64, timed_out: bool) -> TaskScore {
        TaskScore {
            task: task.to_string(),
            agent: agent.to_string(),
            model: None,
            tests_passed: passed,
            tests_total: total,
            correctness: correctness(passed, total),
            wall_clock_seconds: 42.4,
            input_tokens: 0,
            output_tokens: 0,
            timed_out,
            error: None,
        }
    }

    #[test]
    fn test_report_contains_cells() {
        let scores = vec![
            score("claude-code", "01-python", 3, 3, false),
            score("codex", "01-python", 1, 3, false),
            score("codex", "02-c", 0, 4, true),
        ];
        let report = format_report(&scores);

        assert!(report.contains("BENCHMARK RESULTS"));
        assert!(report.contains("PASS 3/3 42s"));
        assert!(report.contains("FAIL 1/3 42s"));
        assert!(report.contains("TIMEOUT"));
        assert!(report.contains("N/A"));
        assert!(report.contains("Tasks fully passed"));

        let header = report
            .lines()
            .find(|l| l.starts_with("Task "))
            .unwrap();
        assert!(header.find("claude-code").unwrap() < header.find("codex").unwrap());
    }

    #[test]
    fn test_report_zero_tests_is_fail() {
        let scores = vec![score("a", "t", 0, 0, false), score("b", "t", 1, 1, false)];
        let report = format_report(&scores);
        assert!(report.contains("FAIL 0/0"));
    }

    #[test]
    fn test_single_agent_listing() {
        let scores = vec![score("a", "t1", 2, 2, false), score("a", "t2", 0, 0, false)];
        let listing = format_single_agent(&scores, "DRY RUN RESULTS");
        assert!(listing.contains("DRY RUN RESULTS"));
        assert!(listing.contains("PASS t1: 2/2 tests"));
        assert!(listing.contains("FAIL t2: 0/0 tests"));
    }

    #[test]
    fn test_distinct_agents() {
        let scores = vec![
            score("a", "t1", 0, 0, false),
            score("a", "t2", 0, 0, false),
            score("b", "t1", 0, 0, false),
        ];
        assert_eq!(distinct_agents(&scores), 2);
        assert_eq!(distinct_agents(&[]), 0);
    }
}
