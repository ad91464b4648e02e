//! CLI command definitions for agent-bench.

use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;
use tracing::info;

use crate::config::DEFAULT_CONFIG_PATH;
use crate::orchestrator::{run_benchmark, BenchmarkOptions};
use crate::task::load_tasks;

/// Default directory holding the benchmark tasks.
const DEFAULT_TASKS_DIR: &str = "tasks";

/// Benchmark harness for autonomous coding agents.
#[derive(Parser)]
#[command(name = "agent-bench")]
#[command(about = "Run coding agents against a task suite and compare the results")]
#[command(version)]
#[command(
    long_about = "agent-bench runs each configured coding agent on every task in a fresh copy of the task's starter repository, then scores the result with the task's hidden tests.\n\nExample usage:\n  agent-bench run --tasks-dir ./tasks --config bench.yaml\n  agent-bench run --dry-run"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run every configured agent on every task.
    Run(RunArgs),

    /// List the tasks found in a tasks directory.
    #[command(alias = "ls")]
    List(ListArgs),
}

/// Arguments for `agent-bench run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Directory containing one subdirectory per task.
    #[arg(short = 't', long, default_value = DEFAULT_TASKS_DIR)]
    pub tasks_dir: PathBuf,

    /// Benchmark configuration file.
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Run the tests against the untouched starter repositories only.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the per-agent summary as JSON after the run.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `agent-bench list`.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Directory containing one subdirectory per task.
    #[arg(short = 't', long, default_value = DEFAULT_TASKS_DIR)]
    pub tasks_dir: PathBuf,
}

/// Parse CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parse CLI arguments and run the command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with already-parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => run_run_command(args).await,
        Commands::List(args) => run_list_command(args),
    }
}

async fn run_run_command(args: RunArgs) -> anyhow::Result<()> {
    let options = BenchmarkOptions {
        tasks_dir: args.tasks_dir,
        config_path: args.config,
        dry_run: args.dry_run,
    };
    let outcome = run_benchmark(&options).await?;
    info!(run_id = %outcome.run_id, pairs = outcome.scores.len(), "Benchmark run complete");

    if args.json {
        let json = serde_json::to_string_pretty(&outcome.summary)?;
        println!("{json}");
    }
    Ok(())
}

fn run_list_command(args: ListArgs) -> anyhow::Result<()> {
    let tasks = load_tasks(&args.tasks_dir)?;
    if tasks.is_empty() {
        bail!("No tasks found in {}", args.tasks_dir.display());
    }

    println!("{} tasks in {}", tasks.len(), args.tasks_dir.display());
    for task in &tasks {
        println!(
            "  {:<30} {:<12} tests: {:<24} {}",
            task.name,
            task.language,
            task.test_languages.join(","),
            task.category
        );
    }
    Ok(())
}
