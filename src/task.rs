//! Benchmark task discovery.
//!
//! A task is a directory containing `metadata.json`, `prompt.md`, a starter
//! repository under `repo/` and a hidden test suite under `tests/`:
//!
//! ```text
//! tasks/
//!   01-python-bugfix-csv/
//!     metadata.json   {"language": "python", "category": "bugfix"}
//!     prompt.md
//!     repo/
//!     tests/
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DEFAULT_AGENT_TIMEOUT_SECS;
use crate::error::TaskError;

/// One benchmark task, loaded once per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkTask {
    /// Task name (the directory name); tasks sort by it.
    pub name: String,
    /// Prompt handed to every agent verbatim.
    pub prompt: String,
    /// Primary language.
    pub language: String,
    /// Languages whose runners must all pass. Never empty.
    pub test_languages: Vec<String>,
    /// Free-form category (bugfix, feature, refactor, ...).
    pub category: String,
    /// Declared task timeout.
    pub timeout_seconds: u64,
    /// Pristine starter repository.
    pub repo_dir: PathBuf,
    /// Pristine test suite.
    pub tests_dir: PathBuf,
    /// The task directory itself.
    pub task_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct TaskMetadata {
    language: String,
    category: String,
    #[serde(default)]
    timeout_seconds: Option<u64>,
    #[serde(default)]
    test_languages: Vec<String>,
}

/// Discovers all tasks under `tasks_dir`, sorted by name.
///
/// Directories without both `metadata.json` and `prompt.md` are skipped.
pub fn load_tasks(tasks_dir: &Path) -> Result<Vec<BenchmarkTask>, TaskError> {
    if !tasks_dir.is_dir() {
        return Err(TaskError::NotFound(tasks_dir.to_path_buf()));
    }

    let mut children: Vec<PathBuf> = fs::read_dir(tasks_dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    children.sort();

    let mut tasks = Vec::new();
    for child in children {
        let metadata_path = child.join("metadata.json");
        let prompt_path = child.join("prompt.md");
        if !metadata_path.is_file() || !prompt_path.is_file() {
            debug!(dir = %child.display(), "Skipping directory without metadata.json/prompt.md");
            continue;
        }

        let raw = fs::read_to_string(&metadata_path)?;
        let meta: TaskMetadata =
            serde_json::from_str(&raw).map_err(|source| TaskError::Metadata {
                path: metadata_path.clone(),
                source,
            })?;

        let name = child
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let test_languages = if meta.test_languages.is_empty() {
            vec![meta.language.clone()]
        } else {
            meta.test_languages
        };

        tasks.push(BenchmarkTask {
            name,
            prompt: fs::read_to_string(&prompt_path)?,
            language: meta.language,
            test_languages,
            category: meta.category,
            timeout_seconds: meta.timeout_seconds.unwrap_or(DEFAULT_AGENT_TIMEOUT_SECS),
            repo_dir: child.join("repo"),
            tests_dir: child.join("tests"),
            task_dir: child,
        });
    }

    debug!(count = tasks.len(), dir = %tasks_dir.display(), "Discovered tasks");
    Ok(tasks)
}
