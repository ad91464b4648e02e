//! Disposable workspaces for agent runs.
//!
//! Every (task, agent) pair gets its own full copy of the task's starter
//! repository in a fresh temporary directory. After the agent has run, the
//! hidden test suite is overlaid under `tests/`, and once the pair has been
//! scored the manager removes everything it created.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::WorkspaceError;

/// Subdirectory of the workspace the test suite is copied into.
pub const TESTS_SUBDIR: &str = "tests";

/// Creates and tracks workspaces; removes them on [`cleanup`](Self::cleanup)
/// or drop.
#[derive(Debug, Default)]
pub struct WorkspaceManager {
    /// Prefix for the temporary directory names.
    prefix: String,
    /// Workspaces created by this manager and not yet removed.
    created: Vec<PathBuf>,
}

impl WorkspaceManager {
    /// Creates a manager whose workspaces are named `bench-<label>-XXXXXX`.
    pub fn new(label: &str) -> Self {
        let safe: String = label
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        Self {
            prefix: format!("bench-{safe}-"),
            created: Vec::new(),
        }
    }

    /// Copies `repo_dir` into a new unique temporary directory.
    pub fn prepare(&mut self, repo_dir: &Path) -> Result<PathBuf, WorkspaceError> {
        if !repo_dir.is_dir() {
            return Err(WorkspaceError::MissingSource(repo_dir.to_path_buf()));
        }

        let workspace = tempfile::Builder::new()
            .prefix(&self.prefix)
            .tempdir()
            .map_err(WorkspaceError::Create)?
            .keep();
        // Track before copying so a failed copy is still cleaned up.
        self.created.push(workspace.clone());

        copy_dir_recursive(repo_dir, &workspace)?;
        info!(
            workspace = %workspace.display(),
            source = %repo_dir.display(),
            "Prepared workspace"
        );
        Ok(workspace)
    }

    /// Copies `tests_dir` into `<workspace>/tests`, merging with any existing
    /// directory of that name.
    pub fn overlay_tests(&self, tests_dir: &Path, workspace: &Path) -> Result<(), WorkspaceError> {
        if !tests_dir.is_dir() {
            return Err(WorkspaceError::MissingSource(tests_dir.to_path_buf()));
        }
        let dest = workspace.join(TESTS_SUBDIR);
        copy_dir_recursive(tests_dir, &dest)?;
        debug!(dest = %dest.display(), "Overlaid test suite");
        Ok(())
    }

    /// Workspaces currently tracked.
    pub fn workspaces(&self) -> &[PathBuf] {
        &self.created
    }

    /// Removes every workspace this manager created. Never fails.
    pub fn cleanup(&mut self) {
        for dir in self.created.drain(..) {
            match fs::remove_dir_all(&dir) {
                Ok(()) => debug!(workspace = %dir.display(), "Removed workspace"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(workspace = %dir.display(), error = %e, "Failed to remove workspace"),
            }
        }
    }
}

impl Drop for WorkspaceManager {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Recursively copies `src` into `dst`, creating `dst` and overwriting files
/// that already exist there.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<(), WorkspaceError> {
    let copy_err = |from: &Path, to: &Path, source: std::io::Error| WorkspaceError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    fs::create_dir_all(dst).map_err(|e| copy_err(src, dst, e))?;

    for entry in WalkDir::new(src).min_depth(1).follow_links(false) {
        let entry = entry?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|e| copy_err(entry.path(), &target, e))?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target).map_err(|e| copy_err(entry.path(), &target, e))?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| copy_err(entry.path(), &target, e))?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> std::io::Result<()> {
    let link = fs::read_link(src)?;
    if dst.symlink_metadata().is_ok() {
        fs::remove_file(dst)?;
    }
    std::os::unix::fs::symlink(link, dst)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> std::io::Result<()> {
    fs::copy(src, dst).map(|_| ())
}
