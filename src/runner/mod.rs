//! Task execution pipeline for one (task, agent) pair.
//!
//! # Architecture
//!
//! ```text
//! repo/ → Workspace → Agent → Workspace + tests/ → Test runners → TestResult
//! ```
//!
//! 1. [`WorkspaceManager`] copies the starter repository into a fresh directory
//! 2. An [`AgentAdapter`] runs the agent there under its timeout
//! 3. The hidden test suite is overlaid into the workspace
//! 4. [`run_task_tests`] runs one test runner per required language and
//!    folds the results into a single verdict
//! 5. The workspace is removed
//!
//! # Example
//!
//! ```ignore
//! use agent_bench::runner::{AgentAdapter, CommandAdapter, WorkspaceManager, run_task_tests};
//!
//! let mut workspaces = WorkspaceManager::new(&agent.name);
//! let workspace = workspaces.prepare(&task.repo_dir)?;
//! let agent_result = CommandAdapter::new(agent).invoke(&task.prompt, &workspace).await;
//! workspaces.overlay_tests(&task.tests_dir, &workspace)?;
//! let test_result = run_task_tests(&task, &workspace, &config.test_runners).await;
//! workspaces.cleanup();
//! ```

pub mod agents;
pub mod executor;
pub mod process;
pub mod usage;
pub mod verifier;
pub mod workspace;

pub use agents::{
    create_adapter, AgentAdapter, AgentKind, AgentResult, CommandAdapter, DryRunAdapter,
};
pub use executor::{TestExecutor, TestResult, TEST_TIMEOUT};
pub use process::{run_with_timeout, ProcessOutput};
pub use usage::{TokenUsage, UsageFormat};
pub use verifier::{run_task_tests, TestAggregator};
pub use workspace::WorkspaceManager;
