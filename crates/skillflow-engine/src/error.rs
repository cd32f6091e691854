use thiserror::Error;

use skillflow_workflow::ValidationIssue;

use crate::result::ExecutionResult;

/// Fatal conditions of a workflow run.
///
/// Anything else (a failing step under `on_failure = continue`, a stopped
/// run) still yields an [`ExecutionResult`] with `success = false`.
#[derive(Debug, Error)]
pub enum ExecutionError {
  /// The workflow failed static validation; nothing was executed.
  #[error("workflow validation failed: {}", format_issues(.issues))]
  Validation { issues: Vec<ValidationIssue> },

  /// The scheduler found no ready steps while work remains and the blockage
  /// is not attributable to a failed dependency.
  #[error("workflow deadlocked with unfinished steps: {remaining:?}")]
  Deadlock { remaining: Vec<String> },

  /// The whole run exceeded its global budget. Carries whatever partial
  /// results had accumulated.
  #[error("workflow '{workflow}' timed out after {timeout_ms} ms")]
  Timeout {
    workflow: String,
    timeout_ms: u64,
    partial: Box<ExecutionResult>,
  },

  /// The run was cancelled from outside.
  #[error("workflow execution cancelled")]
  Cancelled,
}

fn format_issues(issues: &[ValidationIssue]) -> String {
  issues
    .iter()
    .map(|i| i.to_string())
    .collect::<Vec<_>>()
    .join("; ")
}
