use serde::{Deserialize, Serialize};

use crate::enums::{BackoffKind, OnFailure};

/// Retry configuration for a single step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryDef {
  /// Total number of attempts, including the first one.
  pub max_attempts: u32,
  #[serde(default)]
  pub backoff: BackoffKind,
}

/// A single step of a workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDef {
  /// Unique id within the workflow. Synthesized as `step_<index>` when absent.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  /// Name of the skill to invoke.
  #[serde(default)]
  pub skill: String,
  /// Input tree handed to the skill; may contain `{{ path }}` tokens.
  #[serde(default)]
  pub input: serde_json::Value,
  /// Ids of steps whose outputs this step depends on.
  #[serde(default)]
  pub depends_on: Vec<String>,
  /// Per-step timeout in milliseconds. `timeout` is accepted as an alias.
  #[serde(alias = "timeout", skip_serializing_if = "Option::is_none")]
  pub timeout_ms: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub retry: Option<RetryDef>,
  #[serde(default)]
  pub on_failure: OnFailure,
}
