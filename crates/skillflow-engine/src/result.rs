use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Terminal, immutable artifact of one workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
  /// Unique execution id.
  pub execution_id: String,
  /// True iff no step failed.
  pub success: bool,
  /// Step id -> output, for every completed step.
  pub results: HashMap<String, Value>,
  /// Step id -> error message, for every failed step.
  pub errors: HashMap<String, String>,
  /// Ids of steps that completed, in completion order.
  pub executed_steps: Vec<String>,
  /// Ids of steps that failed.
  pub failed_steps: Vec<String>,
  /// Ids of steps that never ran.
  pub skipped_steps: Vec<String>,
  /// Wall-clock duration of the run.
  pub duration: Duration,
}
