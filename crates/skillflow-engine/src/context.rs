use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The accumulated outputs of completed steps.
///
/// Written only by the scheduler after a step completes; read-only from the
/// template engine's perspective at substitution time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowContext {
  pub steps: HashMap<String, Value>,
}

impl WorkflowContext {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record a completed step's output.
  pub fn insert(&mut self, step_id: impl Into<String>, output: Value) {
    self.steps.insert(step_id.into(), output);
  }

  /// Output of a completed step, if present.
  pub fn get(&self, step_id: &str) -> Option<&Value> {
    self.steps.get(step_id)
  }

  /// The context as a JSON tree, rooted so templates address step outputs
  /// as `{{ steps.<id>.<path> }}`.
  pub fn to_value(&self) -> Value {
    serde_json::json!({ "steps": self.steps })
  }
}
