use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use skillflow_config::{OnFailure, RetryDef, WorkflowDef};

use crate::graph::Graph;

/// A validated workflow ready for execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
  pub name: String,
  pub version: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub steps: Vec<WorkflowStep>,
}

/// A single step of a validated workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
  pub id: String,
  pub skill: String,
  pub input: serde_json::Value,
  #[serde(default)]
  pub depends_on: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub timeout_ms: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub retry: Option<RetryDef>,
  #[serde(default)]
  pub on_failure: OnFailure,
}

impl WorkflowStep {
  /// Step timeout as a duration, if declared.
  pub fn timeout(&self) -> Option<Duration> {
    self.timeout_ms.map(Duration::from_millis)
  }
}

impl Workflow {
  /// Build a workflow from a parsed definition.
  ///
  /// The definition is assumed to have passed `WorkflowDef::from_value`, so
  /// every step carries an id. Structural validation is a separate pass via
  /// [`Workflow::validate`].
  pub fn from_def(def: WorkflowDef) -> Self {
    let steps = def
      .steps
      .into_iter()
      .enumerate()
      .map(|(index, step)| WorkflowStep {
        id: step.id.unwrap_or_else(|| format!("step_{}", index)),
        skill: step.skill,
        input: step.input,
        depends_on: step.depends_on,
        timeout_ms: step.timeout_ms,
        retry: step.retry,
        on_failure: step.on_failure,
      })
      .collect();

    Self {
      name: def.name,
      version: def.version,
      description: def.description,
      steps,
    }
  }

  /// Build the dependency graph for traversal.
  pub fn graph(&self) -> Graph {
    Graph::new(&self.steps)
  }

  /// Look up a step by id.
  pub fn get_step(&self, step_id: &str) -> Option<&WorkflowStep> {
    self.steps.iter().find(|s| s.id == step_id)
  }

  /// Steps that are ready to run: not yet completed or failed, with every
  /// dependency present in `completed`.
  ///
  /// Dependents of failed steps are not excluded here; the scheduler decides
  /// whether they are skipped or left to deadlock detection.
  pub fn next_steps(
    &self,
    completed: &HashSet<String>,
    failed: &HashSet<String>,
  ) -> Vec<String> {
    self
      .steps
      .iter()
      .filter(|s| !completed.contains(&s.id) && !failed.contains(&s.id))
      .filter(|s| s.depends_on.iter().all(|dep| completed.contains(dep)))
      .map(|s| s.id.clone())
      .collect()
  }
}
