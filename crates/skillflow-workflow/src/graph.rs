use std::collections::HashMap;

use crate::workflow::WorkflowStep;

/// Dependency graph view over a workflow's steps.
#[derive(Debug, Clone)]
pub struct Graph {
  /// Adjacency list: step_id -> list of downstream step_ids.
  adjacency: HashMap<String, Vec<String>>,
  /// Reverse adjacency: step_id -> list of upstream step_ids.
  reverse_adjacency: HashMap<String, Vec<String>>,
  /// Steps with no dependencies, in declaration order.
  roots: Vec<String>,
}

impl Graph {
  /// Build a graph from a workflow's steps.
  ///
  /// Edges come from `depends_on`: an entry `b depends_on [a]` yields the
  /// edge `a -> b`. Dangling dependency ids are kept as edges so validation
  /// can report them; traversal treats them as never-satisfied.
  pub fn new(steps: &[WorkflowStep]) -> Self {
    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut reverse_adjacency: HashMap<String, Vec<String>> = HashMap::new();

    for step in steps {
      adjacency.entry(step.id.clone()).or_default();
      reverse_adjacency.entry(step.id.clone()).or_default();
    }

    for step in steps {
      for dep in &step.depends_on {
        adjacency
          .entry(dep.clone())
          .or_default()
          .push(step.id.clone());
        reverse_adjacency
          .entry(step.id.clone())
          .or_default()
          .push(dep.clone());
      }
    }

    let roots: Vec<String> = steps
      .iter()
      .filter(|s| s.depends_on.is_empty())
      .map(|s| s.id.clone())
      .collect();

    Self {
      adjacency,
      reverse_adjacency,
      roots,
    }
  }

  /// Steps with no dependencies.
  pub fn roots(&self) -> &[String] {
    &self.roots
  }

  /// Downstream steps for a given step.
  pub fn downstream(&self, step_id: &str) -> &[String] {
    self
      .adjacency
      .get(step_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Upstream steps for a given step.
  pub fn upstream(&self, step_id: &str) -> &[String] {
    self
      .reverse_adjacency
      .get(step_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use skillflow_config::OnFailure;

  fn step(id: &str, depends_on: &[&str]) -> WorkflowStep {
    WorkflowStep {
      id: id.to_string(),
      skill: "echo".to_string(),
      input: json!({}),
      depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
      timeout_ms: None,
      retry: None,
      on_failure: OnFailure::Stop,
    }
  }

  #[test]
  fn builds_adjacency_from_depends_on() {
    let steps = vec![step("a", &[]), step("b", &["a"]), step("c", &["a", "b"])];
    let graph = Graph::new(&steps);

    assert_eq!(graph.roots(), &["a".to_string()]);
    assert_eq!(graph.downstream("a"), &["b".to_string(), "c".to_string()]);
    assert_eq!(graph.upstream("c"), &["a".to_string(), "b".to_string()]);
    assert!(graph.downstream("c").is_empty());
  }

  #[test]
  fn unknown_step_has_no_edges() {
    let graph = Graph::new(&[step("a", &[])]);
    assert!(graph.downstream("ghost").is_empty());
    assert!(graph.upstream("ghost").is_empty());
  }
}
