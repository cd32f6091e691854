use std::collections::{BTreeSet, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::workflow::Workflow;

/// A derived, non-persistent view of how a workflow would execute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
  /// Topological order of step ids.
  pub order: Vec<String>,
  /// Dependency map: step_id -> its `depends_on` list.
  pub dependencies: HashMap<String, Vec<String>>,
  /// Groups of steps considered safe to dispatch together.
  ///
  /// Steps sharing an identical dependency set are grouped. This
  /// under-approximates true independence (two steps with different but
  /// non-overlapping dependency sets land in different groups); a known
  /// limitation, kept for predictable dispatch behavior.
  pub parallel_groups: Vec<Vec<String>>,
}

impl Workflow {
  /// Topologically sort step ids using Kahn's algorithm.
  ///
  /// In-degree is the size of each step's `depends_on`. For a validated
  /// workflow every step is visited; a residual cycle leaves its steps out
  /// of the returned order, so callers must validate first.
  pub fn execution_order(&self) -> Vec<String> {
    let graph = self.graph();

    let mut in_degree: HashMap<&str, usize> = self
      .steps
      .iter()
      .map(|s| (s.id.as_str(), s.depends_on.len()))
      .collect();

    let mut queue: VecDeque<&str> = self
      .steps
      .iter()
      .filter(|s| s.depends_on.is_empty())
      .map(|s| s.id.as_str())
      .collect();

    let mut order = Vec::with_capacity(self.steps.len());
    while let Some(id) = queue.pop_front() {
      order.push(id.to_string());
      for dependent in graph.downstream(id) {
        if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
          *degree -= 1;
          if *degree == 0 {
            queue.push_back(dependent.as_str());
          }
        }
      }
    }

    order
  }

  /// Compute the dry-run execution plan: order, dependency map and the
  /// parallel-group partition, without executing anything.
  pub fn plan(&self) -> ExecutionPlan {
    let order = self.execution_order();

    let dependencies: HashMap<String, Vec<String>> = self
      .steps
      .iter()
      .map(|s| (s.id.clone(), s.depends_on.clone()))
      .collect();

    // Group steps by identical dependency set, preserving the topological
    // order of each group's first member.
    let mut groups: Vec<(BTreeSet<&str>, Vec<String>)> = Vec::new();
    for id in &order {
      let step = match self.get_step(id) {
        Some(s) => s,
        None => continue,
      };
      let key: BTreeSet<&str> = step.depends_on.iter().map(|d| d.as_str()).collect();
      match groups.iter_mut().find(|(k, _)| *k == key) {
        Some((_, members)) => members.push(id.clone()),
        None => groups.push((key, vec![id.clone()])),
      }
    }

    ExecutionPlan {
      order,
      dependencies,
      parallel_groups: groups.into_iter().map(|(_, members)| members).collect(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::workflow::WorkflowStep;
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

  fn workflow(steps: Vec<WorkflowStep>) -> Workflow {
    Workflow {
      name: "test".to_string(),
      version: "1.0".to_string(),
      description: None,
      steps,
    }
  }

  fn position(order: &[String], id: &str) -> usize {
    order.iter().position(|s| s == id).unwrap()
  }

  #[test]
  fn orders_linear_pipeline() {
    let wf = workflow(vec![
      step("research", &[]),
      step("summarize", &["research"]),
      step("report", &["summarize"]),
    ]);
    assert_eq!(
      wf.execution_order(),
      vec!["research", "summarize", "report"]
    );
  }

  #[test]
  fn every_step_comes_after_its_dependencies() {
    let wf = workflow(vec![
      step("d", &["b", "c"]),
      step("b", &["a"]),
      step("c", &["a"]),
      step("a", &[]),
    ]);
    let order = wf.execution_order();
    assert_eq!(order.len(), 4);
    for s in &wf.steps {
      for dep in &s.depends_on {
        assert!(
          position(&order, dep) < position(&order, &s.id),
          "{} should come before {}",
          dep,
          s.id
        );
      }
    }
  }

  #[test]
  fn residual_cycle_leaves_steps_unvisited() {
    let wf = workflow(vec![step("a", &["b"]), step("b", &["a"]), step("c", &[])]);
    let order = wf.execution_order();
    assert_eq!(order, vec!["c"]);
  }

  #[test]
  fn groups_steps_with_identical_dependency_sets() {
    let wf = workflow(vec![
      step("a", &[]),
      step("b", &["a"]),
      step("c", &["a"]),
      step("d", &["b", "c"]),
    ]);
    let plan = wf.plan();
    assert_eq!(
      plan.parallel_groups,
      vec![
        vec!["a".to_string()],
        vec!["b".to_string(), "c".to_string()],
        vec!["d".to_string()],
      ]
    );
  }

  #[test]
  fn different_dependency_sets_are_not_grouped() {
    // Known under-approximation: x and y are independent but have different
    // dependency sets, so they land in separate groups.
    let wf = workflow(vec![
      step("a", &[]),
      step("b", &[]),
      step("x", &["a"]),
      step("y", &["b"]),
    ]);
    let plan = wf.plan();
    assert_eq!(plan.parallel_groups.len(), 3);
  }

  #[test]
  fn plan_carries_dependency_map() {
    let wf = workflow(vec![step("a", &[]), step("b", &["a"])]);
    let plan = wf.plan();
    assert_eq!(plan.dependencies["b"], vec!["a".to_string()]);
    assert!(plan.dependencies["a"].is_empty());
  }
}
