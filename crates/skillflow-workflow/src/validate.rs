use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::workflow::Workflow;

/// Threshold above which a size warning is attached to the report.
const LARGE_WORKFLOW_STEPS: usize = 10;

/// A single structural problem found during validation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
  #[error("duplicate step id '{step_id}'")]
  DuplicateStepId { step_id: String },

  #[error("step '{step_id}' has no skill name")]
  EmptySkill { step_id: String },

  #[error("step '{step_id}' depends on unknown step '{dependency}'")]
  UnknownDependency { step_id: String, dependency: String },

  #[error("step '{step_id}' has a non-positive timeout")]
  InvalidTimeout { step_id: String },

  #[error("step '{step_id}' has retry with zero attempts")]
  InvalidRetry { step_id: String },

  #[error("step '{step_id}' is part of a circular dependency")]
  CircularDependency { step_id: String },
}

/// Outcome of validating a workflow.
///
/// Errors are collected without short-circuiting; warnings never affect
/// validity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
  pub errors: Vec<ValidationIssue>,
  pub warnings: Vec<String>,
}

impl ValidationReport {
  pub fn is_valid(&self) -> bool {
    self.errors.is_empty()
  }
}

impl Workflow {
  /// Statically verify the workflow, collecting every structural problem.
  pub fn validate(&self) -> ValidationReport {
    let mut report = ValidationReport::default();

    let mut seen: HashSet<&str> = HashSet::new();
    for step in &self.steps {
      if !seen.insert(step.id.as_str()) {
        report.errors.push(ValidationIssue::DuplicateStepId {
          step_id: step.id.clone(),
        });
      }
      if step.skill.is_empty() {
        report.errors.push(ValidationIssue::EmptySkill {
          step_id: step.id.clone(),
        });
      }
      if step.timeout_ms == Some(0) {
        report.errors.push(ValidationIssue::InvalidTimeout {
          step_id: step.id.clone(),
        });
      }
      if let Some(retry) = &step.retry {
        if retry.max_attempts == 0 {
          report.errors.push(ValidationIssue::InvalidRetry {
            step_id: step.id.clone(),
          });
        }
      }
    }

    let ids: HashSet<&str> = self.steps.iter().map(|s| s.id.as_str()).collect();
    for step in &self.steps {
      for dep in &step.depends_on {
        if !ids.contains(dep.as_str()) {
          report.errors.push(ValidationIssue::UnknownDependency {
            step_id: step.id.clone(),
            dependency: dep.clone(),
          });
        }
      }
    }

    if let Some(step_id) = self.find_cycle() {
      report
        .errors
        .push(ValidationIssue::CircularDependency { step_id });
    }

    if self.steps.len() > LARGE_WORKFLOW_STEPS {
      report.warnings.push(format!(
        "workflow has {} steps; consider splitting it",
        self.steps.len()
      ));
    }

    report
  }

  /// Detect a circular dependency via depth-first search.
  ///
  /// Returns the first step found while it is still on the recursion stack.
  fn find_cycle(&self) -> Option<String> {
    let deps: HashMap<&str, Vec<&str>> = self
      .steps
      .iter()
      .map(|s| {
        (
          s.id.as_str(),
          s.depends_on
            .iter()
            .map(|d| d.as_str())
            .filter(|d| self.get_step(d).is_some())
            .collect(),
        )
      })
      .collect();

    let mut visited: HashSet<&str> = HashSet::new();
    let mut on_stack: HashSet<&str> = HashSet::new();

    fn dfs<'a>(
      node: &'a str,
      deps: &HashMap<&'a str, Vec<&'a str>>,
      visited: &mut HashSet<&'a str>,
      on_stack: &mut HashSet<&'a str>,
    ) -> Option<String> {
      visited.insert(node);
      on_stack.insert(node);

      if let Some(neighbors) = deps.get(node) {
        for &dep in neighbors {
          if on_stack.contains(dep) {
            // Revisited while still on the stack: in-cycle.
            return Some(dep.to_string());
          }
          if !visited.contains(dep) {
            if let Some(hit) = dfs(dep, deps, visited, on_stack) {
              return Some(hit);
            }
          }
        }
      }

      on_stack.remove(node);
      None
    }

    for step in &self.steps {
      if !visited.contains(step.id.as_str()) {
        if let Some(hit) = dfs(step.id.as_str(), &deps, &mut visited, &mut on_stack) {
          return Some(hit);
        }
      }
    }

    None
  }
}
