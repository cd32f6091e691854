use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::step::StepDef;

/// A raw workflow definition as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub version: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default)]
  pub steps: Vec<StepDef>,
}

impl WorkflowDef {
  /// Parse a workflow definition from its JSON text form.
  pub fn parse(raw: &str) -> Result<Self, ConfigError> {
    let value: serde_json::Value =
      serde_json::from_str(raw).map_err(|e| ConfigError::Malformed {
        message: e.to_string(),
      })?;
    Self::from_value(value)
  }

  /// Parse a workflow definition from an already-decoded JSON value.
  ///
  /// Required fields are `name`, `version` and a non-empty `steps` array;
  /// each step must carry a non-empty `skill` name. Step ids are synthesized
  /// as `step_<index>` when absent.
  pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
    let mut def: WorkflowDef =
      serde_json::from_value(value).map_err(|e| ConfigError::Malformed {
        message: e.to_string(),
      })?;

    if def.name.is_empty() {
      return Err(ConfigError::MissingField { field: "name" });
    }
    if def.version.is_empty() {
      return Err(ConfigError::MissingField { field: "version" });
    }
    if def.steps.is_empty() {
      return Err(ConfigError::EmptySteps);
    }

    for (index, step) in def.steps.iter_mut().enumerate() {
      if step.skill.is_empty() {
        return Err(ConfigError::MissingSkill { index });
      }
      if step.id.is_none() {
        step.id = Some(format!("step_{}", index));
      }
      if step.input.is_null() {
        step.input = serde_json::Value::Object(serde_json::Map::new());
      }
    }

    Ok(def)
  }
}
