use thiserror::Error;

/// Errors raised while parsing a raw workflow definition.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("workflow definition is not valid JSON: {message}")]
  Malformed { message: String },

  #[error("workflow definition is missing required field '{field}'")]
  MissingField { field: &'static str },

  #[error("workflow definition has no steps")]
  EmptySteps,

  #[error("step at index {index} has no skill name")]
  MissingSkill { index: usize },
}
