use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffKind {
  Linear,
  Exponential,
}

impl Default for BackoffKind {
  fn default() -> Self {
    Self::Exponential
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnFailure {
  Stop,
  Continue,
}

impl Default for OnFailure {
  fn default() -> Self {
    Self::Stop
  }
}
