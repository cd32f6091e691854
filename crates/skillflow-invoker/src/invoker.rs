use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SkillError;

/// The external skill-invocation contract.
///
/// Implementations resolve the named skill and run it against the given
/// input. The engine has no knowledge of how a skill is implemented; it
/// only needs this single call to succeed or fail.
#[async_trait]
pub trait SkillInvoker: Send + Sync {
  async fn invoke(&self, skill: &str, input: &Value) -> Result<Value, SkillError>;
}

/// Handler function for an in-process skill.
pub type SkillHandler = Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;

/// A minimal in-process invoker backed by a map of handler functions.
///
/// Used by the CLI and tests as a stand-in for an out-of-process skill host.
#[derive(Default)]
pub struct RegistryInvoker {
  handlers: HashMap<String, SkillHandler>,
}

impl RegistryInvoker {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a handler under a skill name. Replaces any existing handler.
  pub fn register<F>(&mut self, skill: impl Into<String>, handler: F)
  where
    F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
  {
    self.handlers.insert(skill.into(), Arc::new(handler));
  }

  /// An invoker with a single `echo` skill that returns its input.
  pub fn with_echo() -> Self {
    let mut registry = Self::new();
    registry.register("echo", |input: &Value| Ok(input.clone()));
    registry
  }
}

#[async_trait]
impl SkillInvoker for RegistryInvoker {
  async fn invoke(&self, skill: &str, input: &Value) -> Result<Value, SkillError> {
    let handler = self
      .handlers
      .get(skill)
      .ok_or_else(|| SkillError::NotFound {
        skill: skill.to_string(),
      })?;

    handler(input).map_err(|message| SkillError::Execution {
      skill: skill.to_string(),
      message,
    })
  }
}
