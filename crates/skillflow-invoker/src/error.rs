use thiserror::Error;

/// Errors raised while invoking a skill.
#[derive(Debug, Clone, Error)]
pub enum SkillError {
  /// The named skill has no registered implementation. Never retried.
  #[error("skill not found: '{skill}'")]
  NotFound { skill: String },

  /// The skill itself failed. Retried up to the configured attempts.
  #[error("skill '{skill}' failed: {message}")]
  Execution { skill: String, message: String },

  /// The invocation exceeded its timeout. Counts as a failed attempt and is
  /// eligible for retry.
  #[error("skill '{skill}' timed out after {timeout_ms} ms")]
  Timeout { skill: String, timeout_ms: u64 },
}

impl SkillError {
  /// Whether another attempt could change the outcome.
  pub fn is_retryable(&self) -> bool {
    !matches!(self, SkillError::NotFound { .. })
  }
}
