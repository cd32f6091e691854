//! The skill executor: retry, caching, metrics and timeout around an invoker.

use std::time::Duration;

use serde_json::Value;
use skillflow_config::{BackoffKind, RetryDef};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::cache::ResultCache;
use crate::error::SkillError;
use crate::invoker::SkillInvoker;
use crate::metrics::{MetricsRegistry, SkillMetrics};

/// Tuning knobs for the executor. One instance serves many workflow runs.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
  /// Timeout applied when a call does not declare its own.
  pub default_timeout: Duration,
  /// How long cached results stay fresh.
  pub cache_ttl: Duration,
  /// Delay before the second attempt.
  pub initial_retry_delay: Duration,
  /// Upper bound on any backoff delay.
  pub max_retry_delay: Duration,
  /// Growth factor for exponential backoff.
  pub backoff_multiplier: f64,
}

impl Default for ExecutorConfig {
  fn default() -> Self {
    Self {
      default_timeout: Duration::from_secs(30),
      cache_ttl: Duration::from_secs(300),
      initial_retry_delay: Duration::from_millis(500),
      max_retry_delay: Duration::from_secs(30),
      backoff_multiplier: 2.0,
    }
  }
}

/// Per-call options, derived from a workflow step's configuration.
#[derive(Debug, Clone, Default)]
pub struct InvokeOptions {
  /// Effective timeout; falls back to the executor default when unset.
  pub timeout: Option<Duration>,
  /// Retry policy; a single attempt when unset.
  pub retry: Option<RetryDef>,
}

/// Outcome of a parallel batch invocation.
pub struct ParallelBatch {
  /// One result-or-error per input pair, in input order.
  pub results: Vec<Result<Value, SkillError>>,
  /// Wall-clock duration of the whole batch.
  pub duration: Duration,
}

/// Wraps a [`SkillInvoker`] with metrics, retry/backoff, result caching and
/// timeout enforcement.
///
/// Note on timeouts: when the timer fires, the invocation future is dropped
/// and its result discarded; the underlying work is not force-cancelled.
pub struct SkillExecutor<I: SkillInvoker> {
  invoker: I,
  cache: ResultCache,
  metrics: MetricsRegistry,
  config: ExecutorConfig,
}

impl<I: SkillInvoker> SkillExecutor<I> {
  pub fn new(invoker: I) -> Self {
    Self::with_config(invoker, ExecutorConfig::default())
  }

  pub fn with_config(invoker: I, config: ExecutorConfig) -> Self {
    Self {
      cache: ResultCache::new(config.cache_ttl),
      metrics: MetricsRegistry::new(),
      invoker,
      config,
    }
  }

  /// Invoke a skill with caching, retry and timeout applied.
  pub async fn execute(
    &self,
    skill: &str,
    input: &Value,
    options: &InvokeOptions,
  ) -> Result<Value, SkillError> {
    let key = ResultCache::key(skill, input);
    if let Some(value) = self.cache.get(&key) {
      self.metrics.record_cache_hit(skill);
      debug!(skill = %skill, "cache hit");
      return Ok(value);
    }

    let timeout = options.timeout.unwrap_or(self.config.default_timeout);
    let max_attempts = options.retry.as_ref().map(|r| r.max_attempts).unwrap_or(1).max(1);
    let backoff = options
      .retry
      .as_ref()
      .map(|r| r.backoff)
      .unwrap_or_default();

    let mut last_error = None;
    for attempt in 1..=max_attempts {
      if attempt > 1 {
        let delay = self.backoff_delay(backoff, attempt - 1);
        debug!(skill = %skill, attempt, delay_ms = delay.as_millis() as u64, "retrying after backoff");
        tokio::time::sleep(delay).await;
      }

      let started = Instant::now();
      let outcome = match tokio::time::timeout(timeout, self.invoker.invoke(skill, input)).await {
        Ok(result) => result,
        Err(_) => Err(SkillError::Timeout {
          skill: skill.to_string(),
          timeout_ms: timeout.as_millis() as u64,
        }),
      };

      match outcome {
        Ok(value) => {
          self.metrics.record_success(skill, started.elapsed());
          self.cache.insert(key, value.clone());
          return Ok(value);
        }
        Err(error) => {
          self.metrics.record_failure(skill);
          warn!(skill = %skill, attempt, error = %error, "skill attempt failed");
          if !error.is_retryable() {
            return Err(error);
          }
          last_error = Some(error);
        }
      }
    }

    // All attempts exhausted: surface the last failure, not an aggregate.
    Err(last_error.unwrap_or_else(|| SkillError::Execution {
      skill: skill.to_string(),
      message: "no attempts were made".to_string(),
    }))
  }

  /// Fire a batch of `(skill, input)` pairs together and await them all.
  ///
  /// A failure in one entry never prevents the others from completing or
  /// being reported.
  pub async fn execute_parallel(&self, pairs: &[(String, Value)]) -> ParallelBatch {
    let started = Instant::now();
    let options = InvokeOptions::default();
    let futures = pairs
      .iter()
      .map(|(skill, input)| self.execute(skill, input, &options));
    let results = futures::future::join_all(futures).await;

    ParallelBatch {
      results,
      duration: started.elapsed(),
    }
  }

  /// Delay before attempt `failures + 1`, given `failures` failed attempts.
  fn backoff_delay(&self, backoff: BackoffKind, failures: u32) -> Duration {
    let initial = self.config.initial_retry_delay;
    let delay = match backoff {
      BackoffKind::Exponential => {
        initial.mul_f64(self.config.backoff_multiplier.powi(failures as i32 - 1))
      }
      BackoffKind::Linear => initial * failures,
    };
    delay.min(self.config.max_retry_delay)
  }

  /// Metrics for one skill.
  pub fn metrics(&self, skill: &str) -> Option<SkillMetrics> {
    self.metrics.for_skill(skill)
  }

  /// Metrics for every skill seen so far.
  pub fn metrics_snapshot(&self) -> std::collections::HashMap<String, SkillMetrics> {
    self.metrics.snapshot()
  }

  /// Drop cached results for one skill.
  pub fn clear_cache(&self, skill: &str) {
    self.cache.clear_skill(skill);
  }

  /// Drop every cached result.
  pub fn clear_all_caches(&self) {
    self.cache.clear();
  }

  /// The underlying invoker.
  pub fn invoker(&self) -> &I {
    &self.invoker
  }
}
