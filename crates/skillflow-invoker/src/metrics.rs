//! Per-skill execution metrics.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

/// Counters for one skill, mutated after every attempt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillMetrics {
  pub total_executions: u64,
  pub successful_executions: u64,
  pub failed_executions: u64,
  pub cache_hits: u64,
  pub min_duration_ms: Option<f64>,
  pub max_duration_ms: Option<f64>,
  pub avg_duration_ms: f64,
  pub last_executed_at: Option<SystemTime>,
}

/// Thread-safe registry of per-skill metrics.
#[derive(Default)]
pub struct MetricsRegistry {
  inner: Mutex<HashMap<String, SkillMetrics>>,
}

impl MetricsRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record a successful attempt with its duration.
  pub fn record_success(&self, skill: &str, duration: Duration) {
    let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
    let metrics = inner.entry(skill.to_string()).or_default();
    let ms = duration.as_secs_f64() * 1000.0;

    metrics.total_executions += 1;
    metrics.successful_executions += 1;
    metrics.min_duration_ms = Some(metrics.min_duration_ms.map_or(ms, |m| m.min(ms)));
    metrics.max_duration_ms = Some(metrics.max_duration_ms.map_or(ms, |m| m.max(ms)));
    // Running average over successful executions only.
    let n = metrics.successful_executions as f64;
    metrics.avg_duration_ms = (metrics.avg_duration_ms * (n - 1.0) + ms) / n;
    metrics.last_executed_at = Some(SystemTime::now());
  }

  /// Record a failed attempt.
  pub fn record_failure(&self, skill: &str) {
    let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
    let metrics = inner.entry(skill.to_string()).or_default();
    metrics.total_executions += 1;
    metrics.failed_executions += 1;
  }

  /// Record a cache hit (the skill itself was not invoked).
  pub fn record_cache_hit(&self, skill: &str) {
    let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
    inner.entry(skill.to_string()).or_default().cache_hits += 1;
  }

  /// Metrics for one skill, if it has ever been invoked.
  pub fn for_skill(&self, skill: &str) -> Option<SkillMetrics> {
    let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
    inner.get(skill).cloned()
  }

  /// A copy of every skill's metrics.
  pub fn snapshot(&self) -> HashMap<String, SkillMetrics> {
    let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
    inner.clone()
  }
}
