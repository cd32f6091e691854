//! Result caching for skill invocations.
//!
//! Entries are keyed by skill name plus the canonical serialization of the
//! input, so two calls with structurally identical inputs share an entry.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use serde_json::Value;

/// A cached skill result.
#[derive(Debug, Clone)]
struct CacheEntry {
  value: Value,
  created_at: Instant,
}

/// TTL-bounded cache of skill results.
pub struct ResultCache {
  entries: RwLock<HashMap<String, CacheEntry>>,
  ttl: Duration,
}

impl ResultCache {
  pub fn new(ttl: Duration) -> Self {
    Self {
      entries: RwLock::new(HashMap::new()),
      ttl,
    }
  }

  /// Cache key for a `(skill, input)` pair.
  pub fn key(skill: &str, input: &Value) -> String {
    format!("{}:{}", skill, input)
  }

  /// Look up a fresh entry. Expired entries are treated as misses.
  pub fn get(&self, key: &str) -> Option<Value> {
    let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
    let entry = entries.get(key)?;
    if entry.created_at.elapsed() > self.ttl {
      return None;
    }
    Some(entry.value.clone())
  }

  /// Store a result with a fresh timestamp.
  pub fn insert(&self, key: String, value: Value) {
    let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
    entries.insert(
      key,
      CacheEntry {
        value,
        created_at: Instant::now(),
      },
    );
  }

  /// Drop every entry belonging to one skill.
  pub fn clear_skill(&self, skill: &str) {
    let prefix = format!("{}:", skill);
    let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
    entries.retain(|key, _| !key.starts_with(&prefix));
  }

  /// Drop all entries.
  pub fn clear(&self) {
    let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
    entries.clear();
  }

  /// Number of live entries, expired or not.
  pub fn len(&self) -> usize {
    let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
    entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn identical_inputs_share_a_key() {
    assert_eq!(
      ResultCache::key("echo", &json!({ "a": 1 })),
      ResultCache::key("echo", &json!({ "a": 1 }))
    );
    assert_ne!(
      ResultCache::key("echo", &json!({ "a": 1 })),
      ResultCache::key("echo", &json!({ "a": 2 }))
    );
  }

  #[test]
  fn entries_expire_after_ttl() {
    let cache = ResultCache::new(Duration::from_millis(0));
    cache.insert("k".to_string(), json!(1));
    std::thread::sleep(Duration::from_millis(5));
    assert!(cache.get("k").is_none());
  }

  #[test]
  fn clear_skill_only_drops_that_skill() {
    let cache = ResultCache::new(Duration::from_secs(60));
    cache.insert(ResultCache::key("a", &json!(1)), json!(1));
    cache.insert(ResultCache::key("b", &json!(1)), json!(2));
    cache.clear_skill("a");
    assert_eq!(cache.len(), 1);
    assert!(cache.get(&ResultCache::key("a", &json!(1))).is_none());
    assert!(cache.get(&ResultCache::key("b", &json!(1))).is_some());
  }

  #[test]
  fn clear_drops_everything() {
    let cache = ResultCache::new(Duration::from_secs(60));
    cache.insert(ResultCache::key("a", &json!(1)), json!(1));
    cache.clear();
    assert!(cache.is_empty());
  }
}
