//! Skillflow Template
//!
//! Dotted-path template substitution for step inputs. Strings are scanned
//! for `{{ path.to.value }}` tokens and each resolvable token is replaced
//! with the value found at that path in the execution context. This is
//! deliberately not a general template language: no filters, no
//! expressions, only path lookup.
//!
//! Substitution never fails. A token whose path does not resolve (missing
//! key, non-integer array index, index out of range) is left untouched in
//! the output, so partially-resolvable inputs degrade visibly instead of
//! silently dropping data.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

fn token_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"\{\{\s*([^{}\s]+)\s*\}\}").expect("token pattern is valid"))
}

/// Substitute template tokens in `value` against `context`, recursively.
///
/// Arrays and objects are substituted element-/field-wise, preserving
/// structure. Non-string leaves pass through unchanged.
pub fn substitute(value: &Value, context: &Value) -> Value {
  match value {
    Value::String(s) => Value::String(substitute_str(s, context)),
    Value::Array(items) => Value::Array(items.iter().map(|v| substitute(v, context)).collect()),
    Value::Object(fields) => Value::Object(
      fields
        .iter()
        .map(|(k, v)| (k.clone(), substitute(v, context)))
        .collect(),
    ),
    other => other.clone(),
  }
}

/// Substitute every resolvable token in a single string.
pub fn substitute_str(input: &str, context: &Value) -> String {
  let re = token_re();
  let mut out = String::with_capacity(input.len());
  let mut last = 0;

  for caps in re.captures_iter(input) {
    let full = caps.get(0).expect("match group 0 always present");
    let path = caps.get(1).expect("token pattern has one capture").as_str();
    out.push_str(&input[last..full.start()]);
    match resolve_path(context, path) {
      Some(value) => out.push_str(&render(value)),
      // Unresolvable: keep the original token text.
      None => out.push_str(full.as_str()),
    }
    last = full.end();
  }
  out.push_str(&input[last..]);
  out
}

/// Walk a dotted path against a context value.
///
/// Objects are indexed by key, arrays by parsed integer index.
pub fn resolve_path<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
  let mut current = context;
  for segment in path.split('.') {
    current = match current {
      Value::Object(map) => map.get(segment)?,
      Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
      _ => return None,
    };
  }
  Some(current)
}

/// Textual form of a resolved value.
///
/// Scalars are stringified (strings without quotes); compound values are
/// serialized to their canonical JSON form.
fn render(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}
