//! Recursive redaction of sensitive fields before structured log output.
//!
//! Mirrors `rootsignal_common::safety`'s PII-pattern detection, generalized
//! from scanning free text to redacting known-sensitive keys at any nesting
//! depth inside a JSON log record.

use std::collections::HashSet;
use std::sync::LazyLock;

use serde_json::Value;

const SENTINEL: &str = "[REDACTED]";

static DEFAULT_SENSITIVE_KEYS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "email",
        "phone",
        "password",
        "artistName",
        "requesterEmail",
        "contactHandle",
        "authorization",
    ]
    .into_iter()
    .collect()
});

/// A redaction predicate over configured key names.
#[derive(Debug, Clone)]
pub struct Redactor {
    keys: HashSet<String>,
}

impl Default for Redactor {
    fn default() -> Self {
        Self {
            keys: DEFAULT_SENSITIVE_KEYS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Redactor {
    pub fn with_keys(keys: impl IntoIterator<Item = String>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    fn is_sensitive(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k.eq_ignore_ascii_case(key))
    }

    /// Redact any value at any nesting depth whose key matches the
    /// configured sensitive set. Replaces matched values in place.
    pub fn redact(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (k, v) in map {
                    if self.is_sensitive(k) {
                        out.insert(k.clone(), Value::String(SENTINEL.to_string()));
                    } else {
                        out.insert(k.clone(), self.redact(v));
                    }
                }
                Value::Object(out)
            }
            Value::Array(items) => Value::Array(items.iter().map(|v| self.redact(v)).collect()),
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_top_level_sensitive_key() {
        let r = Redactor::default();
        let redacted = r.redact(&json!({"email": "jane@example.com", "name": "Jane"}));
        assert_eq!(redacted["email"], SENTINEL);
        assert_eq!(redacted["name"], "Jane");
    }

    #[test]
    fn redacts_nested_and_array_values() {
        let r = Redactor::default();
        let input = json!({
            "artist": {"artistName": "Jane Doe", "styles": ["old_school"]},
            "takedowns": [{"requesterEmail": "a@b.com"}, {"reason": "self-request"}],
        });
        let redacted = r.redact(&input);
        assert_eq!(redacted["artist"]["artistName"], SENTINEL);
        assert_eq!(redacted["artist"]["styles"][0], "old_school");
        assert_eq!(redacted["takedowns"][0]["requesterEmail"], SENTINEL);
        assert_eq!(redacted["takedowns"][1]["reason"], "self-request");
    }

    #[test]
    fn never_leaks_original_value() {
        let r = Redactor::default();
        let redacted = r.redact(&json!({"password": "hunter2"}));
        let serialized = redacted.to_string();
        assert!(!serialized.contains("hunter2"));
    }

    #[test]
    fn custom_key_set_is_case_insensitive() {
        let r = Redactor::with_keys(["SSN".to_string()]);
        let redacted = r.redact(&json!({"ssn": "123-45-6789"}));
        assert_eq!(redacted["ssn"], SENTINEL);
    }
}
