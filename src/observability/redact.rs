//! Secret redaction for log payloads.
//!
//! Walks a `serde_json::Value` tree and masks the value of every object key
//! whose lowercase form is a known secret name. The input is never mutated;
//! callers always receive a fresh tree.

use serde_json::Value;

/// Replacement written in place of a secret value.
pub const REDACTION_MARKER: &str = "***REDACTED***";

/// Lowercased key names whose values are never shipped.
const SECRET_KEYS: &[&str] = &[
    "password",
    "pwd",
    "token",
    "authorization",
    "auth",
    "apikey",
    "secret",
    "jwt",
    "bearer",
];

/// Whether `key` names a secret. Keys are lowercased with full Unicode
/// case mapping before the lookup.
pub fn is_secret_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    SECRET_KEYS.contains(&lower.as_str())
}

/// Return a redacted deep copy of `value`.
///
/// Scalars come back unchanged.
pub fn sanitize(value: &Value) -> Value {
    let mut clone = value.clone();
    scrub(&mut clone);
    clone
}

fn scrub(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if is_secret_key(key) {
                    *child = Value::String(REDACTION_MARKER.to_string());
                } else {
                    scrub(child);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(scrub),
        _ => {}
    }
}
