//! Event Key Computation
//!
//! Computes a deterministic hash of an event body for redelivery detection.
//! Insensitive to whitespace and object key order, so the same event
//! re-serialized by a different producer still maps to the same key.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Compute the key of an event body
///
/// Formula: SHA256(canonical_json(body))
///
/// # Returns
/// Key as hex string prefixed with "evt_"
pub fn compute_event_key(body: &Value) -> String {
    let mut canonical = String::new();
    write_canonical(body, &mut canonical);

    let hash = Sha256::digest(canonical.as_bytes());
    format!("evt_{}", hex::encode(hash))
}

/// Serialize with object keys sorted at every depth
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (key, value)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // Keys go through the JSON string encoder for escaping
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(value, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_key_deterministic() {
        let body = json!({"device": "d-7", "reading": 21.5});

        let key1 = compute_event_key(&body);
        let key2 = compute_event_key(&body);

        assert_eq!(key1, key2, "Event key should be deterministic");
        assert!(key1.starts_with("evt_"), "Key should have evt_ prefix");
        assert_eq!(key1.len(), 4 + 64);
    }

    #[test]
    fn test_event_key_ignores_key_order_and_whitespace() {
        let a: Value = serde_json::from_str(r#"{"b":1,"a":{"y":2,"x":[1,2]}}"#).unwrap();
        let b: Value = serde_json::from_str("{ \"a\": { \"x\": [1, 2], \"y\": 2 },\n \"b\": 1 }").unwrap();

        assert_eq!(compute_event_key(&a), compute_event_key(&b));
    }

    #[test]
    fn test_event_key_differs_for_different_bodies() {
        let a = json!({"device": "d-7", "reading": 21.5});
        let b = json!({"device": "d-7", "reading": 21.6});

        assert_ne!(compute_event_key(&a), compute_event_key(&b));
    }

    #[test]
    fn test_array_order_is_significant() {
        assert_ne!(compute_event_key(&json!([1, 2])), compute_event_key(&json!([2, 1])));
    }

    #[test]
    fn test_canonical_form() {
        let mut out = String::new();
        write_canonical(&json!({"b": [true, null], "a": "x\"y"}), &mut out);
        assert_eq!(out, r#"{"a":"x\"y","b":[true,null]}"#);
    }
}
