//! Decoding of list responses.
//!
//! Endpoints are inconsistent about wrapping lists: some return a bare array, others an
//! object with the array under a well-known key. Each entity gets exactly one decode
//! function here; a malformed envelope decodes to an empty list and malformed items are
//! skipped.

use crate::core::models::{AdminUser, Scan};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

const SCAN_LIST_KEYS: &[&str] = &["scans"];
const USER_LIST_KEYS: &[&str] = &["users", "data", "items", "results"];

pub fn decode_scan_list(body: Value) -> Vec<Scan> {
    decode_list(body, SCAN_LIST_KEYS)
}

pub fn decode_user_list(body: Value) -> Vec<AdminUser> {
    decode_list(body, USER_LIST_KEYS)
}

fn decode_list<T: DeserializeOwned>(body: Value, keys: &[&str]) -> Vec<T> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            let found = keys.iter().find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            });
            found.unwrap_or_else(|| {
                warn!(keys = ?map.keys().collect::<Vec<_>>(), "List response has no recognised envelope key.");
                Vec::new()
            })
        }
        other => {
            warn!(kind = value_kind(&other), "List response is not an array or object.");
            Vec::new()
        }
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(error = %e, "Skipping malformed list item.");
                None
            }
        })
        .collect()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scan_json() -> Value {
        json!({ "id": 1, "target": "example.com", "status": "running", "tools_used": ["nmap"] })
    }

    #[test]
    fn scan_list_shapes() {
        let bare = decode_scan_list(json!([scan_json()]));
        let wrapped = decode_scan_list(json!({ "scans": [scan_json()] }));
        let unexpected = decode_scan_list(json!({ "unexpected": 1 }));

        assert_eq!(bare.len(), 1);
        assert_eq!(bare, wrapped);
        assert!(unexpected.is_empty());
    }

    #[test]
    fn non_collection_bodies_are_empty() {
        assert!(decode_scan_list(Value::Null).is_empty());
        assert!(decode_scan_list(json!("scans")).is_empty());
        assert!(decode_scan_list(json!({ "scans": "not a list" })).is_empty());
    }

    #[test]
    fn user_envelope_keys_in_priority_order() {
        let alice = json!({ "id": 1, "email": "alice@example.com", "role": "admin" });
        let bob = json!({ "id": 2, "email": "bob@example.com" });

        let users = decode_user_list(json!({ "items": [bob.clone()], "users": [alice.clone()] }));
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email, "alice@example.com");

        // A key holding a non-array does not shadow a later valid key.
        let users = decode_user_list(json!({ "users": null, "results": [alice, bob] }));
        assert_eq!(users.len(), 2);

        assert!(decode_user_list(json!({ "total": 0 })).is_empty());
    }

    #[test]
    fn malformed_items_are_skipped() {
        let scans = decode_scan_list(json!([scan_json(), { "target": "no id" }, 17]));
        assert_eq!(scans.len(), 1);
        assert_eq!(scans[0].id, "1");
    }

    #[test]
    fn null_fields_do_not_drop_the_record() {
        let scans = decode_scan_list(json!({ "scans": [{ "id": 2, "target": null, "tools_used": null }] }));
        assert_eq!(scans.len(), 1);
        assert_eq!(scans[0].id, "2");
    }
}
