//! Errors raised by the remote API layer and their conversion to display messages.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (DNS, TLS, timeout, ...).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The server answered with a non-success status. `body` is the decoded JSON body,
    /// or `Value::Null` when the body was empty or not JSON.
    #[error("server returned HTTP {status}")]
    Status { status: u16, body: Value },
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    pub fn status(status: u16, body: Value) -> Self {
        ApiError::Status { status, body }
    }
}

/// Reduces any API failure to a single human-readable line.
///
/// Structured validation errors (`{"detail": [{"loc": [..], "msg": ".."}]}`) are joined,
/// a plain string `detail` is passed through, and everything else (transport errors,
/// unexpected shapes) yields `fallback`.
pub fn extract_error_message(error: &ApiError, fallback: &str) -> String {
    let ApiError::Status { body, .. } = error else {
        return fallback.to_string();
    };

    match body.get("detail") {
        Some(Value::String(detail)) if !detail.trim().is_empty() => detail.clone(),
        Some(Value::Array(items)) => {
            let messages: Vec<String> = items.iter().filter_map(field_error_message).collect();
            if messages.is_empty() {
                fallback.to_string()
            } else {
                messages.join("; ")
            }
        }
        _ => fallback.to_string(),
    }
}

fn field_error_message(item: &Value) -> Option<String> {
    if let Some(text) = item.as_str() {
        return Some(text.to_string());
    }
    let msg = item.get("msg")?.as_str()?;
    // ["body", "tools", 0] names the field `tools.0`.
    let field = item
        .get("loc")
        .and_then(Value::as_array)
        .map(|loc| {
            loc.iter()
                .filter(|part| part.as_str() != Some("body"))
                .map(|part| match part {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(".")
        })
        .filter(|path| !path.is_empty());

    Some(match field {
        Some(field) => format!("{}: {}", field, msg),
        None => msg.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_detail_passes_through() {
        let err = ApiError::status(404, json!({ "detail": "Scan not found" }));
        assert_eq!(extract_error_message(&err, "Failed to fetch scan"), "Scan not found");
    }

    #[test]
    fn validation_errors_are_joined() {
        let err = ApiError::status(
            422,
            json!({ "detail": [
                { "loc": ["body", "target"], "msg": "field required", "type": "missing" },
                { "loc": ["body", "tools", 0], "msg": "unknown tool" },
                { "msg": "bad request" },
            ]}),
        );
        assert_eq!(
            extract_error_message(&err, "Failed to create scan"),
            "target: field required; tools.0: unknown tool; bad request"
        );
    }

    #[test]
    fn body_only_location_yields_bare_message() {
        let err = ApiError::status(422, json!({ "detail": [{ "loc": ["body"], "msg": "invalid JSON" }] }));
        assert_eq!(extract_error_message(&err, "Failed to create scan"), "invalid JSON");

        let err = ApiError::status(422, json!({ "detail": [{ "loc": ["query", "limit"], "msg": "too large" }] }));
        assert_eq!(extract_error_message(&err, "Failed to fetch users"), "query.limit: too large");
    }

    #[test]
    fn unexpected_shapes_fall_back() {
        let fallback = "Failed to delete scan";
        assert_eq!(extract_error_message(&ApiError::status(500, Value::Null), fallback), fallback);
        assert_eq!(
            extract_error_message(&ApiError::status(500, json!({ "detail": { "code": 1 } })), fallback),
            fallback
        );
        assert_eq!(extract_error_message(&ApiError::status(400, json!({ "detail": [] })), fallback), fallback);
        assert_eq!(extract_error_message(&ApiError::status(400, json!({ "detail": "  " })), fallback), fallback);

        let decode = serde_json::from_str::<Value>("{").unwrap_err();
        assert_eq!(extract_error_message(&ApiError::Decode(decode), fallback), fallback);
    }
}
