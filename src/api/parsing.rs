//! Accessors for API Gateway proxy events.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use crate::errors::SlackError;

/// Case-insensitive header lookup.
pub fn get_header_value<'a>(headers: &'a Value, name: &str) -> Option<&'a str> {
    if let Some(v) = headers.get(name).and_then(|s| s.as_str()) {
        return Some(v);
    }
    headers.as_object().and_then(|map| {
        map.iter().find_map(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                v.as_str()
            } else {
                None
            }
        })
    })
}

/// HTTP method from either payload format (v2 `requestContext.http.method`
/// or v1 `httpMethod`). Defaults to `POST`.
pub fn request_method(event: &Value) -> String {
    event
        .get("requestContext")
        .and_then(|c| c.get("http"))
        .and_then(|h| h.get("method"))
        .and_then(Value::as_str)
        .or_else(|| event.get("httpMethod").and_then(Value::as_str))
        .unwrap_or("POST")
        .to_ascii_uppercase()
}

/// Raw request body bytes, decoding base64 when API Gateway flagged it.
///
/// # Errors
///
/// Returns `ParseError` when the body is not a string or is invalid base64.
pub fn request_body(event: &Value) -> Result<Vec<u8>, SlackError> {
    let body = match event.get("body") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::String(body)) => body,
        Some(_) => return Err(SlackError::ParseError("Invalid body format".to_string())),
    };

    let encoded = event
        .get("isBase64Encoded")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    if encoded {
        STANDARD
            .decode(body)
            .map_err(|e| SlackError::ParseError(format!("Invalid base64 body: {e}")))
    } else {
        Ok(body.clone().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_header_lookup_ignores_case() {
        let headers = json!({"x-slack-signature": "v0=abc"});
        assert_eq!(get_header_value(&headers, "X-Slack-Signature"), Some("v0=abc"));
        assert_eq!(get_header_value(&headers, "X-Slack-Request-Timestamp"), None);
    }

    #[test]
    fn test_request_method_formats() {
        let v2 = json!({"requestContext": {"http": {"method": "options"}}});
        let v1 = json!({"httpMethod": "GET"});
        assert_eq!(request_method(&v2), "OPTIONS");
        assert_eq!(request_method(&v1), "GET");
        assert_eq!(request_method(&json!({})), "POST");
    }

    #[test]
    fn test_base64_body_is_decoded() {
        let event = json!({"body": STANDARD.encode(b"{\"a\":1}"), "isBase64Encoded": true});
        assert_eq!(request_body(&event).unwrap(), b"{\"a\":1}");

        let bad = json!({"body": "%%%", "isBase64Encoded": true});
        assert!(matches!(request_body(&bad), Err(SlackError::ParseError(_))));
    }
}
