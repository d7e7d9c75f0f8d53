//! Response builders for the webhook endpoint.

use serde_json::{Value, json};

/// Returns a response with a JSON body.
#[must_use]
pub fn json_response(status_code: u16, body: &Value) -> Value {
    json!({
        "statusCode": status_code,
        "headers": { "Content-Type": "application/json" },
        "body": body.to_string()
    })
}

/// Returns a response with no body.
#[must_use]
pub fn empty_response(status_code: u16) -> Value {
    json!({
        "statusCode": status_code,
        "headers": { "Content-Type": "application/json" },
        "body": ""
    })
}

#[must_use]
pub fn ok_status() -> Value {
    json_response(200, &json!({ "status": "ok" }))
}

#[must_use]
pub fn ok_challenge(challenge: &str) -> Value {
    json_response(200, &json!({ "challenge": challenge }))
}

/// Returns an error response with the given status code and message.
#[must_use]
pub fn err_response(status_code: u16, message: &str) -> Value {
    json_response(status_code, &json!({ "error": message }))
}

#[must_use]
pub fn unauthorized() -> Value {
    err_response(403, "Unable to authenticate request")
}

#[must_use]
pub fn unprocessable(message: &str) -> Value {
    err_response(422, &format!("Unprocessable entity: {message}"))
}
