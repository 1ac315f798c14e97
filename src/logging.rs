//! Middleware for logging requests and responses.

use axum::{
    extract::Request,
    http::{HeaderMap, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::Error;

/// Request and response bodies longer than this many bytes are truncated in
/// the `info` logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Request bodies larger than this are rejected before they reach a handler.
pub const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// JSON fields whose values are replaced with asterisks before logging.
const REDACTED_FIELDS: [&str; 1] = ["deviceToken"];

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// Request bodies over [MAX_REQUEST_BODY_BYTES] are rejected with
/// `413 Payload Too Large`.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, MAX_REQUEST_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::debug!("could not read request body: {error}");
            return Error::PayloadTooLarge(MAX_REQUEST_BODY_BYTES).into_response();
        }
    };

    let body_text = String::from_utf8_lossy(&body_bytes);
    let display_text = if is_json(&parts.headers) {
        redact_json_fields(&body_text)
    } else {
        body_text.to_string()
    };
    log_body(
        &format!("Received request: {} {}", parts.method, parts.uri),
        &display_text,
    );

    let request = Request::from_parts(parts, body_bytes.into());
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("could not read response body: {error}");
            return Response::from_parts(parts, axum::body::Body::empty());
        }
    };
    log_body(
        &format!("Sending response: {}", parts.status),
        &String::from_utf8_lossy(&body_bytes),
    );

    Response::from_parts(parts, body_bytes.into())
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

/// Replace the values of [REDACTED_FIELDS] in a JSON object.
///
/// Text that is not a JSON object is returned unchanged.
fn redact_json_fields(body: &str) -> String {
    let Ok(Value::Object(mut object)) = serde_json::from_str::<Value>(body) else {
        return body.to_owned();
    };

    for field in REDACTED_FIELDS {
        if let Some(value) = object.get_mut(field) {
            *value = Value::String("********".to_owned());
        }
    }

    Value::Object(object).to_string()
}

/// The longest prefix of `text` that is at most `limit` bytes and ends on a
/// character boundary.
fn truncate(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }

    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    &text[..end]
}

fn log_body(summary: &str, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "{summary}\nbody: {}...",
            truncate(body, LOG_BODY_LENGTH_LIMIT)
        );
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{summary}\nbody: {body:?}");
    }
}
