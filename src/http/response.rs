//! Response helpers shared by the responder, the config script and the gateway.
//!
//! # Responsibilities
//! - Attach the no-cache header set to SPA shell and config responses
//! - Build small fixed responses (JSON status payloads, redirects, 405)

use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// `Cache-Control` for responses a browser must never pin.
pub const NO_STORE: &str = "no-store, no-cache, must-revalidate";

/// Set `Cache-Control`, `Pragma` and `Expires` so clients always refetch.
pub fn set_no_cache(headers: &mut HeaderMap) {
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_STORE));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
}

/// Wrap any response with the no-cache header set.
pub fn no_cache(response: impl IntoResponse) -> Response {
    let mut response = response.into_response();
    set_no_cache(response.headers_mut());
    response
}

/// `{"ok": <ok>}` with the given status.
pub fn ok_payload(status: StatusCode, ok: bool) -> Response {
    (status, axum::Json(json!({ "ok": ok }))).into_response()
}

/// Unconditional `302 Found`.
pub fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

/// `405` advertising the methods the static responder serves.
pub fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, HeaderValue::from_static("GET, HEAD"))],
    )
        .into_response()
}
