//! XSRF (Cross-Site Request Forgery) protection middleware and utilities.
//!
//! State-changing requests (upload, reset) must echo the per-process token
//! in a header, a form field, or, for multipart uploads, the query string.

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::borrow::Cow;
use std::sync::Arc;
use uuid::Uuid;

/// The header name for XSRF tokens in AJAX requests.
pub const XSRF_HEADER: &str = "X-XSRF-Token";

/// The form field (and query parameter) name for XSRF tokens.
pub const XSRF_FORM_FIELD: &str = "_xsrf_token";

/// XSRF token storage that can be shared across the application.
#[derive(Clone)]
pub struct XsrfToken(Arc<String>);

impl XsrfToken {
    /// Generate a new random XSRF token.
    pub fn generate() -> Self {
        Self(Arc::new(Uuid::new_v4().to_string()))
    }

    /// Get the token value as a string.
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Middleware that validates XSRF tokens on state-changing requests.
pub async fn xsrf_middleware(
    xsrf_token: XsrfToken,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();

    if !matches!(
        method,
        Method::POST | Method::PUT | Method::DELETE | Method::PATCH
    ) {
        return next.run(request).await;
    }

    let header_token = request
        .headers()
        .get(XSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    if let Some(token) = header_token {
        if token == xsrf_token.value() {
            return next.run(request).await;
        }
        return xsrf_error_response();
    }

    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_owned();

    if content_type.starts_with("application/x-www-form-urlencoded") {
        let (parts, body) = request.into_parts();
        let bytes = match axum::body::to_bytes(body, usize::MAX).await {
            Ok(b) => b,
            Err(_) => return xsrf_error_response(),
        };

        let body_str = match std::str::from_utf8(&bytes) {
            Ok(s) => s,
            Err(_) => return xsrf_error_response(),
        };

        if token_in(body_str).as_deref() == Some(xsrf_token.value()) {
            let body = Body::from(bytes);
            return next.run(Request::from_parts(parts, body)).await;
        }

        return xsrf_error_response();
    }

    if content_type.starts_with("multipart/form-data") {
        // Browsers cannot add headers to a plain file form, so the upload
        // form carries the token in its action URL.
        let query_token = request.uri().query().and_then(token_in);
        if query_token.as_deref() == Some(xsrf_token.value()) {
            return next.run(request).await;
        }
    }

    xsrf_error_response()
}

fn token_in(encoded: &str) -> Option<String> {
    form_urlencoded_pairs(encoded)
        .find(|(key, _)| key == XSRF_FORM_FIELD)
        .map(|(_, value)| value.into_owned())
}

fn form_urlencoded_pairs(input: &str) -> impl Iterator<Item = (Cow<'_, str>, Cow<'_, str>)> {
    input.split('&').filter_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        let key = parts.next()?;
        let value = parts.next().unwrap_or("");
        Some((decode(key), decode(value)))
    })
}

fn decode(input: &str) -> Cow<'_, str> {
    let spaced = input.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => Cow::Owned(decoded.into_owned()),
        Err(_) => Cow::Borrowed(input),
    }
}

fn xsrf_error_response() -> Response {
    (StatusCode::FORBIDDEN, "Invalid or missing XSRF token").into_response()
}
