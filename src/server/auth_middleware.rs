//! Bearer authentication for the MCP endpoint.
//!
//! Emits RFC 6750 challenges with a pointer at the protected-resource
//! metadata, and injects the validated request credentials into the request
//! extensions. The health and OAuth endpoints are mounted outside this
//! middleware.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::transport::HttpState;

/// Gate a request on a valid bearer token.
pub async fn require_bearer(
    State(state): State<Arc<HttpState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let Some(access_token) = auth_header.strip_prefix("Bearer ") else {
        return challenge(state.oauth.base_url(), None, "Authentication required");
    };

    match state.oauth.validate(access_token) {
        Ok(auth) => {
            request.extensions_mut().insert(auth);
            next.run(request).await
        }
        Err(err) => {
            tracing::warn!(error = %err, "invalid access token");
            challenge(state.oauth.base_url(), Some("invalid_token"), "Invalid token")
        }
    }
}

/// 401 with a `WWW-Authenticate` challenge per RFC 6750.
fn challenge(base_url: &str, error: Option<&str>, body: &'static str) -> Response {
    let resource_metadata = format!("{base_url}/.well-known/oauth-protected-resource");
    let value = match error {
        Some(code) => {
            format!("Bearer error=\"{code}\", resource_metadata=\"{resource_metadata}\"")
        }
        None => format!("Bearer resource_metadata=\"{resource_metadata}\""),
    };

    (StatusCode::UNAUTHORIZED, [(header::WWW_AUTHENTICATE, value)], body).into_response()
}
