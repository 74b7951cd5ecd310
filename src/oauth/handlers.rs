//! OAuth 2.1 endpoint handlers.
//!
//! Implements:
//! - RFC 9728: OAuth Protected Resource Metadata
//! - RFC 8414: OAuth Authorization Server Metadata
//! - RFC 7591: Dynamic Client Registration
//! - RFC 7636: PKCE (S256)
//! - RFC 6749: Authorization Code Grant, proxied to Google OAuth
//!
//! This server mints its own short-lived authorization codes; the access and
//! refresh tokens handed to clients are Google's.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use crate::server::transport::HttpState;

use super::pkce;
use super::types::{AuthCode, AuthState, UpstreamToken};
use super::upstream::url_encode;

// ─── RFC 9728: Protected Resource Metadata ───────────────────────────────────

/// `GET /.well-known/oauth-protected-resource`
pub async fn protected_resource(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let base_url = state.oauth.base_url();
    Json(serde_json::json!({
        "resource": base_url,
        "authorization_servers": [base_url],
        "bearer_methods_supported": ["header"]
    }))
}

// ─── RFC 8414: Authorization Server Metadata ─────────────────────────────────

/// `GET /.well-known/oauth-authorization-server`
pub async fn authorization_server_metadata(
    State(state): State<Arc<HttpState>>,
) -> impl IntoResponse {
    let base_url = state.oauth.base_url();
    Json(serde_json::json!({
        "issuer": base_url,
        "authorization_endpoint": format!("{base_url}/oauth/authorize"),
        "token_endpoint": format!("{base_url}/oauth/token"),
        "registration_endpoint": format!("{base_url}/oauth/register"),
        "response_types_supported": ["code"],
        "grant_types_supported": ["authorization_code", "refresh_token"],
        "code_challenge_methods_supported": ["S256"],
        "token_endpoint_auth_methods_supported": ["client_secret_post"]
    }))
}

// ─── RFC 7591: Dynamic Client Registration ───────────────────────────────────

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    #[serde(default)]
    redirect_uris: Vec<String>,
}

/// `POST /oauth/register`
///
/// The body is parsed by hand so malformed JSON yields an RFC-shaped
/// `invalid_request` instead of the extractor's plain-text rejection.
pub async fn register(State(state): State<Arc<HttpState>>, body: String) -> Response {
    let Ok(req) = serde_json::from_str::<RegisterRequest>(&body) else {
        return oauth_error(StatusCode::BAD_REQUEST, "invalid_request", "Invalid JSON body");
    };

    let client = state.oauth.store().register_client(req.redirect_uris).await;

    tracing::info!(client_id = %client.client_id, "registered OAuth client");

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "client_id": client.client_id,
            "client_secret": client.client_secret,
            "redirect_uris": client.redirect_uris
        })),
    )
        .into_response()
}

// ─── Authorization Endpoint ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    client_id: Option<String>,
    redirect_uri: Option<String>,
    code_challenge: Option<String>,
    code_challenge_method: Option<String>,
    state: Option<String>,
}

/// `GET /oauth/authorize`
///
/// Records the attempt under a fresh internal state token and redirects the
/// user agent to Google's consent screen. Unknown clients are auto-registered
/// with the redirect URI they supplied.
pub async fn authorize(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<AuthorizeQuery>,
) -> Response {
    let (Some(client_id), Some(redirect_uri)) = (query.client_id, query.redirect_uri) else {
        return oauth_error(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            "client_id and redirect_uri are required",
        );
    };

    let store = state.oauth.store();
    if store.get_client(&client_id).await.is_none() {
        store.register_client_with_id(client_id.clone(), vec![redirect_uri.clone()]).await;
        tracing::info!(client_id = %client_id, "auto-registered client");
    }

    let internal_state = store
        .insert_state(AuthState {
            client_id: client_id.clone(),
            redirect_uri,
            code_challenge: query.code_challenge.unwrap_or_default(),
            code_challenge_method: query.code_challenge_method.unwrap_or_default(),
            client_state: query.state.unwrap_or_default(),
            created_at: Instant::now(),
        })
        .await;

    let auth_url =
        state.oauth.upstream().authorize_url(&state.oauth.callback_url(), &internal_state);

    tracing::info!(client_id = %client_id, "redirecting to Google OAuth");
    found(auth_url)
}

// ─── Callback Endpoint ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// `GET /oauth/callback`
///
/// Handles the Google redirect: consumes the internal state, exchanges the
/// Google code for tokens, mints our own authorization code and sends the
/// user agent back to the client's redirect URI.
pub async fn callback(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
) -> Response {
    if let Some(err) = query.error {
        tracing::error!(error = %err, "OAuth callback error from Google");
        return oauth_error(StatusCode::BAD_REQUEST, &err, "Authorization denied by user");
    }

    let (Some(code), Some(internal_state)) = (query.code, query.state) else {
        return oauth_error(StatusCode::BAD_REQUEST, "invalid_request", "Missing code or state");
    };

    let Some(stored) = state.oauth.store().consume_state(&internal_state).await else {
        return oauth_error(StatusCode::BAD_REQUEST, "invalid_request", "Invalid or expired state");
    };

    let token =
        match state.oauth.upstream().exchange_code(&code, &state.oauth.callback_url()).await {
            Ok(token) => token,
            Err(err) => {
                tracing::error!(error = %err, "failed to exchange code with Google");
                return oauth_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "server_error",
                    "Failed to exchange authorization code",
                );
            }
        };

    if token.refresh_token.is_none() {
        tracing::warn!("no refresh token received from Google");
    }

    let our_code = state
        .oauth
        .store()
        .insert_code(AuthCode {
            client_id: stored.client_id.clone(),
            redirect_uri: stored.redirect_uri.clone(),
            code_challenge: stored.code_challenge,
            code_challenge_method: stored.code_challenge_method,
            upstream_token: token,
            created_at: Instant::now(),
        })
        .await;

    let mut redirect_url = stored.redirect_uri;
    redirect_url.push(if redirect_url.contains('?') { '&' } else { '?' });
    redirect_url.push_str("code=");
    redirect_url.push_str(&our_code);
    if !stored.client_state.is_empty() {
        redirect_url.push_str("&state=");
        redirect_url.push_str(&url_encode(&stored.client_state));
    }

    tracing::info!(client_id = %stored.client_id, "OAuth callback successful, redirecting to client");

    // Browser flows get a success page that redirects in-document.
    let accepts_html = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/html"));
    if accepts_html {
        return Html(success_page(&redirect_url)).into_response();
    }

    found(redirect_url)
}

/// 302 Found redirect.
fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

fn success_page(redirect_url: &str) -> String {
    // JSON-encode the URL so it embeds safely as a JS string literal.
    let encoded = serde_json::to_string(redirect_url).unwrap_or_else(|_| "\"/\"".to_string());
    format!(
        "<!DOCTYPE html>\n<html><head><title>Authorization Successful</title></head>\n<body>\n\
         <h1>Authorization Successful!</h1>\n\
         <p>You can close this window. Redirecting...</p>\n\
         <script>window.location.href = {encoded};</script>\n\
         </body></html>"
    )
}

// ─── Token Endpoint ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    grant_type: Option<String>,
    code: Option<String>,
    code_verifier: Option<String>,
    refresh_token: Option<String>,
}

/// `POST /oauth/token`
pub async fn token(
    State(state): State<Arc<HttpState>>,
    axum::Form(form): axum::Form<TokenRequest>,
) -> Response {
    match form.grant_type.as_deref().unwrap_or_default() {
        "authorization_code" => authorization_code_grant(&state, &form).await,
        "refresh_token" => refresh_token_grant(&state, &form).await,
        other => oauth_error(
            StatusCode::BAD_REQUEST,
            "unsupported_grant_type",
            &format!("Unsupported grant type: {other}"),
        ),
    }
}

async fn authorization_code_grant(state: &HttpState, form: &TokenRequest) -> Response {
    let Some(ref code) = form.code else {
        return oauth_error(StatusCode::BAD_REQUEST, "invalid_request", "Missing code");
    };

    // Single critical section: two exchanges quoting the same code race for
    // one winner.
    let Some(stored) = state.oauth.store().consume_code(code).await else {
        return oauth_error(
            StatusCode::BAD_REQUEST,
            "invalid_grant",
            "Invalid or expired authorization code",
        );
    };

    if !stored.code_challenge.is_empty() {
        let Some(ref verifier) = form.code_verifier else {
            return oauth_error(StatusCode::BAD_REQUEST, "invalid_grant", "Missing code_verifier");
        };
        if !pkce::verify(verifier, &stored.code_challenge, &stored.code_challenge_method) {
            return oauth_error(StatusCode::BAD_REQUEST, "invalid_grant", "Invalid code_verifier");
        }
    }

    tracing::info!(client_id = %stored.client_id, "token exchange successful");
    token_success(&stored.upstream_token)
}

async fn refresh_token_grant(state: &HttpState, form: &TokenRequest) -> Response {
    let Some(ref refresh_token) = form.refresh_token else {
        return oauth_error(StatusCode::BAD_REQUEST, "invalid_request", "Missing refresh_token");
    };

    let token = match state.oauth.upstream().refresh(refresh_token).await {
        Ok(token) => token,
        Err(err) => {
            tracing::error!(error = %err, "failed to refresh token");
            return oauth_error(StatusCode::BAD_REQUEST, "invalid_grant", "Failed to refresh token");
        }
    };

    tracing::info!("token refresh successful");
    token_success(&token)
}

/// Build a token response with the cache headers RFC 6749 §5.1 requires.
fn token_success(token: &UpstreamToken) -> Response {
    let mut body = serde_json::json!({
        "access_token": token.access_token,
        "token_type": "Bearer"
    });
    if let Some(ref refresh) = token.refresh_token {
        body["refresh_token"] = serde_json::json!(refresh);
    }
    if let Some(expires_in) = token.expires_in() {
        body["expires_in"] = serde_json::json!(expires_in);
    }

    let mut response = Json(body).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    response
}

/// Write a standard OAuth 2.0 error response.
fn oauth_error(status: StatusCode, error: &str, description: &str) -> Response {
    (
        status,
        Json(serde_json::json!({
            "error": error,
            "error_description": description
        })),
    )
        .into_response()
}
