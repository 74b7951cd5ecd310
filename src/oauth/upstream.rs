//! Google OAuth client used by the proxying authorization server.
//!
//! The config is immutable after construction; the callback redirect URI is
//! passed as a parameter to each call so concurrent requests never mutate
//! shared state.

use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::config::{Endpoints, api};
use crate::error::{ClientError, ClientResult};

use super::credentials::UpstreamCredentials;
use super::types::UpstreamToken;

/// Wire shape of Google's token responses.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Immutable Google OAuth client configuration plus the HTTP client used
/// for token-endpoint calls.
pub struct UpstreamOAuth {
    client_id: String,
    client_secret: String,
    auth_url: String,
    token_url: String,
    http: reqwest::Client,
}

impl UpstreamOAuth {
    #[must_use]
    pub fn new(creds: UpstreamCredentials, endpoints: &Endpoints, http: reqwest::Client) -> Self {
        Self {
            client_id: creds.client_id,
            client_secret: creds.client_secret,
            auth_url: endpoints.auth_url.clone(),
            token_url: endpoints.token_url.clone(),
            http,
        }
    }

    /// Build the Google authorize URL for one authorization attempt.
    ///
    /// Requests offline access with forced consent so a refresh token is
    /// issued even on re-authorization.
    #[must_use]
    pub fn authorize_url(&self, redirect_uri: &str, state: &str) -> String {
        format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}&access_type=offline&prompt=consent",
            self.auth_url,
            url_encode(&self.client_id),
            url_encode(redirect_uri),
            url_encode(&api::SCOPES.join(" ")),
            url_encode(state),
        )
    }

    /// Exchange a Google authorization code for tokens.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> ClientResult<UpstreamToken> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
        ];
        self.token_request(&form).await
    }

    /// Obtain a fresh access token from a refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> ClientResult<UpstreamToken> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
        ];
        self.token_request(&form).await
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> ClientResult<UpstreamToken> {
        let response = self.http.post(&self.token_url).form(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::server(status.as_u16(), body));
        }

        let token: TokenResponse = response.json().await?;
        Ok(UpstreamToken {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expiry: token.expires_in.map(|secs| Instant::now() + Duration::from_secs(secs)),
        })
    }
}

impl std::fmt::Debug for UpstreamOAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never log the client secret.
        f.debug_struct("UpstreamOAuth").field("client_id", &self.client_id).finish()
    }
}

/// Percent-encode a string for use in URL query parameters.
pub(crate) fn url_encode(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            _ => {
                encoded.push_str(&format!("%{byte:02X}"));
            }
        }
    }
    encoded
}
