//! OAuth 2.1 authorization server proxying to Google OAuth.
//!
//! ## Supported Standards
//! - RFC 9728: OAuth Protected Resource Metadata
//! - RFC 8414: OAuth Authorization Server Metadata
//! - RFC 7591: Dynamic Client Registration
//! - RFC 7636: PKCE (S256)
//! - RFC 6749: Authorization Code + Refresh Token Grants
//!
//! The server keeps its authorization state (registered clients, in-flight
//! states, minted codes) in process memory only; a restart invalidates
//! in-flight flows but leaves already-issued Google tokens working.

pub mod credentials;
pub mod handlers;
pub mod pkce;
pub mod store;
pub mod types;
pub mod upstream;

use std::sync::Arc;

use crate::auth::RequestAuth;
use crate::config::Endpoints;

pub use credentials::{CredentialsError, UpstreamCredentials, load_credentials};
pub use store::OAuthStore;
pub use upstream::UpstreamOAuth;

/// The authorization server: ephemeral state store plus the immutable Google
/// OAuth client config.
#[derive(Debug)]
pub struct OAuth2Server {
    base_url: String,
    upstream: Arc<UpstreamOAuth>,
    store: OAuthStore,
}

impl OAuth2Server {
    /// Create the authorization server and start its TTL sweeper.
    #[must_use]
    pub fn new(
        base_url: &str,
        creds: UpstreamCredentials,
        endpoints: &Endpoints,
        http: reqwest::Client,
    ) -> Self {
        let store = OAuthStore::new();
        store.start_sweeper();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            upstream: Arc::new(UpstreamOAuth::new(creds, endpoints, http)),
            store,
        }
    }

    /// The externally visible base URL (no trailing slash).
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The redirect URI registered with Google for this server.
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!("{}/oauth/callback", self.base_url)
    }

    /// The Google OAuth client.
    #[must_use]
    pub fn upstream(&self) -> &Arc<UpstreamOAuth> {
        &self.upstream
    }

    /// The ephemeral state store.
    #[must_use]
    pub fn store(&self) -> &OAuthStore {
        &self.store
    }

    /// Validate a bearer token presented on the RPC endpoint.
    ///
    /// Liveness is deliberately not verified against Google: an expired
    /// access token surfaces as a Drive API failure when a tool uses it,
    /// not as a pre-auth rejection.
    pub fn validate(&self, access_token: &str) -> Result<RequestAuth, InvalidToken> {
        if access_token.is_empty() {
            return Err(InvalidToken);
        }
        Ok(RequestAuth {
            upstream: Arc::clone(&self.upstream),
            access_token: access_token.to_string(),
        })
    }
}

/// Bearer validation failure.
#[derive(thiserror::Error, Debug)]
#[error("empty access token")]
pub struct InvalidToken;

#[cfg(test)]
mod tests {
    use super::*;

    fn test_server() -> OAuth2Server {
        OAuth2Server::new(
            "https://drive.mcp.example.com/",
            UpstreamCredentials {
                client_id: "google-client-id".into(),
                client_secret: "google-client-secret".into(),
            },
            &Endpoints::default(),
            reqwest::Client::new(),
        )
    }

    #[tokio::test]
    async fn test_base_url_trimmed_and_callback_derived() {
        let server = test_server();
        assert_eq!(server.base_url(), "https://drive.mcp.example.com");
        assert_eq!(server.callback_url(), "https://drive.mcp.example.com/oauth/callback");
    }

    #[tokio::test]
    async fn test_validate_rejects_empty_bearer() {
        let server = test_server();
        assert!(server.validate("").is_err());
    }

    #[tokio::test]
    async fn test_validate_passes_token_through() {
        let server = test_server();
        let auth = server.validate("ya29.some-google-token").unwrap();
        assert_eq!(auth.access_token, "ya29.some-google-token");
    }
}
