//! OAuth 2.1 authorization-server types.

use std::time::{Duration, Instant};

/// A dynamically registered OAuth client.
#[derive(Debug, Clone)]
pub struct RegisteredClient {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uris: Vec<String>,
    pub created_at: Instant,
}

/// An in-flight authorization, keyed by the opaque internal state token
/// embedded in the Google redirect.
#[derive(Debug, Clone)]
pub struct AuthState {
    pub client_id: String,
    pub redirect_uri: String,
    pub code_challenge: String,
    pub code_challenge_method: String,
    pub client_state: String,
    pub created_at: Instant,
}

/// An authorization code minted by this server after a successful Google
/// round trip. Single-use; carries the Google tokens until redeemed.
#[derive(Debug, Clone)]
pub struct AuthCode {
    pub client_id: String,
    pub redirect_uri: String,
    pub code_challenge: String,
    pub code_challenge_method: String,
    pub upstream_token: UpstreamToken,
    pub created_at: Instant,
}

/// Tokens obtained from Google by code exchange or refresh.
#[derive(Debug, Clone)]
pub struct UpstreamToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expiry: Option<Instant>,
}

impl UpstreamToken {
    /// Remaining lifetime in whole seconds, if the expiry is known and in
    /// the future.
    #[must_use]
    pub fn expires_in(&self) -> Option<u64> {
        let remaining = self.expiry?.checked_duration_since(Instant::now())?;
        (remaining > Duration::ZERO).then(|| remaining.as_secs())
    }
}

impl AuthState {
    /// Check if the state has outlived its TTL.
    #[must_use]
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

impl AuthCode {
    /// Check if the code has outlived its TTL.
    #[must_use]
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}
