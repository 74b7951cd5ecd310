//! In-memory OAuth state store.
//!
//! All three ephemeral maps (registered clients, authorization states,
//! authorization codes) live behind a single readers-writer lock so that
//! lookup-and-delete stays one critical section: two concurrent callbacks
//! quoting the same state, or two token exchanges quoting the same code,
//! can never both succeed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::RngCore;
use tokio::sync::RwLock;

use super::types::{AuthCode, AuthState, RegisteredClient};

/// Authorization state lifetime: 10 minutes.
pub const STATE_TTL: Duration = Duration::from_secs(600);
/// Authorization code lifetime: 10 minutes.
pub const CODE_TTL: Duration = Duration::from_secs(600);
/// Sweep interval: 1 minute.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Default)]
struct StoreInner {
    clients: HashMap<String, RegisteredClient>,
    states: HashMap<String, AuthState>,
    codes: HashMap<String, AuthCode>,
}

/// In-memory OAuth state store.
#[derive(Clone, Default)]
pub struct OAuthStore {
    inner: Arc<RwLock<StoreInner>>,
}

/// Generate an opaque 256-bit random token, hex-encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl OAuthStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new client with fresh identifiers (RFC 7591).
    pub async fn register_client(&self, redirect_uris: Vec<String>) -> RegisteredClient {
        self.register_client_with_id(generate_token(), redirect_uris).await
    }

    /// Register a client under a caller-supplied id (auto-registration on
    /// first authorize).
    pub async fn register_client_with_id(
        &self,
        client_id: String,
        redirect_uris: Vec<String>,
    ) -> RegisteredClient {
        let client = RegisteredClient {
            client_id: client_id.clone(),
            client_secret: generate_token(),
            redirect_uris,
            created_at: Instant::now(),
        };
        self.inner.write().await.clients.insert(client_id, client.clone());
        client
    }

    /// Look up a registered client.
    pub async fn get_client(&self, client_id: &str) -> Option<RegisteredClient> {
        self.inner.read().await.clients.get(client_id).cloned()
    }

    /// Store a new authorization state under a fresh internal token.
    /// Returns the token.
    pub async fn insert_state(&self, state: AuthState) -> String {
        let token = generate_token();
        self.inner.write().await.states.insert(token.clone(), state);
        token
    }

    /// Atomically remove and return an authorization state.
    ///
    /// The entry is deleted on first use even when stale; a stale entry
    /// yields `None`.
    pub async fn consume_state(&self, token: &str) -> Option<AuthState> {
        let state = self.inner.write().await.states.remove(token)?;
        (!state.is_expired(STATE_TTL)).then_some(state)
    }

    /// Store a freshly minted authorization code. Returns the code.
    pub async fn insert_code(&self, code: AuthCode) -> String {
        let token = generate_token();
        self.inner.write().await.codes.insert(token.clone(), code);
        token
    }

    /// Atomically remove and return an authorization code (single use).
    pub async fn consume_code(&self, code: &str) -> Option<AuthCode> {
        let stored = self.inner.write().await.codes.remove(code)?;
        (!stored.is_expired(CODE_TTL)).then_some(stored)
    }

    /// Start the background sweeper that drops expired states and codes.
    /// Runs for the lifetime of the process.
    pub fn start_sweeper(&self) {
        let store = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                store.sweep().await;
            }
        });
    }

    async fn sweep(&self) {
        let mut inner = self.inner.write().await;
        let states_before = inner.states.len();
        let codes_before = inner.codes.len();
        inner.states.retain(|_, s| !s.is_expired(STATE_TTL));
        inner.codes.retain(|_, c| !c.is_expired(CODE_TTL));
        let removed = (states_before - inner.states.len()) + (codes_before - inner.codes.len());
        if removed > 0 {
            tracing::debug!(count = removed, "swept expired authorization entries");
        }
    }
}

impl std::fmt::Debug for OAuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthStore").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::types::UpstreamToken;

    fn stale_instant(ttl: Duration) -> Instant {
        Instant::now().checked_sub(ttl + Duration::from_secs(5)).expect("clock far enough along")
    }

    fn test_state(created_at: Instant) -> AuthState {
        AuthState {
            client_id: "client1".into(),
            redirect_uri: "http://localhost:3000/callback".into(),
            code_challenge: "challenge".into(),
            code_challenge_method: "S256".into(),
            client_state: "client-state".into(),
            created_at,
        }
    }

    fn test_code(created_at: Instant) -> AuthCode {
        AuthCode {
            client_id: "client1".into(),
            redirect_uri: "http://localhost:3000/callback".into(),
            code_challenge: String::new(),
            code_challenge_method: String::new(),
            upstream_token: UpstreamToken {
                access_token: "ya29.token".into(),
                refresh_token: None,
                expiry: None,
            },
            created_at,
        }
    }

    #[test]
    fn test_generated_tokens_are_256_bit_hex() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }

    #[tokio::test]
    async fn test_client_registration() {
        let store = OAuthStore::new();
        let client = store.register_client(vec!["http://localhost/cb".into()]).await;

        assert!(!client.client_id.is_empty());
        assert!(!client.client_secret.is_empty());

        let found = store.get_client(&client.client_id).await.unwrap();
        assert_eq!(found.redirect_uris, vec!["http://localhost/cb".to_string()]);
    }

    #[tokio::test]
    async fn test_state_is_single_use() {
        let store = OAuthStore::new();
        let token = store.insert_state(test_state(Instant::now())).await;

        let first = store.consume_state(&token).await;
        assert!(first.is_some());
        assert_eq!(first.unwrap().client_id, "client1");

        assert!(store.consume_state(&token).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_state_rejected_and_deleted() {
        let store = OAuthStore::new();
        let token = store.insert_state(test_state(stale_instant(STATE_TTL))).await;

        assert!(store.consume_state(&token).await.is_none());
        // Consumed even though stale: a retry cannot resurrect it.
        assert!(store.consume_state(&token).await.is_none());
    }

    #[tokio::test]
    async fn test_code_is_single_use() {
        let store = OAuthStore::new();
        let code = store.insert_code(test_code(Instant::now())).await;

        assert!(store.consume_code(&code).await.is_some());
        assert!(store.consume_code(&code).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_code_rejected() {
        let store = OAuthStore::new();
        let code = store.insert_code(test_code(stale_instant(CODE_TTL))).await;
        assert!(store.consume_code(&code).await.is_none());
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired_entries() {
        let store = OAuthStore::new();
        let stale = store.insert_state(test_state(stale_instant(STATE_TTL))).await;
        let fresh = store.insert_state(test_state(Instant::now())).await;
        let stale_code = store.insert_code(test_code(stale_instant(CODE_TTL))).await;

        store.sweep().await;

        assert!(store.consume_state(&fresh).await.is_some());
        assert!(store.consume_state(&stale).await.is_none());
        assert!(store.consume_code(&stale_code).await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_consume_yields_one_winner() {
        let store = OAuthStore::new();
        let code = store.insert_code(test_code(Instant::now())).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let code = code.clone();
            handles.push(tokio::spawn(async move { store.consume_code(&code).await.is_some() }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
