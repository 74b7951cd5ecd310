//! Authentication context shared by the server and CLI paths.
//!
//! Two modes collapse into one authenticated Drive client factory:
//! - Server mode: the bearer validated by the auth middleware is carried in
//!   a request-scoped [`RequestAuth`] value.
//! - CLI mode: tokens live in a local file under the config directory.
//!
//! Neither mode knows the other exists; both end at [`AuthContext::drive`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Endpoints;
use crate::drive::DriveClient;
use crate::oauth::UpstreamOAuth;

/// Config directory environment override.
pub const ENV_CONFIG_DIR: &str = "GDRIVE_CONFIG_DIR";
/// Credentials path environment override.
pub const ENV_CREDENTIALS_PATH: &str = "GDRIVE_CREDENTIALS_PATH";

const DEFAULT_CONFIG_DIR_NAME: &str = ".credentials";
const DEFAULT_TOKEN_FILE_NAME: &str = "token_gdrive.json";
const DEFAULT_CREDENTIALS_FILE_NAME: &str = "google_credentials.json";

/// Per-request credentials produced by the bearer middleware: the shared
/// Google OAuth client config plus the presented access token. Never escapes
/// a single request.
#[derive(Debug, Clone)]
pub struct RequestAuth {
    pub upstream: Arc<UpstreamOAuth>,
    pub access_token: String,
}

/// An authenticated upstream-API client factory.
#[derive(Debug, Clone)]
pub struct AuthContext {
    http: reqwest::Client,
    endpoints: Endpoints,
    access_token: String,
}

impl AuthContext {
    /// Build a context from request-scoped credentials (server mode).
    #[must_use]
    pub fn for_request(auth: &RequestAuth, http: reqwest::Client, endpoints: Endpoints) -> Self {
        Self { http, endpoints, access_token: auth.access_token.clone() }
    }

    /// Build a context from a file-backed token (CLI mode).
    pub fn from_token_file(
        config: &AuthConfig,
        http: reqwest::Client,
        endpoints: Endpoints,
    ) -> std::io::Result<Self> {
        let token = load_token(&config.token_path())?;
        Ok(Self { http, endpoints, access_token: token.access_token })
    }

    /// The access token carried by this context.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Create an authenticated Drive client.
    #[must_use]
    pub fn drive(&self) -> DriveClient {
        DriveClient::new(self.http.clone(), &self.endpoints, self.access_token.clone())
    }
}

/// Filesystem locations for CLI-mode credentials and tokens.
///
/// Resolution priority: explicit argument, environment variable, default.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub config_dir: PathBuf,
    pub credentials_path: Option<PathBuf>,
}

impl AuthConfig {
    #[must_use]
    pub fn new(config_dir: Option<PathBuf>, credentials_path: Option<PathBuf>) -> Self {
        let config_dir = config_dir
            .or_else(|| std::env::var(ENV_CONFIG_DIR).ok().map(PathBuf::from))
            .unwrap_or_else(|| match std::env::var("HOME") {
                Ok(home) => Path::new(&home).join(DEFAULT_CONFIG_DIR_NAME),
                Err(_) => PathBuf::from(DEFAULT_CONFIG_DIR_NAME),
            });

        let credentials_path =
            credentials_path.or_else(|| std::env::var(ENV_CREDENTIALS_PATH).ok().map(PathBuf::from));

        Self { config_dir, credentials_path }
    }

    /// Path of the cached token file.
    #[must_use]
    pub fn token_path(&self) -> PathBuf {
        self.config_dir.join(DEFAULT_TOKEN_FILE_NAME)
    }

    /// Resolve the credential file: explicit path, then the working
    /// directory, then the config directory.
    pub fn credentials_path(&self) -> std::io::Result<PathBuf> {
        if let Some(ref path) = self.credentials_path {
            if path.exists() {
                return Ok(path.clone());
            }
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("credentials file not found at {}", path.display()),
            ));
        }

        let cwd_path = PathBuf::from(DEFAULT_CREDENTIALS_FILE_NAME);
        if cwd_path.exists() {
            return Ok(cwd_path);
        }

        let config_path = self.config_dir.join(DEFAULT_CREDENTIALS_FILE_NAME);
        if config_path.exists() {
            return Ok(config_path);
        }

        Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!(
                "{DEFAULT_CREDENTIALS_FILE_NAME} not found in current directory or {}",
                self.config_dir.display()
            ),
        ))
    }
}

/// A token cached on disk between CLI invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

/// Load a token from a local file.
pub fn load_token(path: &Path) -> std::io::Result<StoredToken> {
    let data = std::fs::read(path)?;
    serde_json::from_slice(&data).map_err(std::io::Error::other)
}

/// Save a token, creating the config directory and restricting the file to
/// the owner.
pub fn save_token(path: &Path, token: &StoredToken) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let data = serde_json::to_vec_pretty(token).map_err(std::io::Error::other)?;
    std::fs::write(path, data)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}
