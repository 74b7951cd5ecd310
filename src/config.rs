//! Configuration for the Drive MCP server.

/// Upstream API constants.
pub mod api {
    use std::time::Duration;

    /// Google Drive v3 REST endpoint.
    pub const DRIVE_API: &str = "https://www.googleapis.com/drive/v3";

    /// Google Drive v3 resumable-upload endpoint.
    pub const UPLOAD_API: &str = "https://www.googleapis.com/upload/drive/v3";

    /// Google Drive Activity v2 REST endpoint.
    pub const ACTIVITY_API: &str = "https://driveactivity.googleapis.com/v2";

    /// Google OAuth authorization endpoint.
    pub const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";

    /// Google OAuth token endpoint.
    pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

    /// Google Secret Manager REST endpoint.
    pub const SECRET_MANAGER_API: &str = "https://secretmanager.googleapis.com/v1";

    /// GCE metadata-server token endpoint (for Secret Manager access).
    pub const METADATA_TOKEN_URL: &str =
        "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

    /// OAuth scopes requested from Google.
    pub const SCOPES: &[&str] = &[
        "https://www.googleapis.com/auth/drive",
        "https://www.googleapis.com/auth/drive.activity.readonly",
    ];

    /// Request timeout (generous: activity queries can be slow).
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
}

/// Upstream endpoint URLs, overridable for tests with mock servers.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub drive_api: String,
    pub upload_api: String,
    pub activity_api: String,
    pub auth_url: String,
    pub token_url: String,
    pub secret_manager_api: String,
    pub metadata_token_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            drive_api: api::DRIVE_API.to_string(),
            upload_api: api::UPLOAD_API.to_string(),
            activity_api: api::ACTIVITY_API.to_string(),
            auth_url: api::AUTH_URL.to_string(),
            token_url: api::TOKEN_URL.to_string(),
            secret_manager_api: api::SECRET_MANAGER_API.to_string(),
            metadata_token_url: api::METADATA_TOKEN_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Point every upstream URL at a mock server.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            drive_api: format!("{base_url}/drive/v3"),
            upload_api: format!("{base_url}/upload/drive/v3"),
            activity_api: format!("{base_url}/activity/v2"),
            auth_url: format!("{base_url}/o/oauth2/auth"),
            token_url: format!("{base_url}/oauth2/token"),
            secret_manager_api: format!("{base_url}/secretmanager/v1"),
            metadata_token_url: format!("{base_url}/computeMetadata/v1/token"),
        }
    }
}

/// Server configuration, assembled from CLI flags and environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen host.
    pub host: String,

    /// Listen port.
    pub port: u16,

    /// Externally visible base URL (no trailing slash).
    pub base_url: String,

    /// Secret Manager secret name holding the OAuth client credentials.
    pub secret_name: Option<String>,

    /// GCP project for Secret Manager.
    pub secret_project: Option<String>,

    /// Local OAuth credential file path.
    pub credential_file: Option<String>,

    /// Upstream endpoint URLs.
    pub endpoints: Endpoints,
}

impl ServerConfig {
    /// Create a config with default upstream endpoints.
    ///
    /// A missing base URL defaults to `http://localhost:{port}`; a trailing
    /// slash is trimmed so endpoint URLs concatenate cleanly.
    #[must_use]
    pub fn new(host: String, port: u16, base_url: Option<String>) -> Self {
        let base_url = base_url.unwrap_or_else(|| format!("http://localhost:{port}"));
        Self {
            host,
            port,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_name: None,
            secret_project: None,
            credential_file: None,
            endpoints: Endpoints::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url() {
        let config = ServerConfig::new("0.0.0.0".into(), 8080, None);
        assert_eq!(config.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config =
            ServerConfig::new("0.0.0.0".into(), 8080, Some("https://drive.example.com/".into()));
        assert_eq!(config.base_url, "https://drive.example.com");
    }

    #[test]
    fn test_endpoints_for_testing() {
        let endpoints = Endpoints::for_testing("http://127.0.0.1:9999");
        assert_eq!(endpoints.drive_api, "http://127.0.0.1:9999/drive/v3");
        assert_eq!(endpoints.token_url, "http://127.0.0.1:9999/oauth2/token");
    }
}
