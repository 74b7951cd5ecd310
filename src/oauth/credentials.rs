//! Google OAuth client-credential loading.
//!
//! Source precedence, evaluated once at startup:
//! 1. Google Secret Manager, when both a secret name and project are set.
//!    Failures log a warning and fall through to local lookup.
//! 2. An explicitly configured local file.
//! 3. Well-known paths in the working directory.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;

use crate::config::Endpoints;

/// Paths probed when no explicit credential source is configured.
const WELL_KNOWN_PATHS: &[&str] = &["credentials.json", "google_credentials.json"];

/// The Google OAuth client credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamCredentials {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
}

/// Credential-loading failures. Fatal at startup.
#[derive(thiserror::Error, Debug)]
pub enum CredentialsError {
    #[error("no OAuth credentials found: set --secret-name/--secret-project or --credential-file")]
    Missing,

    #[error("read credential file {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("credentials missing client_id or client_secret")]
    Malformed,
}

/// Standard Google credential file wrapper: `{"web": {...}}` or
/// `{"installed": {...}}`.
#[derive(Debug, Default, Deserialize)]
struct CredentialsWrapper {
    #[serde(default)]
    web: Option<UpstreamCredentials>,
    #[serde(default)]
    installed: Option<UpstreamCredentials>,
}

/// Load Google OAuth credentials from Secret Manager or a local file.
pub async fn load_credentials(
    secret_name: Option<&str>,
    secret_project: Option<&str>,
    credential_file: Option<&str>,
    endpoints: &Endpoints,
    http: &reqwest::Client,
) -> Result<UpstreamCredentials, CredentialsError> {
    if let (Some(name), Some(project)) = (secret_name, secret_project) {
        match load_from_secret_manager(name, project, endpoints, http).await {
            Ok(creds) => {
                tracing::info!(secret_name = name, "loaded OAuth credentials from Secret Manager");
                return Ok(creds);
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    secret_name = name,
                    "failed to load credentials from Secret Manager, trying local file"
                );
            }
        }
    }

    if let Some(path) = credential_file {
        return load_from_file(path);
    }

    for path in WELL_KNOWN_PATHS {
        if std::path::Path::new(path).exists() {
            return load_from_file(path);
        }
    }

    Err(CredentialsError::Missing)
}

async fn load_from_secret_manager(
    secret_name: &str,
    project: &str,
    endpoints: &Endpoints,
    http: &reqwest::Client,
) -> anyhow::Result<UpstreamCredentials> {
    let token = metadata_access_token(endpoints, http).await?;

    let url = format!(
        "{}/projects/{}/secrets/{}/versions/latest:access",
        endpoints.secret_manager_api, project, secret_name
    );
    let response = http.get(&url).bearer_auth(&token).send().await?.error_for_status()?;

    #[derive(Deserialize)]
    struct AccessResponse {
        payload: SecretPayload,
    }
    #[derive(Deserialize)]
    struct SecretPayload {
        data: String,
    }

    let access: AccessResponse = response.json().await?;
    let data = STANDARD.decode(&access.payload.data)?;
    Ok(parse_credentials(&data)?)
}

/// Fetch a service-account access token from the GCE metadata server.
async fn metadata_access_token(
    endpoints: &Endpoints,
    http: &reqwest::Client,
) -> anyhow::Result<String> {
    #[derive(Deserialize)]
    struct MetadataToken {
        access_token: String,
    }

    let token: MetadataToken = http
        .get(&endpoints.metadata_token_url)
        .header("Metadata-Flavor", "Google")
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(token.access_token)
}

fn load_from_file(path: &str) -> Result<UpstreamCredentials, CredentialsError> {
    let data = std::fs::read(path)
        .map_err(|source| CredentialsError::Unreadable { path: path.to_string(), source })?;
    tracing::info!(path, "loaded OAuth credentials from local file");
    parse_credentials(&data)
}

/// Parse a credential payload, accepting three JSON shapes in order:
/// `{"web": {...}}`, `{"installed": {...}}`, and flat
/// `{client_id, client_secret}`. A shape only matches when both fields are
/// non-empty; no partial merging across shapes.
pub fn parse_credentials(data: &[u8]) -> Result<UpstreamCredentials, CredentialsError> {
    if let Ok(wrapper) = serde_json::from_slice::<CredentialsWrapper>(data) {
        for creds in [wrapper.web, wrapper.installed].into_iter().flatten() {
            if !creds.client_id.is_empty() && !creds.client_secret.is_empty() {
                return Ok(creds);
            }
        }
    }

    let creds: UpstreamCredentials =
        serde_json::from_slice(data).map_err(|_| CredentialsError::Malformed)?;
    if creds.client_id.is_empty() || creds.client_secret.is_empty() {
        return Err(CredentialsError::Malformed);
    }
    Ok(creds)
}
