//! Typed facade over the Google Drive v3 and Drive Activity v2 REST APIs.
//!
//! Every call authenticates with the caller's bearer token. Bulk data never
//! flows through this server: download, export and upload are handed back to
//! the caller as pre-authenticated Drive URLs.

pub mod activity;
pub mod mime;
pub mod types;

use chrono::{Days, SecondsFormat, Utc};
use serde::de::DeserializeOwned;

use crate::config::Endpoints;
use crate::error::{ClientError, ClientResult};

pub use activity::ActivityEntry;
pub use types::{
    Change, ChangeList, DriveFile, FileInfo, FileList, PathComponent, Permission, PermissionList,
    Revision, RevisionList, StartPageToken, User,
};

/// Drive id of the "My Drive" pseudo-root.
pub const ROOT_ID: &str = "root";
/// Drive id synthesized for the "Shared with me" pseudo-root.
pub const SHARED_ID: &str = "shared";

const MY_DRIVE_NAME: &str = "My Drive";
const SHARED_WITH_ME_NAME: &str = "Shared with me";

/// A simplified entry from the changes feed.
#[derive(Debug)]
pub struct ChangeInfo {
    pub file_id: String,
    pub file_name: String,
    pub change_type: String,
    pub change_time: String,
    pub modified_by: String,
}

/// Options for sharing a file with a user.
#[derive(Debug, Default)]
pub struct ShareOptions {
    pub email: String,
    pub role: String,
    pub notify: bool,
    pub message: String,
}

/// An authenticated Drive API client, constructed per request.
#[derive(Debug, Clone)]
pub struct DriveClient {
    http: reqwest::Client,
    drive_api: String,
    upload_api: String,
    activity_api: String,
    token: String,
}

impl DriveClient {
    #[must_use]
    pub fn new(http: reqwest::Client, endpoints: &Endpoints, token: String) -> Self {
        Self {
            http,
            drive_api: endpoints.drive_api.clone(),
            upload_api: endpoints.upload_api.clone(),
            activity_api: endpoints.activity_api.clone(),
            token,
        }
    }

    // ─── Files ───────────────────────────────────────────────────────────────

    /// Search files and folders by name, optionally filtered by MIME types
    /// expanded from shortcuts.
    pub async fn search_files(
        &self,
        query: &str,
        file_types: &[String],
        max_results: i64,
    ) -> ClientResult<Vec<DriveFile>> {
        let mut q = format!("name contains '{}' and trashed = false", escape_query(query));

        let mime_types = mime::expand_file_types(file_types);
        if !mime_types.is_empty() {
            let conditions: Vec<String> =
                mime_types.iter().map(|m| format!("mimeType = '{m}'")).collect();
            q.push_str(&format!(" and ({})", conditions.join(" or ")));
        }

        let list: FileList = self
            .get(
                &format!("{}/files", self.drive_api),
                &[
                    ("q", q),
                    ("fields", "files(id, name, mimeType, modifiedTime, size)".into()),
                    ("pageSize", max_results.to_string()),
                ],
            )
            .await?;
        Ok(list.files)
    }

    /// List a folder's children, folders first then alphabetical.
    pub async fn list_folder(&self, folder_id: &str) -> ClientResult<Vec<DriveFile>> {
        let q = format!("'{}' in parents and trashed = false", escape_query(folder_id));
        let mut list: FileList = self
            .get(
                &format!("{}/files", self.drive_api),
                &[
                    ("q", q),
                    ("fields", "files(id, name, mimeType, modifiedTime, size)".into()),
                    ("pageSize", "1000".into()),
                ],
            )
            .await?;

        list.files.sort_by(|a, b| {
            let a_folder = a.mime_type == mime::FOLDER;
            let b_folder = b.mime_type == mime::FOLDER;
            b_folder
                .cmp(&a_folder)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        Ok(list.files)
    }

    /// Fetch a file with an explicit field selection.
    pub async fn get_file(&self, file_id: &str, fields: &str) -> ClientResult<DriveFile> {
        self.get(
            &format!("{}/files/{}", self.drive_api, file_id),
            &[("fields", fields.to_string())],
        )
        .await
    }

    /// Find a file by name inside a parent folder. Returns the first match.
    pub async fn find_file(&self, name: &str, parent_id: &str) -> ClientResult<Option<DriveFile>> {
        let q = format!(
            "name = '{}' and '{}' in parents and trashed = false",
            escape_query(name),
            escape_query(parent_id)
        );
        let list: FileList = self
            .get(
                &format!("{}/files", self.drive_api),
                &[("q", q), ("fields", "files(id, name, mimeType, modifiedTime, size)".into())],
            )
            .await?;
        Ok(list.files.into_iter().next())
    }

    /// Detailed metadata plus the reconstructed path.
    pub async fn file_info(&self, file_id: &str) -> ClientResult<FileInfo> {
        let file = self
            .get_file(
                file_id,
                "id, name, mimeType, size, createdTime, modifiedTime, webViewLink, owners",
            )
            .await?;
        let path = self.file_path(file_id).await;
        Ok(FileInfo { file, path })
    }

    /// Reconstruct a file's path by walking the parent chain.
    ///
    /// Best effort: a fetch error aborts the walk and returns whatever was
    /// gathered, so metadata lookups never fail on path alone. The chain
    /// terminates in a pseudo-root, `My Drive` or `Shared with me`.
    pub async fn file_path(&self, file_id: &str) -> Vec<PathComponent> {
        let mut path: Vec<PathComponent> = Vec::new();
        let mut current = file_id.to_string();

        loop {
            let result: ClientResult<DriveFile> = self
                .get(
                    &format!("{}/files/{}", self.drive_api, current),
                    &[
                        ("fields", "id, name, parents, mimeType, sharedWithMeTime".to_string()),
                        ("supportsAllDrives", "true".to_string()),
                    ],
                )
                .await;
            let Ok(file) = result else { break };

            path.insert(
                0,
                PathComponent {
                    id: file.id.clone(),
                    name: file.name.clone(),
                    mime_type: file.mime_type.clone(),
                },
            );

            match file.parents.first() {
                Some(parent) => current = parent.clone(),
                None => {
                    let (id, name) = if file.shared_with_me_time.is_empty() {
                        (ROOT_ID, MY_DRIVE_NAME)
                    } else {
                        (SHARED_ID, SHARED_WITH_ME_NAME)
                    };
                    path.insert(
                        0,
                        PathComponent {
                            id: id.to_string(),
                            name: name.to_string(),
                            mime_type: "special".to_string(),
                        },
                    );
                    break;
                }
            }
        }

        path
    }

    /// Rename a file or folder.
    pub async fn rename_file(&self, file_id: &str, new_name: &str) -> ClientResult<DriveFile> {
        self.patch(
            &format!("{}/files/{}", self.drive_api, file_id),
            &[("fields", "id, name, webViewLink".to_string())],
            &serde_json::json!({ "name": new_name }),
        )
        .await
    }

    /// Soft-delete by moving to trash.
    pub async fn trash_file(&self, file_id: &str) -> ClientResult<DriveFile> {
        self.patch(
            &format!("{}/files/{}", self.drive_api, file_id),
            &[("fields", "id, name, trashed".to_string())],
            &serde_json::json!({ "trashed": true }),
        )
        .await
    }

    /// Move a file: add the target parent and remove all current parents in
    /// one PATCH, so the move is atomic on the Drive side.
    pub async fn move_file(&self, file_id: &str, target_folder_id: &str) -> ClientResult<DriveFile> {
        let file = self.get_file(file_id, "parents").await?;
        let previous_parents = file.parents.join(",");

        self.patch(
            &format!("{}/files/{}", self.drive_api, file_id),
            &[
                ("addParents", target_folder_id.to_string()),
                ("removeParents", previous_parents),
                ("fields", "id, name, parents".to_string()),
            ],
            &serde_json::json!({}),
        )
        .await
    }

    /// Copy a file into a target folder with an optional new name.
    pub async fn copy_file(
        &self,
        file_id: &str,
        target_folder_id: &str,
        new_name: Option<&str>,
    ) -> ClientResult<DriveFile> {
        let mut body = serde_json::json!({ "parents": [target_folder_id] });
        if let Some(name) = new_name {
            body["name"] = serde_json::json!(name);
        }
        self.post(
            &format!("{}/files/{}/copy", self.drive_api, file_id),
            &[("fields", "id, name, webViewLink".to_string())],
            &body,
        )
        .await
    }

    /// Create a single folder under a parent.
    pub async fn create_folder(&self, parent_id: &str, name: &str) -> ClientResult<DriveFile> {
        self.post(
            &format!("{}/files", self.drive_api),
            &[("fields", "id, name, mimeType, webViewLink".to_string())],
            &serde_json::json!({
                "name": name,
                "mimeType": mime::FOLDER,
                "parents": [parent_id]
            }),
        )
        .await
    }

    // ─── Permissions ─────────────────────────────────────────────────────────

    /// List all permissions on a file.
    pub async fn list_permissions(&self, file_id: &str) -> ClientResult<Vec<Permission>> {
        let list: PermissionList = self
            .get(
                &format!("{}/files/{}/permissions", self.drive_api, file_id),
                &[
                    (
                        "fields",
                        "permissions(id, type, role, emailAddress, displayName, domain)"
                            .to_string(),
                    ),
                    ("supportsAllDrives", "true".to_string()),
                ],
            )
            .await?;
        Ok(list.permissions)
    }

    /// Share a file with a user.
    pub async fn share_with_user(&self, file_id: &str, opts: &ShareOptions) -> ClientResult<()> {
        let mut query = vec![
            ("fields", "id".to_string()),
            ("sendNotificationEmail", opts.notify.to_string()),
            ("supportsAllDrives", "true".to_string()),
        ];
        if !opts.message.is_empty() {
            query.push(("emailMessage", opts.message.clone()));
        }

        let _: serde_json::Value = self
            .post(
                &format!("{}/files/{}/permissions", self.drive_api, file_id),
                &query,
                &serde_json::json!({
                    "type": "user",
                    "role": opts.role,
                    "emailAddress": opts.email
                }),
            )
            .await?;
        Ok(())
    }

    /// Share a file with anyone who has the link.
    pub async fn share_with_anyone(&self, file_id: &str, role: &str) -> ClientResult<()> {
        let _: serde_json::Value = self
            .post(
                &format!("{}/files/{}/permissions", self.drive_api, file_id),
                &[("fields", "id".to_string()), ("supportsAllDrives", "true".to_string())],
                &serde_json::json!({ "type": "anyone", "role": role }),
            )
            .await?;
        Ok(())
    }

    /// Remove a permission from a file.
    pub async fn remove_permission(&self, file_id: &str, permission_id: &str) -> ClientResult<()> {
        self.delete(
            &format!("{}/files/{}/permissions/{}", self.drive_api, file_id, permission_id),
            &[("supportsAllDrives", "true".to_string())],
        )
        .await
    }

    // ─── Changes, trash, revisions ───────────────────────────────────────────

    /// List recent changes starting at the current page token.
    pub async fn list_changes(&self, page_size: i64) -> ClientResult<Vec<ChangeInfo>> {
        let start: StartPageToken =
            self.get(&format!("{}/changes/startPageToken", self.drive_api), &[]).await?;

        let list: ChangeList = self
            .get(
                &format!("{}/changes", self.drive_api),
                &[
                    ("pageToken", start.start_page_token),
                    ("pageSize", page_size.to_string()),
                    (
                        "fields",
                        "changes(file(id, name, mimeType, modifiedTime, lastModifyingUser), \
                         fileId, removed, time)"
                            .to_string(),
                    ),
                ],
            )
            .await?;

        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        Ok(list
            .changes
            .into_iter()
            .map(|change| {
                let change_time =
                    if change.time.is_empty() { now.clone() } else { change.time.clone() };
                let (file_name, modified_by, change_type) = match change.file {
                    Some(ref file) => (
                        file.name.clone(),
                        file.last_modifying_user
                            .as_ref()
                            .map(|u| u.label().to_string())
                            .unwrap_or_default(),
                        if change.removed {
                            "Removed"
                        } else if file.modified_time.is_empty() {
                            "Added"
                        } else {
                            "Modified"
                        },
                    ),
                    None => (
                        String::new(),
                        String::new(),
                        if change.removed { "Removed" } else { "Added" },
                    ),
                };
                ChangeInfo {
                    file_id: change.file_id,
                    file_name,
                    change_type: change_type.to_string(),
                    change_time,
                    modified_by,
                }
            })
            .collect())
    }

    /// List trashed files within the window, most recently trashed first.
    pub async fn list_trashed(
        &self,
        days_back: u64,
        max_results: i64,
    ) -> ClientResult<Vec<DriveFile>> {
        let mut q = "trashed = true".to_string();
        if days_back > 0 {
            let cutoff = Utc::now()
                .checked_sub_days(Days::new(days_back))
                .unwrap_or_else(Utc::now)
                .to_rfc3339_opts(SecondsFormat::Secs, true);
            q = format!("trashed = true and trashedTime >= '{cutoff}'");
        }

        let list: FileList = self
            .get(
                &format!("{}/files", self.drive_api),
                &[
                    ("q", q),
                    ("pageSize", max_results.to_string()),
                    (
                        "fields",
                        "files(id, name, mimeType, trashedTime, trashingUser, size, parents)"
                            .to_string(),
                    ),
                    ("orderBy", "trashedTime desc".to_string()),
                ],
            )
            .await?;
        Ok(list.files)
    }

    /// List the revision history of a file.
    pub async fn list_revisions(&self, file_id: &str) -> ClientResult<Vec<Revision>> {
        let list: RevisionList = self
            .get(
                &format!("{}/files/{}/revisions", self.drive_api, file_id),
                &[(
                    "fields",
                    "revisions(id, modifiedTime, size, lastModifyingUser, keepForever)"
                        .to_string(),
                )],
            )
            .await?;
        Ok(list.revisions)
    }

    /// Query the Drive Activity API with pagination and rate-limit backoff.
    pub async fn query_activity(
        &self,
        days_back: u64,
        max_results: usize,
    ) -> ClientResult<Vec<ActivityEntry>> {
        activity::query_activity(self, days_back, max_results).await
    }

    pub(crate) fn activity_query_url(&self) -> String {
        format!("{}/activity:query", self.activity_api)
    }

    // ─── Signed URLs ─────────────────────────────────────────────────────────
    //
    // These compose the canonical Drive endpoint with the caller's current
    // access token; the caller must stream the bytes before the token
    // expires.

    /// Direct-download URL for a binary file.
    #[must_use]
    pub fn download_url(&self, file_id: &str) -> String {
        format!("{}/files/{}?alt=media&access_token={}", self.drive_api, file_id, self.token)
    }

    /// Export URL for a Workspace file.
    #[must_use]
    pub fn export_url(&self, file_id: &str, export_mime_type: &str) -> String {
        format!(
            "{}/files/{}/export?mimeType={}&access_token={}",
            self.drive_api, file_id, export_mime_type, self.token
        )
    }

    /// Resumable-upload URL creating a new file.
    #[must_use]
    pub fn upload_create_url(&self) -> String {
        format!("{}/files?uploadType=resumable&access_token={}", self.upload_api, self.token)
    }

    /// Resumable-upload URL updating an existing file (new version).
    #[must_use]
    pub fn upload_update_url(&self, file_id: &str) -> String {
        format!(
            "{}/files/{}?uploadType=resumable&access_token={}",
            self.upload_api, file_id, self.token
        )
    }

    // ─── HTTP plumbing ───────────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> ClientResult<T> {
        let response =
            self.http.get(url).query(query).bearer_auth(&self.token).send().await?;
        Self::decode(response).await
    }

    async fn patch<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        body: &serde_json::Value,
    ) -> ClientResult<T> {
        let response =
            self.http.patch(url).query(query).bearer_auth(&self.token).json(body).send().await?;
        Self::decode(response).await
    }

    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        body: &serde_json::Value,
    ) -> ClientResult<T> {
        let response =
            self.http.post(url).query(query).bearer_auth(&self.token).json(body).send().await?;
        Self::decode(response).await
    }

    async fn delete(&self, url: &str, query: &[(&str, String)]) -> ClientResult<()> {
        let response =
            self.http.delete(url).query(query).bearer_auth(&self.token).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(Self::status_error(status.as_u16(), &response.text().await.unwrap_or_default()))
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        Err(Self::status_error(status.as_u16(), &response.text().await.unwrap_or_default()))
    }

    fn status_error(status: u16, body: &str) -> ClientError {
        let message = extract_api_error(body);
        match status {
            400 => ClientError::bad_request(message),
            404 => ClientError::not_found(message),
            429 => ClientError::rate_limited(message),
            500..=599 => ClientError::server(status, message),
            _ => ClientError::UnexpectedStatus { status, message },
        }
    }
}

/// Pull the human message (and machine reason, when present) out of a Google
/// API error body.
fn extract_api_error(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.to_string();
    };
    let error = &value["error"];
    let message = error["message"].as_str().unwrap_or(body);
    match error["errors"][0]["reason"].as_str() {
        Some(reason) => format!("{reason}: {message}"),
        None => message.to_string(),
    }
}

/// Escape a value for interpolation into a Drive query string.
fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
