//! Serde models for the Drive v3 fields the tools surface.
//!
//! Only the fields named in each request's `fields` selector are populated;
//! everything defaults so partial responses deserialize cleanly. Drive
//! returns int64 values (`size`) as JSON strings.

use serde::Deserialize;

/// A Drive file or folder.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub created_time: String,
    pub modified_time: String,
    pub web_view_link: String,
    pub size: Option<String>,
    pub parents: Vec<String>,
    pub trashed: bool,
    pub trashed_time: String,
    pub trashing_user: Option<User>,
    pub shared_with_me_time: String,
    pub owners: Vec<User>,
    pub last_modifying_user: Option<User>,
}

impl DriveFile {
    /// File size in bytes; 0 when absent (folders, Workspace files).
    #[must_use]
    pub fn size_bytes(&self) -> i64 {
        self.size.as_deref().and_then(|s| s.parse().ok()).unwrap_or(0)
    }
}

/// A Drive user reference.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub display_name: String,
    pub email_address: String,
}

impl User {
    /// Display name, falling back to the email address.
    #[must_use]
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() { &self.email_address } else { &self.display_name }
    }
}

/// `files.list` response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileList {
    pub files: Vec<DriveFile>,
}

/// A sharing permission on a file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Permission {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub role: String,
    pub email_address: String,
    pub display_name: String,
    pub domain: String,
}

/// `permissions.list` response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PermissionList {
    pub permissions: Vec<Permission>,
}

/// `changes.getStartPageToken` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPageToken {
    pub start_page_token: String,
}

/// One entry in the changes feed.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Change {
    pub file_id: String,
    pub removed: bool,
    pub time: String,
    pub file: Option<DriveFile>,
}

/// `changes.list` response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangeList {
    pub changes: Vec<Change>,
}

/// A file revision.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Revision {
    pub id: String,
    pub modified_time: String,
    pub size: Option<String>,
    pub last_modifying_user: Option<User>,
    pub keep_forever: bool,
}

impl Revision {
    /// Revision size in bytes; 0 when absent.
    #[must_use]
    pub fn size_bytes(&self) -> i64 {
        self.size.as_deref().and_then(|s| s.parse().ok()).unwrap_or(0)
    }
}

/// `revisions.list` response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RevisionList {
    pub revisions: Vec<Revision>,
}

/// One component of a reconstructed file path.
#[derive(Debug, Clone)]
pub struct PathComponent {
    pub id: String,
    pub name: String,
    pub mime_type: String,
}

/// Detailed file information for `drive_file_info`.
#[derive(Debug)]
pub struct FileInfo {
    pub file: DriveFile,
    pub path: Vec<PathComponent>,
}
