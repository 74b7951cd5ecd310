//! Read-only tools: search, folder listing, metadata, signed download and
//! export URLs, revision history.

use serde_json::{Value, json};

use crate::drive::mime;
use crate::error::{ToolError, ToolResult};

use super::{McpTool, RequestScope, optional_i64, optional_str, required_str};

/// Signed URLs are reported with a constant lifetime matching the typical
/// Google access-token expiry.
const URL_EXPIRES_IN: u64 = 3600;

fn file_summary(file: &crate::drive::DriveFile) -> Value {
    json!({
        "id": file.id,
        "name": file.name,
        "mimeType": file.mime_type,
        "modifiedTime": file.modified_time,
        "size": file.size_bytes()
    })
}

/// Search files by name with optional type filtering.
pub struct SearchTool;

#[async_trait::async_trait]
impl McpTool for SearchTool {
    fn name(&self) -> &'static str {
        "drive_search"
    }

    fn description(&self) -> &'static str {
        "Search for files and folders in Google Drive by name. Use type shortcuts \
         (image, audio, video, prez, doc, spreadsheet, txt, pdf, folder) or explicit \
         MIME types to filter results."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query (file name)"
                },
                "fileTypes": {
                    "type": "string",
                    "description": "Comma-separated file type shortcuts or MIME types (e.g., 'image,pdf' or 'application/pdf')"
                },
                "maxResults": {
                    "type": "integer",
                    "description": "Maximum number of results (default: 50)",
                    "default": 50
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, scope: &RequestScope, input: Value) -> ToolResult<Value> {
        let query = required_str(&input, "query")?;
        let max_results = optional_i64(&input, "maxResults", 50);

        let file_types: Vec<String> = optional_str(&input, "fileTypes")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let files = scope.drive().search_files(&query, &file_types, max_results).await?;
        Ok(Value::Array(files.iter().map(file_summary).collect()))
    }
}

/// List a folder's contents.
pub struct FolderListTool;

#[async_trait::async_trait]
impl McpTool for FolderListTool {
    fn name(&self) -> &'static str {
        "drive_folder_list"
    }

    fn description(&self) -> &'static str {
        "List contents of a Google Drive folder. Returns files and subfolders sorted \
         by type (folders first) then alphabetically."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "folderId": {
                    "type": "string",
                    "description": "Google Drive folder ID (use 'root' for My Drive root)"
                }
            },
            "required": ["folderId"]
        })
    }

    async fn execute(&self, scope: &RequestScope, input: Value) -> ToolResult<Value> {
        let folder_id = required_str(&input, "folderId")?;
        let files = scope.drive().list_folder(&folder_id).await?;
        Ok(Value::Array(files.iter().map(file_summary).collect()))
    }
}

/// Detailed metadata including the reconstructed path.
pub struct FileInfoTool;

#[async_trait::async_trait]
impl McpTool for FileInfoTool {
    fn name(&self) -> &'static str {
        "drive_file_info"
    }

    fn description(&self) -> &'static str {
        "Get detailed metadata for a Google Drive file including full path from root, \
         owners, timestamps, and web link."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "fileId": {
                    "type": "string",
                    "description": "Google Drive file ID"
                }
            },
            "required": ["fileId"]
        })
    }

    async fn execute(&self, scope: &RequestScope, input: Value) -> ToolResult<Value> {
        let file_id = required_str(&input, "fileId")?;
        let info = scope.drive().file_info(&file_id).await?;

        let path: Vec<&str> = info.path.iter().map(|p| p.name.as_str()).collect();
        let owners: Vec<Value> = info
            .file
            .owners
            .iter()
            .map(|o| json!({ "displayName": o.display_name, "emailAddress": o.email_address }))
            .collect();

        Ok(json!({
            "id": info.file.id,
            "name": info.file.name,
            "mimeType": info.file.mime_type,
            "size": info.file.size_bytes(),
            "createdTime": info.file.created_time,
            "modifiedTime": info.file.modified_time,
            "webViewLink": info.file.web_view_link,
            "owners": owners,
            "path": path
        }))
    }
}

/// Signed download URL for binary files.
pub struct DownloadUrlTool;

#[async_trait::async_trait]
impl McpTool for DownloadUrlTool {
    fn name(&self) -> &'static str {
        "drive_download_url"
    }

    fn description(&self) -> &'static str {
        "Get an authenticated download URL for a Google Drive file. For Google \
         Workspace files (Docs, Sheets, Slides), use drive_export_url instead."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "fileId": {
                    "type": "string",
                    "description": "Google Drive file ID"
                }
            },
            "required": ["fileId"]
        })
    }

    async fn execute(&self, scope: &RequestScope, input: Value) -> ToolResult<Value> {
        let file_id = required_str(&input, "fileId")?;
        let drive = scope.drive();

        let file = drive.get_file(&file_id, "id, name, mimeType, size").await?;
        if mime::is_workspace_type(&file.mime_type) {
            return Err(ToolError::unsupported(format!(
                "cannot download Google Workspace file '{}' ({}). Use drive_export_url to \
                 export it to a standard format",
                file.name, file.mime_type
            )));
        }

        Ok(json!({
            "downloadUrl": drive.download_url(&file_id),
            "fileName": file.name,
            "mimeType": file.mime_type,
            "size": file.size_bytes(),
            "expiresIn": URL_EXPIRES_IN
        }))
    }
}

/// Signed export URL for Workspace files.
pub struct ExportUrlTool;

#[async_trait::async_trait]
impl McpTool for ExportUrlTool {
    fn name(&self) -> &'static str {
        "drive_export_url"
    }

    fn description(&self) -> &'static str {
        "Get an authenticated export URL for Google Workspace files (Docs, Sheets, \
         Slides). Converts to standard formats like PDF, DOCX, XLSX, PPTX, CSV, TXT, HTML."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "fileId": {
                    "type": "string",
                    "description": "Google Drive file ID (must be a Google Workspace file)"
                },
                "format": {
                    "type": "string",
                    "description": "Export format: pdf, docx, xlsx, pptx, csv, txt, html",
                    "enum": ["pdf", "docx", "xlsx", "pptx", "csv", "txt", "html"]
                }
            },
            "required": ["fileId", "format"]
        })
    }

    async fn execute(&self, scope: &RequestScope, input: Value) -> ToolResult<Value> {
        let file_id = required_str(&input, "fileId")?;
        let format = required_str(&input, "format")?;
        let drive = scope.drive();

        let file = drive.get_file(&file_id, "id, name, mimeType").await?;
        if !mime::is_workspace_type(&file.mime_type) {
            return Err(ToolError::unsupported(format!(
                "file '{}' ({}) is not a Google Workspace file. Use drive_download_url instead",
                file.name, file.mime_type
            )));
        }

        let Some(export_mime_type) = mime::export_mime_type(&file.mime_type, &format) else {
            return Err(ToolError::unsupported(format!(
                "unsupported export format '{}' for {}. Supported formats: {}",
                format,
                file.mime_type,
                mime::supported_formats(&file.mime_type).join(", ")
            )));
        };

        Ok(json!({
            "exportUrl": drive.export_url(&file_id, export_mime_type),
            "fileName": mime::adjust_filename(&file.name, &format),
            "exportMimeType": export_mime_type,
            "expiresIn": URL_EXPIRES_IN
        }))
    }
}

/// Revision history for a file.
pub struct FileRevisionsTool;

#[async_trait::async_trait]
impl McpTool for FileRevisionsTool {
    fn name(&self) -> &'static str {
        "drive_file_revisions"
    }

    fn description(&self) -> &'static str {
        "List revision history for a specific Google Drive file. Shows version \
         history with modification times, authors, and sizes."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "fileId": {
                    "type": "string",
                    "description": "Google Drive file ID"
                }
            },
            "required": ["fileId"]
        })
    }

    async fn execute(&self, scope: &RequestScope, input: Value) -> ToolResult<Value> {
        let file_id = required_str(&input, "fileId")?;
        let revisions = scope.drive().list_revisions(&file_id).await?;

        let results: Vec<Value> = revisions
            .iter()
            .map(|rev| {
                json!({
                    "id": rev.id,
                    "modifiedTime": rev.modified_time,
                    "size": rev.size_bytes(),
                    "modifiedBy": rev
                        .last_modifying_user
                        .as_ref()
                        .map(|u| u.label().to_string())
                        .unwrap_or_default(),
                    "keepForever": rev.keep_forever
                })
            })
            .collect();
        Ok(Value::Array(results))
    }
}
