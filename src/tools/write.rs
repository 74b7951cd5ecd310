//! Mutating tools: trash, rename, move, copy, folder creation, and
//! resumable-upload URL minting.

use serde_json::{Value, json};

use crate::drive::mime;
use crate::error::ToolResult;

use super::{McpTool, RequestScope, optional_str, required_str};

/// Soft-delete (move to trash).
pub struct DeleteTool;

#[async_trait::async_trait]
impl McpTool for DeleteTool {
    fn name(&self) -> &'static str {
        "drive_delete"
    }

    fn description(&self) -> &'static str {
        "Move a file or folder to trash in Google Drive. This is a soft delete - \
         files can be recovered from trash."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "fileId": {
                    "type": "string",
                    "description": "Google Drive file or folder ID to trash"
                }
            },
            "required": ["fileId"]
        })
    }

    async fn execute(&self, scope: &RequestScope, input: Value) -> ToolResult<Value> {
        let file_id = required_str(&input, "fileId")?;
        let drive = scope.drive();

        let file = drive.get_file(&file_id, "id, name, trashed").await?;
        if file.trashed {
            return Ok(json!({
                "fileId": file.id,
                "fileName": file.name,
                "message": "File is already in trash"
            }));
        }

        drive.trash_file(&file_id).await?;
        Ok(json!({
            "fileId": file.id,
            "fileName": file.name,
            "message": "File moved to trash"
        }))
    }
}

/// Rename a file or folder.
pub struct RenameTool;

#[async_trait::async_trait]
impl McpTool for RenameTool {
    fn name(&self) -> &'static str {
        "drive_rename"
    }

    fn description(&self) -> &'static str {
        "Rename a file or folder in Google Drive."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "fileId": {
                    "type": "string",
                    "description": "Google Drive file or folder ID"
                },
                "newName": {
                    "type": "string",
                    "description": "New name for the file or folder"
                }
            },
            "required": ["fileId", "newName"]
        })
    }

    async fn execute(&self, scope: &RequestScope, input: Value) -> ToolResult<Value> {
        let file_id = required_str(&input, "fileId")?;
        let new_name = required_str(&input, "newName")?;

        let file = scope.drive().rename_file(&file_id, &new_name).await?;
        Ok(json!({
            "id": file.id,
            "name": file.name,
            "webViewLink": file.web_view_link
        }))
    }
}

/// Move a file to a different folder.
pub struct MoveTool;

#[async_trait::async_trait]
impl McpTool for MoveTool {
    fn name(&self) -> &'static str {
        "drive_move"
    }

    fn description(&self) -> &'static str {
        "Move a file or folder to a different folder in Google Drive."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "fileId": {
                    "type": "string",
                    "description": "Google Drive file or folder ID to move"
                },
                "targetFolderId": {
                    "type": "string",
                    "description": "ID of the destination folder"
                }
            },
            "required": ["fileId", "targetFolderId"]
        })
    }

    async fn execute(&self, scope: &RequestScope, input: Value) -> ToolResult<Value> {
        let file_id = required_str(&input, "fileId")?;
        let target_folder_id = required_str(&input, "targetFolderId")?;

        let file = scope.drive().move_file(&file_id, &target_folder_id).await?;
        Ok(json!({
            "id": file.id,
            "name": file.name
        }))
    }
}

/// Copy a file.
pub struct CopyTool;

#[async_trait::async_trait]
impl McpTool for CopyTool {
    fn name(&self) -> &'static str {
        "drive_copy"
    }

    fn description(&self) -> &'static str {
        "Copy a file in Google Drive to a target folder with an optional new name."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "fileId": {
                    "type": "string",
                    "description": "Google Drive file ID to copy"
                },
                "targetFolderId": {
                    "type": "string",
                    "description": "ID of the destination folder"
                },
                "newName": {
                    "type": "string",
                    "description": "Optional new name for the copy"
                }
            },
            "required": ["fileId", "targetFolderId"]
        })
    }

    async fn execute(&self, scope: &RequestScope, input: Value) -> ToolResult<Value> {
        let file_id = required_str(&input, "fileId")?;
        let target_folder_id = required_str(&input, "targetFolderId")?;
        let new_name = optional_str(&input, "newName");
        let new_name = (!new_name.is_empty()).then_some(new_name);

        let file =
            scope.drive().copy_file(&file_id, &target_folder_id, new_name.as_deref()).await?;
        Ok(json!({
            "id": file.id,
            "name": file.name,
            "webViewLink": file.web_view_link
        }))
    }
}

/// Create a folder.
pub struct FolderCreateTool;

#[async_trait::async_trait]
impl McpTool for FolderCreateTool {
    fn name(&self) -> &'static str {
        "drive_folder_create"
    }

    fn description(&self) -> &'static str {
        "Create a new folder in Google Drive under a specified parent folder."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "parentFolderId": {
                    "type": "string",
                    "description": "ID of the parent folder (use 'root' for My Drive root)"
                },
                "name": {
                    "type": "string",
                    "description": "Name of the new folder"
                }
            },
            "required": ["parentFolderId", "name"]
        })
    }

    async fn execute(&self, scope: &RequestScope, input: Value) -> ToolResult<Value> {
        let parent_folder_id = required_str(&input, "parentFolderId")?;
        let name = required_str(&input, "name")?;

        let folder = scope.drive().create_folder(&parent_folder_id, &name).await?;
        Ok(json!({
            "id": folder.id,
            "name": folder.name,
            "mimeType": folder.mime_type,
            "webViewLink": folder.web_view_link
        }))
    }
}

/// Mint a resumable-upload URL, versioning same-named files.
pub struct CreateUploadUrlTool;

#[async_trait::async_trait]
impl McpTool for CreateUploadUrlTool {
    fn name(&self) -> &'static str {
        "drive_create_upload_url"
    }

    fn description(&self) -> &'static str {
        "Create a resumable upload URL for uploading a file to Google Drive. If a \
         file with the same name exists in the target folder, it will create a new \
         version (update)."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "fileName": {
                    "type": "string",
                    "description": "Name of the file to upload"
                },
                "folderId": {
                    "type": "string",
                    "description": "ID of the target folder"
                },
                "mimeType": {
                    "type": "string",
                    "description": "MIME type of the file (auto-detected from extension if not provided)"
                }
            },
            "required": ["fileName", "folderId"]
        })
    }

    async fn execute(&self, scope: &RequestScope, input: Value) -> ToolResult<Value> {
        let file_name = required_str(&input, "fileName")?;
        let folder_id = required_str(&input, "folderId")?;

        let mut mime_type = optional_str(&input, "mimeType");
        if mime_type.is_empty() {
            mime_type = mime::detect_mime_type(&file_name).to_string();
        }

        let drive = scope.drive();

        // Same-named file in the target folder means a new version of it.
        let existing = drive.find_file(&file_name, &folder_id).await.unwrap_or(None);

        let (upload_url, file_id, is_update) = match existing {
            Some(file) => (drive.upload_update_url(&file.id), file.id, true),
            None => (drive.upload_create_url(), String::new(), false),
        };

        Ok(json!({
            "uploadUrl": upload_url,
            "fileId": file_id,
            "isUpdate": is_update,
            "detectedMimeType": mime_type
        }))
    }
}
