//! Sharing tools: list and mutate file permissions.

use serde_json::{Value, json};

use crate::drive::{DriveClient, ShareOptions};
use crate::error::{ToolError, ToolResult};

use super::{McpTool, RequestScope, optional_bool, optional_str, required_str};

async fn permissions_json(drive: &DriveClient, file_id: &str) -> ToolResult<Value> {
    let perms = drive.list_permissions(file_id).await?;
    let results: Vec<Value> = perms
        .iter()
        .map(|p| {
            json!({
                "id": p.id,
                "type": p.kind,
                "role": p.role,
                "emailAddress": p.email_address,
                "displayName": p.display_name,
                "domain": p.domain
            })
        })
        .collect();
    Ok(Value::Array(results))
}

/// List sharing settings.
pub struct PermissionsListTool;

#[async_trait::async_trait]
impl McpTool for PermissionsListTool {
    fn name(&self) -> &'static str {
        "drive_permissions_list"
    }

    fn description(&self) -> &'static str {
        "List all permissions (sharing settings) for a Google Drive file or folder."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "fileId": {
                    "type": "string",
                    "description": "Google Drive file or folder ID"
                }
            },
            "required": ["fileId"]
        })
    }

    async fn execute(&self, scope: &RequestScope, input: Value) -> ToolResult<Value> {
        let file_id = required_str(&input, "fileId")?;
        permissions_json(&scope.drive(), &file_id).await
    }
}

/// Add or remove a permission; returns the post-mutation permission list.
pub struct PermissionsUpdateTool;

#[async_trait::async_trait]
impl McpTool for PermissionsUpdateTool {
    fn name(&self) -> &'static str {
        "drive_permissions_update"
    }

    fn description(&self) -> &'static str {
        "Add or remove permissions on a Google Drive file. For adding: specify type \
         (user/anyone), role (reader/writer/commenter), and email (if type=user). For \
         removing: specify permissionId."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "fileId": {
                    "type": "string",
                    "description": "Google Drive file or folder ID"
                },
                "action": {
                    "type": "string",
                    "description": "Action to perform: 'add' or 'remove'",
                    "enum": ["add", "remove"]
                },
                "type": {
                    "type": "string",
                    "description": "Permission type for add: 'user' or 'anyone'",
                    "enum": ["user", "anyone"]
                },
                "role": {
                    "type": "string",
                    "description": "Permission role for add: 'reader', 'writer', or 'commenter'",
                    "enum": ["reader", "writer", "commenter"]
                },
                "email": {
                    "type": "string",
                    "description": "Email address (required when type='user')"
                },
                "notify": {
                    "type": "boolean",
                    "description": "Send notification email (default: true, only for add+user)",
                    "default": true
                },
                "message": {
                    "type": "string",
                    "description": "Custom message for notification email"
                },
                "permissionId": {
                    "type": "string",
                    "description": "Permission ID to remove (required for 'remove' action)"
                }
            },
            "required": ["fileId", "action"]
        })
    }

    async fn execute(&self, scope: &RequestScope, input: Value) -> ToolResult<Value> {
        let file_id = required_str(&input, "fileId")?;
        let action = required_str(&input, "action")?;
        let drive = scope.drive();

        match action.as_str() {
            "add" => {
                let kind = optional_str(&input, "type");
                let role = optional_str(&input, "role");

                match kind.as_str() {
                    "user" => {
                        let email = optional_str(&input, "email");
                        if email.is_empty() {
                            return Err(ToolError::validation(
                                "email",
                                "is required when type is 'user'",
                            ));
                        }
                        drive
                            .share_with_user(
                                &file_id,
                                &ShareOptions {
                                    email,
                                    role,
                                    notify: optional_bool(&input, "notify", true),
                                    message: optional_str(&input, "message"),
                                },
                            )
                            .await?;
                    }
                    "anyone" => drive.share_with_anyone(&file_id, &role).await?,
                    _ => {
                        return Err(ToolError::validation("type", "must be 'user' or 'anyone'"));
                    }
                }
            }
            "remove" => {
                let permission_id = optional_str(&input, "permissionId");
                if permission_id.is_empty() {
                    return Err(ToolError::validation(
                        "permissionId",
                        "is required for remove action",
                    ));
                }
                drive.remove_permission(&file_id, &permission_id).await?;
            }
            _ => return Err(ToolError::validation("action", "must be 'add' or 'remove'")),
        }

        permissions_json(&drive, &file_id).await
    }
}
