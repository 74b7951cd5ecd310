//! Activity tools: changes feed, trash window, and the paginated activity
//! history query.

use serde_json::{Value, json};

use crate::error::ToolResult;

use super::{McpTool, RequestScope, optional_i64};

/// Hard cap on activity-history results, regardless of the argument.
const HISTORY_HARD_CAP: i64 = 200;

/// Recent changes from the changes feed.
pub struct ActivityChangesTool;

#[async_trait::async_trait]
impl McpTool for ActivityChangesTool {
    fn name(&self) -> &'static str {
        "drive_activity_changes"
    }

    fn description(&self) -> &'static str {
        "List recent changes to files in your Google Drive. Shows what files were \
         added, modified, or removed."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "maxResults": {
                    "type": "integer",
                    "description": "Maximum number of results (default: 50)",
                    "default": 50
                }
            }
        })
    }

    async fn execute(&self, scope: &RequestScope, input: Value) -> ToolResult<Value> {
        let max_results = optional_i64(&input, "maxResults", 50);
        let changes = scope.drive().list_changes(max_results).await?;

        let results: Vec<Value> = changes
            .iter()
            .map(|c| {
                json!({
                    "fileId": c.file_id,
                    "fileName": c.file_name,
                    "changeType": c.change_type,
                    "changeTime": c.change_time,
                    "modifiedBy": c.modified_by
                })
            })
            .collect();
        Ok(Value::Array(results))
    }
}

/// Recently trashed files within a time window.
pub struct ActivityDeletedTool;

#[async_trait::async_trait]
impl McpTool for ActivityDeletedTool {
    fn name(&self) -> &'static str {
        "drive_activity_deleted"
    }

    fn description(&self) -> &'static str {
        "List recently deleted (trashed) files in Google Drive within a time window."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "daysBack": {
                    "type": "integer",
                    "description": "Number of days to look back (default: 7)",
                    "default": 7
                },
                "maxResults": {
                    "type": "integer",
                    "description": "Maximum number of results (default: 100)",
                    "default": 100
                }
            }
        })
    }

    async fn execute(&self, scope: &RequestScope, input: Value) -> ToolResult<Value> {
        let days_back = optional_i64(&input, "daysBack", 7);
        let max_results = optional_i64(&input, "maxResults", 100);

        let files = scope.drive().list_trashed(days_back as u64, max_results).await?;

        let results: Vec<Value> = files
            .iter()
            .map(|f| {
                let mut entry = json!({
                    "id": f.id,
                    "name": f.name,
                    "trashedTime": f.trashed_time,
                    "size": f.size_bytes()
                });
                if let Some(ref user) = f.trashing_user {
                    entry["trashedBy"] = json!(user.label());
                }
                entry
            })
            .collect();
        Ok(Value::Array(results))
    }
}

/// Comprehensive activity history via the Drive Activity API.
pub struct ActivityHistoryTool;

#[async_trait::async_trait]
impl McpTool for ActivityHistoryTool {
    fn name(&self) -> &'static str {
        "drive_activity_history"
    }

    fn description(&self) -> &'static str {
        "Query comprehensive activity history from Google Drive Activity API. \
         Includes edits, moves, permission changes, deletions, and more. Hard cap of \
         200 results."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "daysBack": {
                    "type": "integer",
                    "description": "Number of days to look back (default: 7)",
                    "default": 7
                },
                "maxResults": {
                    "type": "integer",
                    "description": "Maximum number of results (default: 100, hard cap: 200)",
                    "default": 100
                }
            }
        })
    }

    async fn execute(&self, scope: &RequestScope, input: Value) -> ToolResult<Value> {
        let days_back = optional_i64(&input, "daysBack", 7);
        let max_results = optional_i64(&input, "maxResults", 100).min(HISTORY_HARD_CAP);

        let activities =
            scope.drive().query_activity(days_back as u64, max_results as usize).await?;

        let results: Vec<Value> = activities
            .iter()
            .map(|a| {
                json!({
                    "timestamp": a.timestamp,
                    "actionType": a.action_type,
                    "actionDetail": a.action_detail,
                    "actors": a.actors,
                    "targets": a.targets,
                    "targetTitles": a.target_titles
                })
            })
            .collect();
        Ok(Value::Array(results))
    }
}
