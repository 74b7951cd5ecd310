//! MCP tool implementations.
//!
//! Each tool declares a name, description and JSON input schema, and runs
//! against the request-scoped credentials injected by the auth middleware.
//! The catalog is fixed at process start.

mod activity;
mod permissions;
mod read;
mod write;

pub use activity::{ActivityChangesTool, ActivityDeletedTool, ActivityHistoryTool};
pub use permissions::{PermissionsListTool, PermissionsUpdateTool};
pub use read::{
    DownloadUrlTool, ExportUrlTool, FileInfoTool, FileRevisionsTool, FolderListTool, SearchTool,
};
pub use write::{
    CopyTool, CreateUploadUrlTool, DeleteTool, FolderCreateTool, MoveTool, RenameTool,
};

use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};

use crate::auth::{AuthContext, RequestAuth};
use crate::config::Endpoints;
use crate::drive::DriveClient;
use crate::error::{ToolError, ToolResult};

/// Per-call execution scope: the validated credentials plus everything needed
/// to build an authenticated Drive client. Never outlives one request.
pub struct RequestScope {
    auth: AuthContext,
}

impl RequestScope {
    #[must_use]
    pub fn new(auth: &RequestAuth, http: reqwest::Client, endpoints: Endpoints) -> Self {
        Self { auth: AuthContext::for_request(auth, http, endpoints) }
    }

    /// An authenticated Drive client for this request.
    #[must_use]
    pub fn drive(&self) -> DriveClient {
        self.auth.drive()
    }

    /// The bearer the caller presented, for signed-URL construction.
    #[must_use]
    pub fn access_token(&self) -> &str {
        self.auth.access_token()
    }
}

/// Trait for MCP tools.
#[async_trait::async_trait]
pub trait McpTool: Send + Sync {
    /// Tool name (e.g., "drive_search").
    fn name(&self) -> &'static str;

    /// Tool description for the LLM.
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters.
    fn input_schema(&self) -> Value;

    /// Execute the tool with the given input.
    async fn execute(&self, scope: &RequestScope, input: Value) -> ToolResult<Value>;
}

/// Register all tools. The set is closed once the process starts.
#[must_use]
pub fn register_all_tools() -> Vec<Box<dyn McpTool>> {
    vec![
        Box::new(PingTool),
        // Read tools
        Box::new(SearchTool),
        Box::new(FolderListTool),
        Box::new(FileInfoTool),
        Box::new(DownloadUrlTool),
        Box::new(ExportUrlTool),
        Box::new(FileRevisionsTool),
        // Activity tools
        Box::new(ActivityChangesTool),
        Box::new(ActivityDeletedTool),
        Box::new(ActivityHistoryTool),
        // Write tools
        Box::new(DeleteTool),
        Box::new(RenameTool),
        Box::new(MoveTool),
        Box::new(CopyTool),
        Box::new(FolderCreateTool),
        Box::new(CreateUploadUrlTool),
        // Permission tools
        Box::new(PermissionsListTool),
        Box::new(PermissionsUpdateTool),
    ]
}

/// Connectivity-test tool.
pub struct PingTool;

#[async_trait::async_trait]
impl McpTool for PingTool {
    fn name(&self) -> &'static str {
        "ping"
    }

    fn description(&self) -> &'static str {
        "Test MCP connectivity. Returns pong with current server time."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _scope: &RequestScope, _input: Value) -> ToolResult<Value> {
        Ok(json!({
            "message": "pong",
            "time": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        }))
    }
}

// ─── Argument helpers ────────────────────────────────────────────────────────
//
// Required fields fail with a tool-level error naming the field; everything
// else follows the permissive default-on-missing policy, including silently
// substituting the default on a type mismatch.

pub(crate) fn required_str(input: &Value, field: &str) -> ToolResult<String> {
    match input.get(field).and_then(Value::as_str) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(ToolError::validation(field, "is required")),
    }
}

pub(crate) fn optional_str(input: &Value, field: &str) -> String {
    input.get(field).and_then(Value::as_str).unwrap_or_default().to_string()
}

pub(crate) fn optional_i64(input: &Value, field: &str, default: i64) -> i64 {
    match input.get(field).and_then(Value::as_i64) {
        Some(n) if n > 0 => n,
        _ => default,
    }
}

pub(crate) fn optional_bool(input: &Value, field: &str, default: bool) -> bool {
    input.get(field).and_then(Value::as_bool).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_fixed_and_unique() {
        let tools = register_all_tools();
        assert_eq!(tools.len(), 18);

        let mut names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 18, "tool names must be unique");
        assert!(names.contains(&"ping"));
        assert!(names.contains(&"drive_search"));
        assert!(names.contains(&"drive_activity_history"));
    }

    #[test]
    fn test_schemas_are_objects() {
        for tool in register_all_tools() {
            let schema = tool.input_schema();
            assert_eq!(schema["type"], "object", "schema of {} must be an object", tool.name());
        }
    }

    #[test]
    fn test_required_str_rejects_missing_and_wrong_type() {
        let input = json!({"query": 42, "name": ""});
        assert!(required_str(&input, "query").is_err());
        assert!(required_str(&input, "name").is_err());
        assert!(required_str(&input, "absent").is_err());

        let ok = json!({"query": "report"});
        assert_eq!(required_str(&ok, "query").unwrap(), "report");
    }

    #[test]
    fn test_optional_i64_defaults() {
        let input = json!({"maxResults": "not-a-number", "zero": 0, "fine": 25});
        assert_eq!(optional_i64(&input, "maxResults", 50), 50);
        assert_eq!(optional_i64(&input, "zero", 50), 50);
        assert_eq!(optional_i64(&input, "fine", 50), 25);
        assert_eq!(optional_i64(&input, "absent", 7), 7);
    }

    #[test]
    fn test_optional_bool_defaults() {
        let input = json!({"notify": false, "bad": "yes"});
        assert!(!optional_bool(&input, "notify", true));
        assert!(optional_bool(&input, "bad", true));
        assert!(optional_bool(&input, "absent", true));
    }
}
