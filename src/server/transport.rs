//! MCP streamable-HTTP transport.
//!
//! A single POST endpoint carries JSON-RPC 2.0 requests; tool results are
//! returned as JSON text inside the MCP content envelope. Notifications
//! (requests without an id) are acknowledged with 202.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::RequestAuth;
use crate::config::Endpoints;
use crate::oauth::{OAuth2Server, handlers};
use crate::tools::{McpTool, RequestScope};

use super::auth_middleware::require_bearer;

/// JSON-RPC 2.0 request.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: Cow<'static, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 error.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    const VERSION: &'static str = "2.0";

    #[must_use]
    pub fn success(id: Option<serde_json::Value>, result: serde_json::Value) -> Self {
        Self { jsonrpc: Cow::Borrowed(Self::VERSION), result: Some(result), error: None, id }
    }

    #[must_use]
    pub fn error(id: Option<serde_json::Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: Cow::Borrowed(Self::VERSION),
            result: None,
            error: Some(JsonRpcError { code, message: message.into() }),
            id,
        }
    }
}

/// Tool info for tools/list responses.
#[derive(Debug, Serialize)]
struct McpToolInfo {
    name: String,
    description: String,
    #[serde(rename = "inputSchema")]
    input_schema: serde_json::Value,
}

/// Shared state for HTTP handlers.
pub struct HttpState {
    pub tools: Vec<Box<dyn McpTool>>,
    pub oauth: Arc<OAuth2Server>,
    pub http: reqwest::Client,
    pub endpoints: Endpoints,
}

/// Create the HTTP router: health and OAuth endpoints unauthenticated, the
/// MCP endpoint behind the bearer middleware.
pub fn create_router(state: Arc<HttpState>) -> Router {
    let mcp = Router::new()
        .route("/mcp", post(handle_mcp_post))
        .route_layer(middleware::from_fn_with_state(Arc::clone(&state), require_bearer));

    Router::new()
        .route("/health", get(health))
        .route("/.well-known/oauth-protected-resource", get(handlers::protected_resource))
        .route(
            "/.well-known/oauth-authorization-server",
            get(handlers::authorization_server_metadata),
        )
        .route("/oauth/register", post(handlers::register))
        .route("/oauth/authorize", get(handlers::authorize))
        .route("/oauth/callback", get(handlers::callback))
        .route("/oauth/token", post(handlers::token))
        .merge(mcp)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

/// Handle a JSON-RPC request on the MCP endpoint.
async fn handle_mcp_post(
    State(state): State<Arc<HttpState>>,
    Extension(auth): Extension<RequestAuth>,
    Json(req): Json<JsonRpcRequest>,
) -> Response {
    tracing::debug!(method = %req.method, "handling MCP request");

    let is_notification = req.id.is_none();

    let response = match req.method.as_str() {
        "initialize" => JsonRpcResponse::success(req.id, initialize_result(&req.params)),
        "notifications/initialized" | "initialized" | "notifications/cancelled" => {
            if is_notification {
                return StatusCode::ACCEPTED.into_response();
            }
            JsonRpcResponse::success(req.id, serde_json::json!({}))
        }
        "ping" => JsonRpcResponse::success(req.id, serde_json::json!({})),
        "tools/list" => tools_list(req.id, &state.tools),
        "tools/call" => tools_call(req.id, &req.params, &state, &auth).await,
        _ => {
            if is_notification {
                return StatusCode::ACCEPTED.into_response();
            }
            JsonRpcResponse::error(req.id, -32601, format!("Method not found: {}", req.method))
        }
    };

    Json(response).into_response()
}

fn initialize_result(params: &serde_json::Value) -> serde_json::Value {
    let protocol_version =
        params.get("protocolVersion").and_then(|v| v.as_str()).unwrap_or("2024-11-05");

    tracing::info!(protocol_version, "MCP initialize");

    serde_json::json!({
        "protocolVersion": protocol_version,
        "capabilities": {
            "tools": {
                "listChanged": false
            }
        },
        "serverInfo": {
            "name": "gdrive-mcp-server",
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

fn tools_list(id: Option<serde_json::Value>, tools: &[Box<dyn McpTool>]) -> JsonRpcResponse {
    let tool_list: Vec<McpToolInfo> = tools
        .iter()
        .map(|t| McpToolInfo {
            name: t.name().to_string(),
            description: t.description().to_string(),
            input_schema: t.input_schema(),
        })
        .collect();

    JsonRpcResponse::success(id, serde_json::json!({ "tools": tool_list }))
}

async fn tools_call(
    id: Option<serde_json::Value>,
    params: &serde_json::Value,
    state: &HttpState,
    auth: &RequestAuth,
) -> JsonRpcResponse {
    let Some(tool_name) = params.get("name").and_then(|v| v.as_str()) else {
        return JsonRpcResponse::error(id, -32602, "Missing 'name' parameter");
    };

    let arguments = params.get("arguments").cloned().unwrap_or(serde_json::json!({}));

    let Some(tool) = state.tools.iter().find(|t| t.name() == tool_name) else {
        return JsonRpcResponse::error(id, -32602, format!("Tool not found: {tool_name}"));
    };

    let scope = RequestScope::new(auth, state.http.clone(), state.endpoints.clone());

    let start = Instant::now();
    let result = tool.execute(&scope, arguments).await;
    let duration = start.elapsed();

    match result {
        Ok(value) => {
            tracing::info!(tool = %tool_name, ?duration, "tool call");
            let text = match serde_json::to_string(&value) {
                Ok(text) => text,
                Err(err) => {
                    return JsonRpcResponse::error(id, -32000, format!("Tool error: {err}"));
                }
            };
            JsonRpcResponse::success(
                id,
                serde_json::json!({
                    "content": [{
                        "type": "text",
                        "text": text
                    }]
                }),
            )
        }
        Err(err) => {
            tracing::error!(tool = %tool_name, ?duration, error = %err, "tool call failed");
            JsonRpcResponse::error(id, -32000, format!("Tool error: {err}"))
        }
    }
}
