//! Mock-based tool tests using wiremock.
//!
//! These drive the full router (bearer middleware included) against a mocked
//! Drive API to verify actual tool behavior.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gdrive_mcp::config::Endpoints;
use gdrive_mcp::oauth::{OAuth2Server, UpstreamCredentials};
use gdrive_mcp::server::transport::{HttpState, create_router};
use gdrive_mcp::tools;

const BASE_URL: &str = "https://drive.mcp.example.com";
const BEARER: &str = "Bearer test-token";

fn build_test_router(mock_server: &MockServer) -> axum::Router {
    let http = reqwest::Client::new();
    let endpoints = Endpoints::for_testing(&mock_server.uri());
    let oauth = Arc::new(OAuth2Server::new(
        BASE_URL,
        UpstreamCredentials {
            client_id: "test-google-client-id".into(),
            client_secret: "test-google-client-secret".into(),
        },
        &endpoints,
        http.clone(),
    ));
    let state =
        Arc::new(HttpState { tools: tools::register_all_tools(), oauth, http, endpoints });
    create_router(state)
}

/// Call a tool through the MCP endpoint; returns the parsed JSON-RPC response.
async fn call_tool(
    app: &axum::Router,
    name: &str,
    arguments: serde_json::Value,
) -> serde_json::Value {
    let body = json!({
        "jsonrpc": "2.0",
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments},
        "id": 1
    });
    let response = app
        .clone()
        .oneshot(
            Request::post("/mcp")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, BEARER)
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Unwrap the text payload of a successful tool call.
fn tool_payload(response: &serde_json::Value) -> serde_json::Value {
    let text = response["result"]["content"][0]["text"]
        .as_str()
        .unwrap_or_else(|| panic!("expected text result, got: {response}"));
    serde_json::from_str(text).unwrap()
}

fn tool_error_message(response: &serde_json::Value) -> String {
    response["error"]["message"]
        .as_str()
        .unwrap_or_else(|| panic!("expected error, got: {response}"))
        .to_string()
}

// ─── drive_search ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_search_returns_file_summaries() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param("q", "name contains 'report' and trashed = false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [
                {"id": "f1", "name": "report.pdf", "mimeType": "application/pdf",
                 "modifiedTime": "2025-06-01T12:00:00Z", "size": "2048"},
                {"id": "f2", "name": "report-old.pdf", "mimeType": "application/pdf",
                 "modifiedTime": "2025-01-01T12:00:00Z", "size": "1024"}
            ]
        })))
        .mount(&mock_server)
        .await;

    let app = build_test_router(&mock_server);
    let response = call_tool(&app, "drive_search", json!({"query": "report"})).await;

    let payload = tool_payload(&response);
    let files = payload.as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["id"], "f1");
    assert_eq!(files[0]["size"], 2048);
}

#[tokio::test]
async fn test_search_expands_type_shortcuts() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param(
            "q",
            "name contains 'logo' and trashed = false and (mimeType = 'application/pdf')",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"files": []})))
        .mount(&mock_server)
        .await;

    let app = build_test_router(&mock_server);
    let response =
        call_tool(&app, "drive_search", json!({"query": "logo", "fileTypes": "pdf"})).await;

    // Empty result set serializes as [], never null.
    assert_eq!(response["result"]["content"][0]["text"], "[]");
}

#[tokio::test]
async fn test_search_missing_query_is_tool_error() {
    let mock_server = MockServer::start().await;
    let app = build_test_router(&mock_server);

    let response = call_tool(&app, "drive_search", json!({})).await;
    assert!(tool_error_message(&response).contains("query"));
}

// ─── drive_folder_list ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_folder_list_sorts_folders_first() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param("q", "'root' in parents and trashed = false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [
                {"id": "f1", "name": "zebra.txt", "mimeType": "text/plain"},
                {"id": "d1", "name": "Beta", "mimeType": "application/vnd.google-apps.folder"},
                {"id": "f2", "name": "alpha.txt", "mimeType": "text/plain"},
                {"id": "d2", "name": "alpha", "mimeType": "application/vnd.google-apps.folder"}
            ]
        })))
        .mount(&mock_server)
        .await;

    let app = build_test_router(&mock_server);
    let response = call_tool(&app, "drive_folder_list", json!({"folderId": "root"})).await;

    let payload = tool_payload(&response);
    let names: Vec<&str> =
        payload.as_array().unwrap().iter().map(|f| f["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["alpha", "Beta", "alpha.txt", "zebra.txt"]);
}

// ─── drive_download_url / drive_export_url duals ─────────────────────────────

#[tokio::test]
async fn test_download_url_for_binary_file() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/bin1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "bin1", "name": "photo.jpg", "mimeType": "image/jpeg", "size": "4096"
        })))
        .mount(&mock_server)
        .await;

    let app = build_test_router(&mock_server);
    let response = call_tool(&app, "drive_download_url", json!({"fileId": "bin1"})).await;

    let payload = tool_payload(&response);
    let url = payload["downloadUrl"].as_str().unwrap();
    assert!(url.contains("/files/bin1?alt=media"));
    assert!(url.contains("access_token=test-token"));
    assert_eq!(payload["fileName"], "photo.jpg");
    assert_eq!(payload["expiresIn"], 3600);
}

#[tokio::test]
async fn test_download_url_rejects_workspace_file() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/doc1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "doc1", "name": "Notes", "mimeType": "application/vnd.google-apps.document"
        })))
        .mount(&mock_server)
        .await;

    let app = build_test_router(&mock_server);
    let response = call_tool(&app, "drive_download_url", json!({"fileId": "doc1"})).await;

    let message = tool_error_message(&response);
    assert!(message.contains("drive_export_url"));
    assert!(message.contains("Notes"));
}

#[tokio::test]
async fn test_export_url_for_workspace_file() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/doc1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "doc1", "name": "Notes.gdoc", "mimeType": "application/vnd.google-apps.document"
        })))
        .mount(&mock_server)
        .await;

    let app = build_test_router(&mock_server);
    let response =
        call_tool(&app, "drive_export_url", json!({"fileId": "doc1", "format": "pdf"})).await;

    let payload = tool_payload(&response);
    assert!(payload["exportUrl"].as_str().unwrap().contains("/files/doc1/export?"));
    assert_eq!(payload["exportMimeType"], "application/pdf");
    assert_eq!(payload["fileName"], "Notes.pdf");
}

#[tokio::test]
async fn test_export_url_rejects_binary_file() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/bin1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "bin1", "name": "photo.jpg", "mimeType": "image/jpeg"
        })))
        .mount(&mock_server)
        .await;

    let app = build_test_router(&mock_server);
    let response =
        call_tool(&app, "drive_export_url", json!({"fileId": "bin1", "format": "pdf"})).await;

    assert!(tool_error_message(&response).contains("drive_download_url"));
}

#[tokio::test]
async fn test_export_url_lists_supported_formats() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/sheet1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "sheet1", "name": "Budget", "mimeType": "application/vnd.google-apps.spreadsheet"
        })))
        .mount(&mock_server)
        .await;

    let app = build_test_router(&mock_server);
    let response =
        call_tool(&app, "drive_export_url", json!({"fileId": "sheet1", "format": "docx"})).await;

    let message = tool_error_message(&response);
    assert!(message.contains("xlsx"));
    assert!(message.contains("csv"));
}

// ─── drive_delete ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_delete_moves_file_to_trash() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/f1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "f1", "name": "old.txt", "trashed": false
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/drive/v3/files/f1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "f1", "name": "old.txt", "trashed": true
        })))
        .mount(&mock_server)
        .await;

    let app = build_test_router(&mock_server);
    let response = call_tool(&app, "drive_delete", json!({"fileId": "f1"})).await;

    let payload = tool_payload(&response);
    assert_eq!(payload["message"], "File moved to trash");
}

#[tokio::test]
async fn test_delete_is_idempotent_for_trashed_files() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/f1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "f1", "name": "old.txt", "trashed": true
        })))
        .mount(&mock_server)
        .await;

    let app = build_test_router(&mock_server);
    let response = call_tool(&app, "drive_delete", json!({"fileId": "f1"})).await;

    let payload = tool_payload(&response);
    assert_eq!(payload["message"], "File is already in trash");
}

// ─── drive_create_upload_url ─────────────────────────────────────────────────

#[tokio::test]
async fn test_create_upload_url_for_new_file() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"files": []})))
        .mount(&mock_server)
        .await;

    let app = build_test_router(&mock_server);
    let response = call_tool(
        &app,
        "drive_create_upload_url",
        json!({"fileName": "notes.txt", "folderId": "folder9"}),
    )
    .await;

    let payload = tool_payload(&response);
    assert_eq!(payload["isUpdate"], false);
    assert_eq!(payload["detectedMimeType"], "text/plain");
    let url = payload["uploadUrl"].as_str().unwrap();
    assert!(url.contains("/upload/drive/v3/files?uploadType=resumable"));
    assert!(url.contains("access_token=test-token"));
}

#[tokio::test]
async fn test_create_upload_url_versions_existing_file() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [{"id": "existing1", "name": "notes.txt", "mimeType": "text/plain"}]
        })))
        .mount(&mock_server)
        .await;

    let app = build_test_router(&mock_server);
    let response = call_tool(
        &app,
        "drive_create_upload_url",
        json!({"fileName": "notes.txt", "folderId": "folder9", "mimeType": "text/markdown"}),
    )
    .await;

    let payload = tool_payload(&response);
    assert_eq!(payload["isUpdate"], true);
    assert_eq!(payload["fileId"], "existing1");
    assert_eq!(payload["detectedMimeType"], "text/markdown");
    assert!(payload["uploadUrl"].as_str().unwrap().contains("/files/existing1?uploadType=resumable"));
}

// ─── drive_permissions_* ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_permissions_list_empty_serializes_as_array() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/f1/permissions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"permissions": []})))
        .mount(&mock_server)
        .await;

    let app = build_test_router(&mock_server);
    let response = call_tool(&app, "drive_permissions_list", json!({"fileId": "f1"})).await;

    assert_eq!(response["result"]["content"][0]["text"], "[]");
}

#[tokio::test]
async fn test_permissions_update_add_requires_email_for_user() {
    let mock_server = MockServer::start().await;
    let app = build_test_router(&mock_server);

    let response = call_tool(
        &app,
        "drive_permissions_update",
        json!({"fileId": "f1", "action": "add", "type": "user", "role": "reader"}),
    )
    .await;

    assert!(tool_error_message(&response).contains("email"));
}

#[tokio::test]
async fn test_permissions_update_add_returns_new_list() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/drive/v3/files/f1/permissions"))
        .and(query_param("sendNotificationEmail", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "p2"})))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/f1/permissions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "permissions": [
                {"id": "p1", "type": "user", "role": "owner", "emailAddress": "me@example.com"},
                {"id": "p2", "type": "user", "role": "reader", "emailAddress": "ada@example.com"}
            ]
        })))
        .mount(&mock_server)
        .await;

    let app = build_test_router(&mock_server);
    let response = call_tool(
        &app,
        "drive_permissions_update",
        json!({
            "fileId": "f1", "action": "add", "type": "user",
            "role": "reader", "email": "ada@example.com"
        }),
    )
    .await;

    let payload = tool_payload(&response);
    let perms = payload.as_array().unwrap();
    assert_eq!(perms.len(), 2);
    assert_eq!(perms[1]["emailAddress"], "ada@example.com");
}

#[tokio::test]
async fn test_permissions_update_remove_requires_permission_id() {
    let mock_server = MockServer::start().await;
    let app = build_test_router(&mock_server);

    let response = call_tool(
        &app,
        "drive_permissions_update",
        json!({"fileId": "f1", "action": "remove"}),
    )
    .await;

    assert!(tool_error_message(&response).contains("permissionId"));
}

#[tokio::test]
async fn test_permissions_update_invalid_action() {
    let mock_server = MockServer::start().await;
    let app = build_test_router(&mock_server);

    let response = call_tool(
        &app,
        "drive_permissions_update",
        json!({"fileId": "f1", "action": "escalate"}),
    )
    .await;

    assert!(tool_error_message(&response).contains("action"));
}

// ─── drive_file_info ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_file_info_includes_path_to_root() {
    let mock_server = MockServer::start().await;
    // Metadata fetch and the first path hop share this mock; the fields
    // selector differs but the superset body works for both.
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/leaf1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "leaf1", "name": "notes.txt", "mimeType": "text/plain", "size": "10",
            "createdTime": "2025-01-01T00:00:00Z", "modifiedTime": "2025-06-01T00:00:00Z",
            "webViewLink": "https://drive.google.com/file/d/leaf1/view",
            "owners": [{"displayName": "Ada", "emailAddress": "ada@example.com"}],
            "parents": ["parent1"]
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/parent1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "parent1", "name": "Projects",
            "mimeType": "application/vnd.google-apps.folder"
        })))
        .mount(&mock_server)
        .await;

    let app = build_test_router(&mock_server);
    let response = call_tool(&app, "drive_file_info", json!({"fileId": "leaf1"})).await;

    let payload = tool_payload(&response);
    assert_eq!(payload["name"], "notes.txt");
    assert_eq!(payload["path"], json!(["My Drive", "Projects", "notes.txt"]));
    assert_eq!(payload["owners"][0]["displayName"], "Ada");
}

// ─── drive_file_revisions ────────────────────────────────────────────────────

#[tokio::test]
async fn test_file_revisions() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/f1/revisions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "revisions": [
                {"id": "r1", "modifiedTime": "2025-05-01T00:00:00Z", "size": "100",
                 "lastModifyingUser": {"displayName": "Ada"}, "keepForever": true},
                {"id": "r2", "modifiedTime": "2025-06-01T00:00:00Z", "size": "120",
                 "lastModifyingUser": {"emailAddress": "bob@example.com"}}
            ]
        })))
        .mount(&mock_server)
        .await;

    let app = build_test_router(&mock_server);
    let response = call_tool(&app, "drive_file_revisions", json!({"fileId": "f1"})).await;

    let payload = tool_payload(&response);
    let revisions = payload.as_array().unwrap();
    assert_eq!(revisions.len(), 2);
    assert_eq!(revisions[0]["modifiedBy"], "Ada");
    assert_eq!(revisions[1]["modifiedBy"], "bob@example.com");
    assert_eq!(revisions[0]["keepForever"], true);
    assert_eq!(revisions[1]["keepForever"], false);
}

// ─── drive_activity_* ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_activity_deleted_lists_trashed_files() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param("orderBy", "trashedTime desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [
                {"id": "t1", "name": "gone.txt", "trashedTime": "2025-06-02T00:00:00Z",
                 "size": "5", "trashingUser": {"displayName": "Ada"}}
            ]
        })))
        .mount(&mock_server)
        .await;

    let app = build_test_router(&mock_server);
    let response = call_tool(&app, "drive_activity_deleted", json!({})).await;

    let payload = tool_payload(&response);
    let files = payload.as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["trashedBy"], "Ada");
}

#[tokio::test]
async fn test_activity_changes_classifies_entries() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/changes/startPageToken"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"startPageToken": "token-1"})),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/changes"))
        .and(query_param("pageToken", "token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "changes": [
                {"fileId": "c1", "removed": true, "time": "2025-06-01T10:00:00Z"},
                {"fileId": "c2", "removed": false, "time": "2025-06-01T11:00:00Z",
                 "file": {"id": "c2", "name": "doc.txt", "modifiedTime": "2025-06-01T11:00:00Z",
                          "lastModifyingUser": {"displayName": "Ada"}}}
            ]
        })))
        .mount(&mock_server)
        .await;

    let app = build_test_router(&mock_server);
    let response = call_tool(&app, "drive_activity_changes", json!({})).await;

    let payload = tool_payload(&response);
    let changes = payload.as_array().unwrap();
    assert_eq!(changes[0]["changeType"], "Removed");
    assert_eq!(changes[1]["changeType"], "Modified");
    assert_eq!(changes[1]["modifiedBy"], "Ada");
}

#[tokio::test]
async fn test_activity_history_is_hard_capped_at_200() {
    let mock_server = MockServer::start().await;

    // Every page returns 100 activities and always promises another page;
    // only the hard cap stops the loop.
    let activities: Vec<serde_json::Value> = (0..100)
        .map(|i| {
            json!({
                "timestamp": "2025-06-01T10:00:00Z",
                "primaryActionDetail": {"edit": {}},
                "actors": [{"user": {"knownUser": {"personName": format!("people/{i}")}}}],
                "targets": [{"driveItem": {"name": format!("items/file{i}"), "title": format!("File {i}")}}]
            })
        })
        .collect();
    Mock::given(method("POST"))
        .and(path("/activity/v2/activity:query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "activities": activities,
            "nextPageToken": "more"
        })))
        .mount(&mock_server)
        .await;

    let app = build_test_router(&mock_server);
    let response =
        call_tool(&app, "drive_activity_history", json!({"maxResults": 5000})).await;

    let payload = tool_payload(&response);
    let entries = payload.as_array().unwrap();
    assert_eq!(entries.len(), 200);
    assert_eq!(entries[0]["actionType"], "Edit");
    assert_eq!(entries[0]["targetTitles"], json!(["File 0"]));
}

// ─── Upstream failure surfaces as tool error ─────────────────────────────────

#[tokio::test]
async fn test_upstream_404_surfaces_as_tool_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "File not found: missing",
                      "errors": [{"reason": "notFound"}]}
        })))
        .mount(&mock_server)
        .await;

    let app = build_test_router(&mock_server);
    let response = call_tool(&app, "drive_file_info", json!({"fileId": "missing"})).await;

    let message = tool_error_message(&response);
    assert!(message.contains("not found") || message.contains("notFound"));
}
