//! Google Drive MCP Server
//!
//! An OAuth 2.1 authorization server fronting Google OAuth, wired into an
//! MCP streamable-HTTP endpoint that dispatches authenticated tool calls to
//! the Google Drive and Drive Activity APIs.
//!
//! # Features
//!
//! - **OAuth 2.1 proxy**: RFC 8414/9728/7591 metadata, dynamic client
//!   registration, PKCE (S256), refresh grant; this server mints its own
//!   short-lived authorization codes while the issued tokens are Google's
//! - **18 MCP tools**: search, listing, metadata, sharing, trash, activity
//! - **Signed-URL offload**: downloads, exports and uploads stream directly
//!   between the caller and Drive, never through this server
//! - **In-memory auth state**: a restart invalidates in-flight authorization
//!   flows but leaves issued Google tokens working

pub mod auth;
pub mod config;
pub mod drive;
pub mod error;
pub mod oauth;
pub mod server;
pub mod tools;

pub use config::ServerConfig;
pub use drive::DriveClient;
pub use error::{ClientError, ToolError};
pub use oauth::OAuth2Server;
pub use server::McpServer;
