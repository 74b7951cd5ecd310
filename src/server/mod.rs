//! MCP HTTP server assembly and lifecycle.

pub mod auth_middleware;
pub mod transport;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ServerConfig, api};
use crate::oauth::{OAuth2Server, UpstreamCredentials};
use crate::tools;

use transport::HttpState;

/// Drain deadline after a shutdown signal.
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(10);

/// The MCP HTTP Streamable server for Google Drive.
pub struct McpServer {
    config: ServerConfig,
    state: Arc<HttpState>,
}

impl McpServer {
    /// Create and configure the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: ServerConfig, creds: UpstreamCredentials) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(api::REQUEST_TIMEOUT)
            .connect_timeout(api::CONNECT_TIMEOUT)
            .gzip(true)
            .build()?;

        let oauth = Arc::new(OAuth2Server::new(
            &config.base_url,
            creds,
            &config.endpoints,
            http.clone(),
        ));

        let state = Arc::new(HttpState {
            tools: tools::register_all_tools(),
            oauth,
            http,
            endpoints: config.endpoints.clone(),
        });

        Ok(Self { config, state })
    }

    /// Run the server until a shutdown signal arrives, then drain in-flight
    /// requests for at most 10 seconds.
    ///
    /// # Errors
    ///
    /// Returns an error on bind or serve failure.
    pub async fn run(self) -> anyhow::Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let router = transport::create_router(Arc::clone(&self.state));

        tracing::info!(
            %addr,
            base_url = %self.config.base_url,
            tools = self.state.tools.len(),
            "starting MCP server"
        );

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let mut server = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        tokio::select! {
            result = &mut server => {
                result??;
                return Ok(());
            }
            () = shutdown_signal() => {
                tracing::info!("shutdown signal received, shutting down gracefully");
            }
        }

        let _ = shutdown_tx.send(());
        match tokio::time::timeout(SHUTDOWN_DEADLINE, &mut server).await {
            Ok(result) => result??,
            Err(_) => {
                tracing::warn!("drain deadline exceeded, aborting in-flight requests");
                server.abort();
            }
        }

        tracing::info!("server stopped");
        Ok(())
    }
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
