//! Google Drive MCP server - entry point.

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use gdrive_mcp::config::{ServerConfig, api};
use gdrive_mcp::oauth::load_credentials;
use gdrive_mcp::server::McpServer;

#[derive(Parser, Debug)]
#[command(name = "gdrive-mcp")]
#[command(about = "MCP HTTP Streamable server exposing Google Drive operations for AI agents")]
#[command(version)]
struct Cli {
    /// Server port
    #[arg(long, default_value = "8080", env = "PORT")]
    port: u16,

    /// Server host
    #[arg(long, default_value = "0.0.0.0", env = "HOST")]
    host: String,

    /// External base URL (defaults to http://localhost:<port>)
    #[arg(long, env = "BASE_URL")]
    base_url: Option<String>,

    /// GCP Secret Manager secret name holding the OAuth client credentials
    #[arg(long, env = "SECRET_NAME")]
    secret_name: Option<String>,

    /// GCP project ID for Secret Manager
    #[arg(long, env = "SECRET_PROJECT")]
    secret_project: Option<String>,

    /// Path to a local OAuth credentials file
    #[arg(long, env = "CREDENTIAL_FILE")]
    credential_file: Option<String>,

    /// Log level (debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if std::env::var("ENVIRONMENT").as_deref() == Ok("prd") {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level);

    let mut config = ServerConfig::new(cli.host, cli.port, cli.base_url);
    config.secret_name = cli.secret_name;
    config.secret_project = cli.secret_project;
    config.credential_file = cli.credential_file;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.base_url,
        "starting gdrive MCP server"
    );

    // Credential load is fatal: the OAuth proxy cannot run without the
    // Google client credentials.
    let http = reqwest::Client::builder()
        .timeout(api::REQUEST_TIMEOUT)
        .connect_timeout(api::CONNECT_TIMEOUT)
        .build()?;
    let creds = load_credentials(
        config.secret_name.as_deref(),
        config.secret_project.as_deref(),
        config.credential_file.as_deref(),
        &config.endpoints,
        &http,
    )
    .await?;

    McpServer::new(config, creds)?.run().await
}
