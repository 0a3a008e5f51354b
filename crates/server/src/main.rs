use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod api;
mod config;
mod sse;

use config::{AppState, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "gsc-mcp-server")]
#[command(about = "Google Search Console tools over MCP (SSE + REST)", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "gsc-mcp.toml")]
    config: PathBuf,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8000")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gsc=info,tower_http=debug".into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let args = Args::parse();

    tracing::info!("Starting GSC MCP server");

    // Load configuration
    let config = ServerConfig::load(&args.config)?;

    // Authenticate once; failure degrades the server instead of stopping it
    let state = AppState::new(&config);
    if !state.gsc_connected() {
        tracing::warn!("Tool calls will fail until the service account key is fixed and the server restarted");
    }

    let addr = format!("{}:{}", args.host, args.port);
    tracing::info!("Starting API server on {}", addr);

    api::serve(&addr, state).await?;

    Ok(())
}
