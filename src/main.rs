//! radarr-sonarr-mcp - MCP server for Radarr and Sonarr

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use radarr_sonarr_mcp::cli::Args;
use radarr_sonarr_mcp::config::{load_config, TransportKind};
use radarr_sonarr_mcp::mcp::{stdio, McpServer, SseServer};
use radarr_sonarr_mcp::tools::ArrTools;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the protocol in stdio mode
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("Server error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let settings = args.settings()?;
    let config = Arc::new(load_config(&args.config)?);

    if !config.radarr_config.has_api_key() {
        warn!("Radarr API key is not configured; Radarr tools will fail");
    }
    if !config.sonarr_config.has_api_key() {
        warn!("Sonarr API key is not configured; Sonarr tools will fail");
    }
    info!(
        "Starting radarr-sonarr-mcp {} (transport={}, read_only={})",
        env!("CARGO_PKG_VERSION"),
        settings.transport,
        config.read_only
    );

    let tools = Arc::new(ArrTools::new(config)?);
    let server = McpServer::new(tools);

    match settings.transport {
        TransportKind::Sse => {
            let addr = settings.socket_addr().await?;
            Arc::new(SseServer::new(server))
                .run(addr, shutdown_signal())
                .await
        }
        TransportKind::Stdio => stdio::run(&server, args.framing_mode()).await,
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix (container stop)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("Shutdown signal received");
}
