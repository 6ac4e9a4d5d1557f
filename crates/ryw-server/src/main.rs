//! ryw Server binary
//!
//! Serves the status API behind the transactional consistency middleware.

use axum::Router;
use clap::Parser;
use ryw_server::{RywServer, config::Config};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// ryw Server CLI arguments
#[derive(Parser, Debug)]
#[command(name = "ryw-server")]
#[command(about = "Read-your-writes consistency server for replicated SQLite", long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Path to a TOML config file (defaults to ./ryw.toml when present)
    #[arg(long, env = "RYW_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let rt = tokio::runtime::Builder::new_multi_thread()
        .thread_name("ryw-worker")
        .enable_all()
        .build()?;

    let filter = if args.verbose {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "ryw_server=debug,ryw_core=debug,tower_http=debug".into())
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "ryw_server=info,ryw_core=warn,tower_http=warn".into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    rt.block_on(async_main(args))
}

async fn async_main(args: Args) -> anyhow::Result<()> {
    let config = Config::from_env(args.config.as_deref())?;
    let server = Arc::new(RywServer::from_config(&config)?);

    let info = server.engine.resolver().resolve().await;
    info!(
        instance = %info.current_instance,
        primary = %info.primary_instance,
        is_primary = info.current_is_primary,
        marker = ?server.engine.resolver().marker_path(),
        rendering = ?server.rendering,
        "Resolved replication role"
    );

    let app: Router = ryw_server::router(server).layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&config.addr).await?;
    info!("ryw Server listening on {}", config.addr);

    axum::serve(listener, app).await?;

    Ok(())
}
