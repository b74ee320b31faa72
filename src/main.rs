//! live-serve: a development HTTP server with live reload.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use live_serve::config::loader::load_config;
use live_serve::config::MountConfig;
use live_serve::{LiveServer, ServerConfig, Shutdown};

#[derive(Parser)]
#[command(name = "live-serve", about = "Development HTTP server with live reload")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bind address, e.g. 127.0.0.1:8080.
    #[arg(long)]
    bind: Option<String>,

    /// Serve this directory at the site root (replaces configured mounts).
    #[arg(long)]
    root: Option<PathBuf>,

    /// Disable file watching and script injection.
    #[arg(long)]
    no_reload: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "live_serve=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if let Some(root) = args.root {
        config.mounts = vec![MountConfig {
            route: String::new(),
            dirs: vec![root],
        }];
    }
    if args.no_reload {
        config.live_reload.enabled = false;
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        mounts = config.mounts.len(),
        live_reload = config.live_reload.enabled,
        "configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = LiveServer::new(config)?;

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.trigger();
        }
    });

    server.run(listener, receiver).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
