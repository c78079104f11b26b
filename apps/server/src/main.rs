mod config;
mod log_sender;

use anyhow::Result;
use clap::Parser;
use config::ServerConfig;
use log_sender::LogSender;
use std::path::PathBuf;
use std::sync::Arc;
use stream_server::{ChatRegistry, ControlServer, StreamManager};
use tokio::sync::RwLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug, Clone)]
#[command(name = "sdrcast", about = "Adaptive-gain audio streaming server")]
struct Args {
    /// Path to the TOML config file
    #[arg(long, default_value = "sdrcast.toml")]
    config: PathBuf,

    /// Control API address, overrides the config file
    #[arg(long)]
    listen: Option<String>,

    /// Log filter, e.g. "info,stream_server=debug"
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = match &args.log {
        Some(directives) => tracing_subscriber::EnvFilter::new(directives),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info,sdrcast=debug".into()),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting sdrcast {}", env!("CARGO_PKG_VERSION"));

    let mut config = ServerConfig::load(&args.config)?;
    if let Some(listen) = args.listen {
        config.listen = listen;
        config.validate()?;
    }
    tracing::debug!("Effective config: {:?}", config);
    tracing::info!(
        "AGC target {} dBFS, attack {} ms, release {} ms, look-ahead {} samples at {} Hz",
        config.agc.target_level_db,
        config.agc.attack_ms,
        config.agc.release_ms,
        config.agc.look_ahead_samples(),
        config.agc.sample_rate
    );

    let streams = Arc::new(RwLock::new(StreamManager::new(config.agc.clone())?));
    let chat = Arc::new(ChatRegistry::new(config.chat.clone(), Arc::new(LogSender))?);

    let mut server = ControlServer::new(config.listen_addr()?, streams, chat);
    server.start().await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    server.stop().await;

    Ok(())
}
