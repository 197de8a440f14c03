//! Worker binary

use clap::Parser;
use minivote::common::Config;
use minivote::WorkerServer;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "minivote-worker")]
#[command(about = "minivote worker - durable shard store node")]
struct Args {
    /// Bind address for HTTP [default: 0.0.0.0:9090]
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Worker addresses in ring order (comma-separated host:port)
    #[arg(long, value_delimiter = ',')]
    workers: Option<Vec<String>>,

    /// Number of candidates on the ballot [default: 3]
    #[arg(long)]
    candidates: Option<u32>,

    /// Data directory for the append-only vote log [default: ./worker-data]
    #[arg(long)]
    data: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // File config first, then CLI flags where given.
    let mut config = Config::load().worker.unwrap_or_default();
    config.override_with(args.bind, args.workers, args.candidates, args.data);

    WorkerServer::new(config).serve().await?;

    Ok(())
}
