//! Master binary

use clap::Parser;
use minivote::common::Config;
use minivote::MasterServer;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "minivote-master")]
#[command(about = "minivote master - routes votes and aggregates tallies")]
struct Args {
    /// Bind address for HTTP [default: 0.0.0.0:8000]
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Worker addresses in ring order (comma-separated host:port)
    #[arg(long, value_delimiter = ',')]
    workers: Option<Vec<String>>,

    /// Replication factor [default: 1]
    #[arg(long)]
    replication: Option<usize>,

    /// Number of candidates on the ballot [default: 3]
    #[arg(long)]
    candidates: Option<u32>,

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
    let mut config = Config::load().master.unwrap_or_default();
    config.override_with(args.bind, args.workers, args.replication, args.candidates);

    MasterServer::new(config).serve().await?;

    Ok(())
}
