//! Worker server

use crate::common::{Result, WorkerConfig};
use crate::worker::http::{create_router, WorkerState};
use crate::worker::store::ShardStore;
use std::sync::Arc;

pub struct WorkerServer {
    config: WorkerConfig,
}

impl WorkerServer {
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    pub async fn serve(self) -> Result<()> {
        self.config.validate()?;

        tracing::info!("Starting worker server");
        tracing::info!("  HTTP API: {}", self.config.bind_addr);
        tracing::info!("  Ring size: {}", self.config.workers.len());
        tracing::info!("  Candidates: {}", self.config.candidates);
        tracing::info!("  Log path: {}", self.config.log_path().display());

        // Replay the log and start the writer before serving traffic.
        let store = Arc::new(ShardStore::open(
            self.config.log_path(),
            self.config.workers.len() as u16,
            self.config.candidates,
            self.config.queue_capacity,
        )?);

        let state = WorkerState {
            store,
            peers: Arc::new(self.config.workers.clone()),
            client: reqwest::Client::new(),
        };
        let router = create_router(state);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!("✓ Worker ready");

        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await?;

        Ok(())
    }
}
