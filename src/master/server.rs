//! Master server

use crate::common::{MasterConfig, Result};
use crate::master::cluster::ClusterView;
use crate::master::coordinator::Coordinator;
use crate::master::health::HealthMonitor;
use crate::master::http::{create_router, MasterState};
use crate::master::repair::Repairer;
use crate::master::worker_client::WorkerClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub struct MasterServer {
    config: MasterConfig,
}

impl MasterServer {
    pub fn new(config: MasterConfig) -> Self {
        Self { config }
    }

    pub async fn serve(self) -> Result<()> {
        self.config.validate()?;
        let replication = self.config.replication as u16;

        tracing::info!("Starting master server");
        tracing::info!("  HTTP API: {}", self.config.bind_addr);
        tracing::info!("  Workers: {:?}", self.config.workers);
        tracing::info!("  Replication: {}", self.config.replication);
        tracing::info!("  Candidates: {}", self.config.candidates);

        let cluster = Arc::new(ClusterView::new(self.config.workers.clone()));
        let client = WorkerClient::new(Duration::from_millis(self.config.probe_timeout_ms));
        let coordinator = Arc::new(Coordinator::new(
            cluster.clone(),
            client.clone(),
            replication,
            self.config.candidates,
        ));

        let (repair_tx, repair_rx) = mpsc::unbounded_channel();
        let monitor = HealthMonitor::new(
            cluster.clone(),
            client.clone(),
            replication,
            Duration::from_millis(self.config.probe_interval_ms),
            repair_tx,
        );
        let _health_handle = monitor.spawn();

        // With a single replica per shard there is no peer to repair from.
        if replication > 1 {
            let repairer = Repairer::new(
                cluster.clone(),
                client,
                replication,
                Duration::from_secs(self.config.repair_interval_secs),
                repair_rx,
            );
            let _repair_handle = repairer.spawn();
        }

        let state = MasterState {
            coordinator,
            cluster,
        };
        let router = create_router(state);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!("✓ Master ready");

        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await?;

        Ok(())
    }
}
