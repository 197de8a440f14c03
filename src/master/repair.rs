//! Anti-entropy repair of recovered workers
//!
//! Consumes repair tasks from the health monitor on a fixed delay. For each
//! shard the recovered worker holds, a currently-live co-holding neighbor is
//! asked to push the missed window directly to it. First success per shard
//! wins; when no neighbor can serve, the condition is logged and the task
//! dropped. The window is then lost unless a future recovery cycle widens it.
//! Only runs when the replication factor is above one.

use crate::common::{ring, ResolveRequest};
use crate::master::cluster::ClusterView;
use crate::master::health::RepairTask;
use crate::master::worker_client::WorkerClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub struct Repairer {
    cluster: Arc<ClusterView>,
    client: WorkerClient,
    replication: u16,
    interval: Duration,
    rx: mpsc::UnboundedReceiver<RepairTask>,
}

impl Repairer {
    pub fn new(
        cluster: Arc<ClusterView>,
        client: WorkerClient,
        replication: u16,
        interval: Duration,
        rx: mpsc::UnboundedReceiver<RepairTask>,
    ) -> Self {
        Self {
            cluster,
            client,
            replication,
            interval,
            rx,
        }
    }

    pub fn spawn(mut self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                ticker.tick().await;
                self.drain().await;
            }
        })
    }

    /// Process everything queued since the last cycle.
    pub async fn drain(&mut self) {
        while let Ok(task) = self.rx.try_recv() {
            self.run_task(task).await;
        }
    }

    async fn run_task(&self, task: RepairTask) {
        let n = self.cluster.len();
        tracing::info!(
            worker = task.worker,
            start = task.start,
            end = task.end,
            "repairing recovered worker"
        );

        for shard in ring::shards_held(task.worker, self.replication, n) {
            // The watermark itself is the newest acknowledged write, and the
            // store window is exclusive on both ends, so the push window is
            // widened by one tick to cover the record at the watermark.
            let req = ResolveRequest {
                target: task.worker,
                shard,
                start: task.start,
                end: task.end.saturating_add(1),
            };

            let mut repaired = false;
            for offset in 0..self.replication {
                let source = ring::replica(shard, offset, n);
                if source == task.worker || !self.cluster.is_live(source) {
                    continue;
                }
                match self.client.resolve(self.cluster.addr(source), &req).await {
                    Ok(200) => {
                        tracing::debug!(worker = task.worker, shard, source, "shard repaired");
                        repaired = true;
                        break;
                    }
                    Ok(status) => {
                        tracing::debug!(shard, source, status, "repair source refused");
                    }
                    Err(e) => {
                        tracing::debug!(shard, source, "repair source unreachable: {}", e);
                    }
                }
            }

            if !repaired {
                tracing::error!(
                    worker = task.worker,
                    shard,
                    "no live replica could serve repair; increase the replication factor"
                );
            }
        }
    }
}
