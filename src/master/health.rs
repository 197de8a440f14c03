//! Worker liveness monitoring and recovery detection
//!
//! A single periodic task probes every worker and owns the liveness flags.
//! A `false -> true` transition is a recovery: the monitor sizes the time
//! window the worker may have missed from its ring neighbors' watermarks and
//! enqueues a repair task. Going dead only clears the flag; the watermark
//! keeps its last value so the next recovery can bound the gap.

use crate::common::ring;
use crate::master::cluster::ClusterView;
use crate::master::worker_client::WorkerClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Time window a recovered worker may have missed. Created once per recovery
/// transition, consumed at most once; tasks are not deduplicated because
/// repair is idempotent through worker duplicate rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepairTask {
    pub worker: u16,
    pub start: i64,
    pub end: i64,
}

pub struct HealthMonitor {
    cluster: Arc<ClusterView>,
    client: WorkerClient,
    replication: u16,
    interval: Duration,
    repair_tx: mpsc::UnboundedSender<RepairTask>,
}

impl HealthMonitor {
    pub fn new(
        cluster: Arc<ClusterView>,
        client: WorkerClient,
        replication: u16,
        interval: Duration,
        repair_tx: mpsc::UnboundedSender<RepairTask>,
    ) -> Self {
        Self {
            cluster,
            client,
            replication,
            interval,
            repair_tx,
        }
    }

    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                ticker.tick().await;
                self.probe_all().await;
            }
        })
    }

    /// One probe cycle over every worker.
    pub async fn probe_all(&self) {
        for worker in 0..self.cluster.len() {
            let was_live = self.cluster.is_live(worker);
            let live = self.client.alive(self.cluster.addr(worker)).await;
            self.cluster.set_live(worker, live);

            if live && !was_live {
                tracing::info!(worker, "worker is live");
                if let Some(task) = repair_window(&self.cluster, worker, self.replication) {
                    tracing::info!(
                        worker,
                        start = task.start,
                        end = task.end,
                        "worker recovered behind its neighbors, scheduling repair"
                    );
                    let _ = self.repair_tx.send(task);
                }
            } else if !live && was_live {
                tracing::warn!(worker, "worker unreachable");
            }
        }
    }
}

/// Missed-write window for a recovered worker: from its own last-known
/// watermark up to the highest watermark among the ring neighbors that
/// co-hold its shards. None when no neighbor has seen a later write;
/// equal watermarks need no repair.
pub fn repair_window(
    cluster: &ClusterView,
    worker: u16,
    replication: u16,
) -> Option<RepairTask> {
    let own = cluster.watermark(worker);
    let max = ring::neighbors(worker, replication, cluster.len())
        .into_iter()
        .map(|peer| cluster.watermark(peer))
        .max()
        .unwrap_or(own);
    (max > own).then_some(RepairTask {
        worker,
        start: own,
        end: max,
    })
}
