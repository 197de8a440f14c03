//! Vote routing and tally aggregation
//!
//! Submission walks a shard's replica set in ring order, skipping workers the
//! health monitor has marked dead. Per-replica outcomes fold into one caller
//! status: the first duplicate anywhere aborts the fan-out, transport
//! failures are skipped, and a submission with zero accepting replicas is
//! unavailable. The coordinator never retries internally.

use crate::common::{ring, Error, Result, VoteRecord};
use crate::master::cluster::ClusterView;
use crate::master::worker_client::WorkerClient;
use std::sync::Arc;

pub struct Coordinator {
    cluster: Arc<ClusterView>,
    client: WorkerClient,
    replication: u16,
    candidates: u32,
}

impl Coordinator {
    pub fn new(
        cluster: Arc<ClusterView>,
        client: WorkerClient,
        replication: u16,
        candidates: u32,
    ) -> Self {
        Self {
            cluster,
            client,
            replication,
            candidates,
        }
    }

    /// Route one vote to the replica set of `voter`'s shard.
    pub async fn submit_vote(&self, voter: u64, candidate: u32) -> Result<()> {
        if candidate >= self.candidates {
            return Err(Error::Validation(format!(
                "candidate {} not on the ballot",
                candidate
            )));
        }

        let n = self.cluster.len();
        let shard = ring::shard_of(voter, n);
        let timestamp = chrono::Utc::now().timestamp_millis();
        let record = VoteRecord {
            shard,
            voter,
            candidate,
            timestamp,
        };

        let mut accepted = 0;
        for offset in 0..self.replication {
            let worker = ring::replica(shard, offset, n);
            if !self.cluster.is_live(worker) {
                continue;
            }
            match self.client.store(self.cluster.addr(worker), &record).await {
                Ok(200) => {
                    accepted += 1;
                    self.cluster.raise_watermark(worker, timestamp);
                }
                // First replica reporting a duplicate aborts the whole
                // fan-out; remaining replicas are not consulted. Workers
                // also answer 400 for rows they cannot place, so a worker
                // configured with a smaller topology than the master would
                // be misread as a duplicate here. Master and worker configs
                // must agree on shard and candidate counts.
                Ok(400) => return Err(Error::AlreadyVoted(voter)),
                Ok(status) => {
                    tracing::debug!(worker, status, "replica rejected store");
                }
                Err(e) => {
                    tracing::debug!(worker, "replica unreachable: {}", e);
                }
            }
        }

        if accepted == 0 {
            return Err(Error::Unavailable);
        }
        tracing::debug!(voter, shard, accepted, "vote submitted");
        Ok(())
    }

    /// Sum every shard's tally, asking one live replica per shard. A shard
    /// with no answering replica fails the whole aggregation; partial
    /// results are never returned silently.
    pub async fn aggregate(&self) -> Result<Vec<u64>> {
        let n = self.cluster.len();
        let mut total = vec![0u64; self.candidates as usize];

        for shard in 0..n {
            let mut fragment = None;
            for offset in 0..self.replication {
                let worker = ring::replica(shard, offset, n);
                if !self.cluster.is_live(worker) {
                    continue;
                }
                match self.client.tally(self.cluster.addr(worker), shard).await {
                    Ok(counts) => {
                        tracing::debug!(shard, worker, "tally fragment");
                        fragment = Some(counts);
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(shard, worker, "tally query failed: {}", e);
                    }
                }
            }
            match fragment {
                Some(counts) => {
                    for (slot, count) in total.iter_mut().zip(counts) {
                        *slot += count;
                    }
                }
                None => return Err(Error::InsufficientReplicas { shard }),
            }
        }

        Ok(total)
    }
}
