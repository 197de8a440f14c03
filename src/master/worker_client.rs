//! HTTP client for worker endpoints
//!
//! Binary request bodies per `common::record`. Probes and tally queries use
//! the short probe timeout; store and resolve get longer budgets. Transport
//! failures surface as errors here and are absorbed by the callers: a dead
//! replica is a routing fact, not a request failure.

use crate::common::{Error, ResolveRequest, Result, VoteRecord};
use std::time::Duration;

const STORE_TIMEOUT: Duration = Duration::from_secs(2);
const RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct WorkerClient {
    client: reqwest::Client,
    probe_timeout: Duration,
}

impl WorkerClient {
    pub fn new(probe_timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            probe_timeout,
        }
    }

    /// Send one record to a worker's store endpoint; returns the raw status
    /// code (200 accepted, 400 duplicate, 507 not durable).
    pub async fn store(&self, addr: &str, record: &VoteRecord) -> Result<u16> {
        let resp = self
            .client
            .post(format!("http://{}/store", addr))
            .body(record.encode().to_vec())
            .timeout(STORE_TIMEOUT)
            .send()
            .await?;
        Ok(resp.status().as_u16())
    }

    /// Query one shard's tally; parses the comma-separated count vector.
    pub async fn tally(&self, addr: &str, shard: u16) -> Result<Vec<u64>> {
        let resp = self
            .client
            .post(format!("http://{}/results", addr))
            .body(shard.to_be_bytes().to_vec())
            .timeout(self.probe_timeout)
            .send()
            .await?;
        if resp.status().as_u16() != 200 {
            return Err(Error::Http(format!(
                "results query returned {}",
                resp.status()
            )));
        }
        let text = resp.text().await?;
        text.split(',')
            .map(|field| {
                field
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| Error::Corrupted(format!("bad tally fragment: {}", text)))
            })
            .collect()
    }

    /// Liveness probe; any transport failure or non-200 counts as dead.
    pub async fn alive(&self, addr: &str) -> bool {
        match self
            .client
            .get(format!("http://{}/alive", addr))
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(resp) => resp.status().as_u16() == 200,
            Err(_) => false,
        }
    }

    /// Ask a worker to push a missed window to a recovered peer.
    pub async fn resolve(&self, addr: &str, req: &ResolveRequest) -> Result<u16> {
        let resp = self
            .client
            .post(format!("http://{}/resolve", addr))
            .body(req.encode().to_vec())
            .timeout(RESOLVE_TIMEOUT)
            .send()
            .await?;
        Ok(resp.status().as_u16())
    }
}
