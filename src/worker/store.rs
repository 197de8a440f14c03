//! Per-shard idempotent vote store
//!
//! An arena of shard slots, one per ring position. Each slot holds a
//! concurrent `voter -> (candidate, timestamp)` map and a parallel vector of
//! tally counters. Insert-if-absent is atomic per key, so two submitters
//! racing the same voter id resolve to exactly one winner. Accepted records
//! are handed to the write log; startup replay re-applies logged rows through
//! the same insert path so map and tallies match the online sequence.

use crate::common::{Error, Result, VoteRecord};
use crate::worker::wal::WriteLog;
use dashmap::DashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

struct Shard {
    votes: DashMap<u64, (u32, i64)>,
    tally: Vec<AtomicU64>,
}

impl Shard {
    fn new(candidates: u32) -> Self {
        Self {
            votes: DashMap::new(),
            tally: (0..candidates).map(|_| AtomicU64::new(0)).collect(),
        }
    }
}

pub struct ShardStore {
    shards: Vec<Shard>,
    candidates: u32,
    log: WriteLog,
}

impl ShardStore {
    /// Open the store, replaying the append-only log at `path` before any
    /// traffic is served.
    pub fn open(
        path: impl AsRef<Path>,
        workers: u16,
        candidates: u32,
        queue_capacity: usize,
    ) -> Result<Self> {
        let shards: Vec<Shard> = (0..workers).map(|_| Shard::new(candidates)).collect();

        let mut replayed = 0usize;
        let log = WriteLog::open(path, queue_capacity, |record| {
            if apply_insert(&shards, candidates, &record) {
                replayed += 1;
            }
        })?;
        if replayed > 0 {
            tracing::info!(records = replayed, "previous data loaded");
        }

        Ok(Self {
            shards,
            candidates,
            log,
        })
    }

    /// Idempotent insert: rejects a second vote for the same `(shard, voter)`
    /// pair, otherwise updates map and tally and enqueues the record for the
    /// log writer. An enqueue failure is surfaced as a storage error; the
    /// record stays in memory but the caller must treat the write as not
    /// durable.
    pub fn store(&self, record: VoteRecord) -> Result<()> {
        if record.shard as usize >= self.shards.len() {
            return Err(Error::Corrupted(format!(
                "shard {} out of range",
                record.shard
            )));
        }
        if record.candidate >= self.candidates {
            return Err(Error::Corrupted(format!(
                "candidate {} out of range",
                record.candidate
            )));
        }
        if !apply_insert(&self.shards, self.candidates, &record) {
            return Err(Error::Duplicate {
                shard: record.shard,
                voter: record.voter,
            });
        }
        self.log.append(record)
    }

    /// Apply a batch with per-record `store` semantics, continuing past
    /// duplicates (and malformed rows) without aborting. Returns the number
    /// of newly applied records.
    pub fn batch_store(&self, records: &[VoteRecord]) -> Result<usize> {
        let mut applied = 0;
        for record in records {
            match self.store(*record) {
                Ok(()) => applied += 1,
                Err(Error::Duplicate { .. }) | Err(Error::Corrupted(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(applied)
    }

    /// Point-in-time snapshot of a shard's candidate counts.
    pub fn tally(&self, shard: u16) -> Result<Vec<u64>> {
        let shard = self
            .shards
            .get(shard as usize)
            .ok_or_else(|| Error::Corrupted(format!("shard {} out of range", shard)))?;
        Ok(shard
            .tally
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .collect())
    }

    /// Records of `shard` with `start < timestamp < end`, exclusive on both
    /// ends. Read-only; used to serve anti-entropy pulls.
    pub fn resolve(&self, shard: u16, start: i64, end: i64) -> Result<Vec<VoteRecord>> {
        let slot = self
            .shards
            .get(shard as usize)
            .ok_or_else(|| Error::Corrupted(format!("shard {} out of range", shard)))?;
        Ok(slot
            .votes
            .iter()
            .filter(|entry| {
                let ts = entry.value().1;
                start < ts && ts < end
            })
            .map(|entry| VoteRecord {
                shard,
                voter: *entry.key(),
                candidate: entry.value().0,
                timestamp: entry.value().1,
            })
            .collect())
    }

    /// Total number of stored votes across all shards.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.votes.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Block until everything accepted so far is on disk.
    pub fn sync(&self) -> Result<()> {
        self.log.sync()
    }
}

/// Insert-if-absent plus tally increment. Returns false when the voter is
/// already present (or the row doesn't fit this topology, during replay of a
/// log written under a different config).
fn apply_insert(shards: &[Shard], candidates: u32, record: &VoteRecord) -> bool {
    let Some(shard) = shards.get(record.shard as usize) else {
        return false;
    };
    if record.candidate >= candidates {
        return false;
    }
    match shard.votes.entry(record.voter) {
        dashmap::mapref::entry::Entry::Occupied(_) => false,
        dashmap::mapref::entry::Entry::Vacant(slot) => {
            slot.insert((record.candidate, record.timestamp));
            shard.tally[record.candidate as usize].fetch_add(1, Ordering::Relaxed);
            true
        }
    }
}
