//! Worker store persistence tests: restart replay, idempotent re-application
//! of repair batches, and window transfer between replicas.

use minivote::common::{Error, VoteRecord};
use minivote::worker::ShardStore;
use std::path::Path;
use tempfile::tempdir;

const WORKERS: u16 = 4;
const CANDIDATES: u32 = 3;

fn open(dir: &Path, name: &str) -> ShardStore {
    ShardStore::open(dir.join(name).join("votes.log"), WORKERS, CANDIDATES, 4096).unwrap()
}

fn record(voter: u64, candidate: u32, timestamp: i64) -> VoteRecord {
    VoteRecord {
        shard: (voter % WORKERS as u64) as u16,
        voter,
        candidate,
        timestamp,
    }
}

fn all_tallies(store: &ShardStore) -> Vec<Vec<u64>> {
    (0..WORKERS).map(|s| store.tally(s).unwrap()).collect()
}

#[test]
fn test_restart_preserves_tallies_and_uniqueness() {
    let dir = tempdir().unwrap();

    let before = {
        let store = open(dir.path(), "w0");
        for voter in 0..100u64 {
            store
                .store(record(voter, (voter % 3) as u32, 1000 + voter as i64))
                .unwrap();
        }
        // Second ballots are rejected and must stay rejected after restart.
        for voter in 0..100u64 {
            assert!(matches!(
                store.store(record(voter, 0, 5000)),
                Err(Error::Duplicate { .. })
            ));
        }
        store.sync().unwrap();
        all_tallies(&store)
    };

    let store = open(dir.path(), "w0");
    assert_eq!(store.len(), 100);
    assert_eq!(all_tallies(&store), before);
    assert!(matches!(
        store.store(record(42, 1, 9000)),
        Err(Error::Duplicate { .. })
    ));
}

#[test]
fn test_repair_batch_reapplication_is_idempotent() {
    let dir = tempdir().unwrap();
    let batch: Vec<VoteRecord> = (0..40u64)
        .map(|voter| record(voter, (voter % 3) as u32, 100 + voter as i64))
        .collect();

    let before = {
        let store = open(dir.path(), "w1");
        assert_eq!(store.batch_store(&batch).unwrap(), 40);
        store.sync().unwrap();
        all_tallies(&store)
    };

    // A repair retry after a restart pushes the same window again; nothing
    // may double-count.
    let store = open(dir.path(), "w1");
    assert_eq!(store.batch_store(&batch).unwrap(), 0);
    assert_eq!(all_tallies(&store), before);
    assert_eq!(store.len(), 40);
}

#[test]
fn test_resolved_window_transfers_between_replicas() {
    let dir = tempdir().unwrap();
    let source = open(dir.path(), "src");
    let target = open(dir.path(), "dst");

    for voter in [0u64, 4, 8, 12, 16] {
        source
            .store(record(voter, (voter % 3) as u32, 10 + voter as i64))
            .unwrap();
    }
    // The target already has part of the window.
    target.store(record(4, 1, 14)).unwrap();

    let window = source.resolve(0, 0, i64::MAX).unwrap();
    assert_eq!(window.len(), 5);

    let applied = target.batch_store(&window).unwrap();
    assert_eq!(applied, 4);
    assert_eq!(target.tally(0).unwrap(), source.tally(0).unwrap());
}

#[test]
fn test_replay_matches_online_sequence() {
    let dir = tempdir().unwrap();

    // Interleave accepted writes and rejected duplicates, then check that
    // replay rebuilds exactly the accepted set.
    let mut accepted = 0usize;
    {
        let store = open(dir.path(), "w2");
        for i in 0..60u64 {
            let voter = i % 20;
            match store.store(record(voter, (i % 3) as u32, i as i64 + 1)) {
                Ok(()) => accepted += 1,
                Err(Error::Duplicate { .. }) => {}
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        store.sync().unwrap();
    }
    assert_eq!(accepted, 20);

    let store = open(dir.path(), "w2");
    assert_eq!(store.len(), accepted);
    let grand_total: u64 = all_tallies(&store).iter().flatten().sum();
    assert_eq!(grand_total, accepted as u64);
}
