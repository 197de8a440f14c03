//! Ring placement math
//!
//! Shards partition the voter-id space (`voter mod N`). Each shard has a home
//! worker equal to its own index and is held by `replication` consecutive ring
//! positions starting there, wrapping modulo N. All functions here are pure;
//! the master and workers must agree on them exactly.

/// Shard that owns a voter id.
pub fn shard_of(voter: u64, workers: u16) -> u16 {
    (voter % workers as u64) as u16
}

/// Worker holding replica `offset` of `shard`.
pub fn replica(shard: u16, offset: u16, workers: u16) -> u16 {
    ((shard as u32 + offset as u32) % workers as u32) as u16
}

/// Worker `offset` positions behind `worker` on the ring.
fn predecessor(worker: u16, offset: u16, workers: u16) -> u16 {
    ((worker as u32 + workers as u32 - offset as u32 % workers as u32) % workers as u32) as u16
}

/// Shards a worker holds, walking backward from its home assignment.
///
/// Worker `w` holds shard `s` exactly when `s + k = w (mod N)` for some
/// replica offset `k`, so the held shards are `w, w-1, .., w-(r-1)`.
pub fn shards_held(worker: u16, replication: u16, workers: u16) -> Vec<u16> {
    (0..replication.min(workers))
        .map(|k| predecessor(worker, k, workers))
        .collect()
}

/// Ring positions within `replication - 1` of `worker` on either side,
/// excluding the worker itself: the peers that co-hold at least one of its
/// shards, and therefore the peers whose watermarks bound what it missed.
pub fn neighbors(worker: u16, replication: u16, workers: u16) -> Vec<u16> {
    let mut out = Vec::new();
    for d in 1..replication {
        for peer in [
            replica(worker, d, workers),
            predecessor(worker, d, workers),
        ] {
            if peer != worker && !out.contains(&peer) {
                out.push(peer);
            }
        }
    }
    out
}
