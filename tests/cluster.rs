//! End-to-end cluster tests: in-process workers behind real HTTP, driven by
//! the master's coordinator, health monitor and repairer.
//!
//! A "down" worker is a bound listener that never serves; probes against it
//! time out. Starting the router on the same listener later brings it back
//! without a port race.

use minivote::common::Error;
use minivote::master::{ClusterView, Coordinator, HealthMonitor, Repairer, WorkerClient};
use minivote::worker::http::{create_router, WorkerState};
use minivote::worker::ShardStore;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tokio::net::TcpListener;

const PROBE_TIMEOUT: Duration = Duration::from_millis(300);
const CANDIDATES: u32 = 3;

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    (listener, addr)
}

fn open_store(dir: &Path, worker: u16, workers: u16) -> Arc<ShardStore> {
    let path = dir.join(format!("w{}", worker)).join("votes.log");
    Arc::new(ShardStore::open(path, workers, CANDIDATES, 4096).unwrap())
}

fn serve(listener: TcpListener, store: Arc<ShardStore>, peers: Arc<Vec<String>>) {
    let state = WorkerState {
        store,
        peers,
        client: reqwest::Client::new(),
    };
    let router = create_router(state);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
}

struct Master {
    cluster: Arc<ClusterView>,
    client: WorkerClient,
    coordinator: Coordinator,
    monitor: HealthMonitor,
    repairer: Repairer,
}

fn master(addrs: Vec<String>, replication: u16) -> Master {
    let cluster = Arc::new(ClusterView::new(addrs));
    let client = WorkerClient::new(PROBE_TIMEOUT);
    let coordinator = Coordinator::new(cluster.clone(), client.clone(), replication, CANDIDATES);
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let monitor = HealthMonitor::new(
        cluster.clone(),
        client.clone(),
        replication,
        Duration::from_secs(1),
        tx,
    );
    let repairer = Repairer::new(
        cluster.clone(),
        client.clone(),
        replication,
        Duration::from_secs(5),
        rx,
    );
    Master {
        cluster,
        client,
        coordinator,
        monitor,
        repairer,
    }
}

#[tokio::test]
async fn test_submit_and_aggregate_replicated() {
    let dir = tempdir().unwrap();
    let mut listeners = Vec::new();
    let mut addrs = Vec::new();
    for _ in 0..3 {
        let (listener, addr) = bind().await;
        listeners.push(listener);
        addrs.push(addr);
    }
    let peers = Arc::new(addrs.clone());
    let stores: Vec<_> = (0..3).map(|w| open_store(dir.path(), w, 3)).collect();
    for (listener, store) in listeners.into_iter().zip(stores.iter()) {
        serve(listener, store.clone(), peers.clone());
    }

    let m = master(addrs.clone(), 2);
    m.monitor.probe_all().await;
    assert_eq!(m.cluster.live_snapshot(), vec![true, true, true]);

    // 12 voters spread over 3 shards, 4 per candidate.
    for voter in 0..12u64 {
        m.coordinator
            .submit_vote(voter, (voter % 3) as u32)
            .await
            .unwrap();
    }

    assert_eq!(m.coordinator.aggregate().await.unwrap(), vec![4, 4, 4]);

    // A second ballot from any voter is refused without touching the tally.
    let err = m.coordinator.submit_vote(5, 0).await.unwrap_err();
    assert!(matches!(err, Error::AlreadyVoted(5)));
    assert_eq!(m.coordinator.aggregate().await.unwrap(), vec![4, 4, 4]);

    // Both replicas of every shard agree.
    for shard in 0..3u16 {
        let primary = m.client.tally(&addrs[shard as usize], shard).await.unwrap();
        let secondary = m
            .client
            .tally(&addrs[(shard as usize + 1) % 3], shard)
            .await
            .unwrap();
        assert_eq!(primary, secondary);
    }
}

#[tokio::test]
async fn test_survives_one_dead_worker() {
    let dir = tempdir().unwrap();
    let (live_listener, live_addr) = bind().await;
    let (_dead_listener, dead_addr) = bind().await;
    let addrs = vec![live_addr, dead_addr];
    let peers = Arc::new(addrs.clone());

    let store = open_store(dir.path(), 0, 2);
    serve(live_listener, store, peers);

    let m = master(addrs, 2);
    m.monitor.probe_all().await;
    assert_eq!(m.cluster.live_snapshot(), vec![true, false]);

    // Worker 0 holds both shards, so every vote still lands somewhere.
    for voter in 0..6u64 {
        m.coordinator
            .submit_vote(voter, (voter % 3) as u32)
            .await
            .unwrap();
    }
    assert_eq!(m.coordinator.aggregate().await.unwrap(), vec![2, 2, 2]);
}

#[tokio::test]
async fn test_unreplicated_shard_without_live_worker() {
    let dir = tempdir().unwrap();
    let (live_listener, live_addr) = bind().await;
    let (_dead_listener, dead_addr) = bind().await;
    let addrs = vec![live_addr, dead_addr];
    let peers = Arc::new(addrs.clone());

    let store = open_store(dir.path(), 0, 2);
    serve(live_listener, store, peers);

    // Replication 1: shard 1 lives only on the dead worker.
    let m = master(addrs, 1);
    m.monitor.probe_all().await;

    m.coordinator.submit_vote(0, 0).await.unwrap();
    let err = m.coordinator.submit_vote(1, 0).await.unwrap_err();
    assert!(matches!(err, Error::Unavailable));

    // Aggregation refuses to return a partial tally.
    let err = m.coordinator.aggregate().await.unwrap_err();
    assert!(matches!(err, Error::InsufficientReplicas { shard: 1 }));
}

#[tokio::test]
async fn test_no_live_worker_at_all() {
    let (_l0, a0) = bind().await;
    let (_l1, a1) = bind().await;

    let m = master(vec![a0, a1], 2);
    // No probe cycle has run; everything is still marked dead.
    let err = m.coordinator.submit_vote(7, 0).await.unwrap_err();
    assert!(matches!(err, Error::Unavailable));
    assert!(m.coordinator.aggregate().await.is_err());
}

#[tokio::test]
async fn test_recovered_worker_is_repaired() {
    let dir = tempdir().unwrap();
    let (l0, a0) = bind().await;
    let (l1, a1) = bind().await;
    let addrs = vec![a0.clone(), a1.clone()];
    let peers = Arc::new(addrs.clone());

    let store0 = open_store(dir.path(), 0, 2);
    let store1 = open_store(dir.path(), 1, 2);
    serve(l0, store0, peers.clone());
    // Worker 1 stays down through the voting phase.

    let mut m = master(addrs, 2);
    m.monitor.probe_all().await;
    assert_eq!(m.cluster.live_snapshot(), vec![true, false]);

    for voter in 0..8u64 {
        m.coordinator
            .submit_vote(voter, (voter % 3) as u32)
            .await
            .unwrap();
    }
    assert!(m.cluster.watermark(0) > 0);
    assert_eq!(m.cluster.watermark(1), 0);

    // Bring worker 1 back on its original listener; the next probe cycle
    // sees the recovery and queues a repair window.
    serve(l1, store1.clone(), peers);
    m.monitor.probe_all().await;
    assert_eq!(m.cluster.live_snapshot(), vec![true, true]);

    m.repairer.drain().await;

    // Worker 1 caught up on both of its shards, including the record at the
    // neighbor's watermark.
    assert_eq!(store1.len(), 8);
    for shard in 0..2u16 {
        let recovered = m.client.tally(&a1, shard).await.unwrap();
        let source = m.client.tally(&a0, shard).await.unwrap();
        assert_eq!(recovered, source);
    }

    // Tallies through the master are unchanged by the repair.
    assert_eq!(m.coordinator.aggregate().await.unwrap(), vec![3, 3, 2]);
}
