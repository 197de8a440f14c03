//! Shared cluster view on the master
//!
//! Two arrays of per-worker state with one writer each:
//!
//! - liveness flags: written only by the health monitor, read lock-free by
//!   the coordinator and repairer. Staleness only delays routing decisions.
//! - recency watermarks: the highest store timestamp each worker has
//!   acknowledged, raised only by the coordinator via atomic max so racing
//!   replica acks never lose an update. Read by the health monitor to size
//!   repair windows. Not persisted; reset on master restart.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

pub struct ClusterView {
    workers: Vec<String>,
    live: Vec<AtomicBool>,
    watermarks: Vec<AtomicI64>,
}

impl ClusterView {
    /// All workers start out not-live; the first probe cycle fills the flags
    /// in, and the first acknowledged writes rebuild the watermarks.
    pub fn new(workers: Vec<String>) -> Self {
        let n = workers.len();
        Self {
            workers,
            live: (0..n).map(|_| AtomicBool::new(false)).collect(),
            watermarks: (0..n).map(|_| AtomicI64::new(0)).collect(),
        }
    }

    /// Ring size N.
    pub fn len(&self) -> u16 {
        self.workers.len() as u16
    }

    pub fn addr(&self, worker: u16) -> &str {
        &self.workers[worker as usize]
    }

    pub fn is_live(&self, worker: u16) -> bool {
        self.live[worker as usize].load(Ordering::Relaxed)
    }

    /// Health monitor only.
    pub fn set_live(&self, worker: u16, live: bool) {
        self.live[worker as usize].store(live, Ordering::Relaxed);
    }

    pub fn live_snapshot(&self) -> Vec<bool> {
        self.live.iter().map(|l| l.load(Ordering::Relaxed)).collect()
    }

    pub fn watermark(&self, worker: u16) -> i64 {
        self.watermarks[worker as usize].load(Ordering::Relaxed)
    }

    /// Coordinator only: raise a worker's watermark to `timestamp` if higher.
    pub fn raise_watermark(&self, worker: u16, timestamp: i64) {
        self.watermarks[worker as usize].fetch_max(timestamp, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> ClusterView {
        ClusterView::new(vec!["a:1".into(), "b:1".into(), "c:1".into()])
    }

    #[test]
    fn test_workers_start_dead_with_zero_watermark() {
        let cluster = view();
        assert_eq!(cluster.len(), 3);
        for w in 0..3 {
            assert!(!cluster.is_live(w));
            assert_eq!(cluster.watermark(w), 0);
        }
    }

    #[test]
    fn test_watermark_is_monotonic() {
        let cluster = view();
        cluster.raise_watermark(1, 100);
        cluster.raise_watermark(1, 50);
        assert_eq!(cluster.watermark(1), 100);
        cluster.raise_watermark(1, 150);
        assert_eq!(cluster.watermark(1), 150);
    }

    #[test]
    fn test_liveness_flip() {
        let cluster = view();
        cluster.set_live(2, true);
        assert!(cluster.is_live(2));
        assert_eq!(cluster.live_snapshot(), vec![false, false, true]);
        cluster.set_live(2, false);
        assert!(!cluster.is_live(2));
    }
}
