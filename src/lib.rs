//! # minivote
//!
//! A sharded, replicated vote-tallying service:
//! - Hash-partitioned placement on a fixed worker ring
//! - Best-effort fan-out replication with partial-failure tolerance
//! - Liveness probing and timestamp-driven anti-entropy repair
//! - Append-only write log per worker for durability
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │                 Master                  │
//! │   - routes votes to replica sets        │
//! │   - aggregates per-shard tallies        │
//! │   - probes liveness, drives repair      │
//! └───────────┬─────────────────────────────┘
//!             │ HTTP (fixed-width binary bodies)
//!   ┌─────────┴──────────┬──────────────┐
//!   │                    │              │
//! ┌─▼──────────┐   ┌─────▼──────┐   ┌──▼───────────┐
//! │ Worker 0   │   │ Worker 1   │   │ Worker 2     │
//! │ shard maps │   │ shard maps │   │ shard maps   │
//! │  + log     │   │  + log     │   │  + log       │
//! └────────────┘   └────────────┘   └──────────────┘
//! ```
//!
//! Shard `s` of `N` lives on workers `(s + k) mod N` for
//! `k = 0..replication`. Replication is best-effort: replicas may diverge
//! while a worker is down and are reconciled asynchronously when the health
//! monitor sees it come back.
//!
//! ## Usage
//!
//! ### Start the workers
//! ```bash
//! minivote-worker \
//!   --bind 0.0.0.0:9090 \
//!   --workers host0:9090,host1:9090,host2:9090 \
//!   --candidates 6 \
//!   --data ./worker-data
//! ```
//!
//! ### Start the master
//! ```bash
//! minivote-master \
//!   --bind 0.0.0.0:8000 \
//!   --workers host0:9090,host1:9090,host2:9090 \
//!   --replication 2 \
//!   --candidates 6
//! ```
//!
//! ### Vote and read results
//! ```bash
//! curl -d 'voter=42&candidate=1' http://localhost:8000/vote
//! curl http://localhost:8000/results
//! ```

pub mod common;
pub mod master;
pub mod worker;

// Re-export commonly used types
pub use common::{Config, Error, Result};
pub use master::MasterServer;
pub use worker::WorkerServer;

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
