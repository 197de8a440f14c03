//! Worker node: per-shard idempotent vote store over an append-only log

pub mod http;
pub mod server;
pub mod store;
pub mod wal;

pub use server::WorkerServer;
pub use store::ShardStore;
pub use wal::WriteLog;
