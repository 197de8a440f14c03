//! Common utilities and types shared across minivote

pub mod config;
pub mod error;
pub mod record;
pub mod ring;

pub use config::{Config, MasterConfig, WorkerConfig};
pub use error::{Error, Result};
pub use record::{ResolveRequest, VoteRecord, RECORD_LEN, RESOLVE_LEN};
