//! Configuration for minivote components

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Master-specific config
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master: Option<MasterConfig>,

    /// Worker-specific config
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker: Option<WorkerConfig>,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            master: None,
            worker: None,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load `minivote.toml` from the working directory, falling back to
    /// defaults when the file is absent or unreadable.
    pub fn load() -> Self {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("minivote").required(false))
            .build();
        match settings.and_then(|s| s.try_deserialize()) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("config file ignored: {}", e);
                Self::default()
            }
        }
    }
}

/// Master configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterConfig {
    /// Bind address for the HTTP API
    pub bind_addr: SocketAddr,

    /// Ordered worker addresses (`host:port`); defines N and ring order
    pub workers: Vec<String>,

    /// Replication factor (replicas per shard, must not exceed N)
    #[serde(default = "default_replication")]
    pub replication: usize,

    /// Number of candidates on the ballot
    #[serde(default = "default_candidates")]
    pub candidates: u32,

    /// Liveness probe interval
    #[serde(default = "default_probe_interval")]
    pub probe_interval_ms: u64,

    /// Liveness probe timeout
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,

    /// Delay between repair queue drains
    #[serde(default = "default_repair_interval")]
    pub repair_interval_secs: u64,
}

fn default_replication() -> usize {
    1
}
fn default_candidates() -> u32 {
    3
}
fn default_probe_interval() -> u64 {
    1000
}
fn default_probe_timeout() -> u64 {
    700
}
fn default_repair_interval() -> u64 {
    5
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".parse().unwrap(),
            workers: vec!["127.0.0.1:9090".to_string()],
            replication: default_replication(),
            candidates: default_candidates(),
            probe_interval_ms: default_probe_interval(),
            probe_timeout_ms: default_probe_timeout(),
            repair_interval_secs: default_repair_interval(),
        }
    }
}

impl MasterConfig {
    /// Apply CLI overrides on top of file/default values. An absent flag
    /// leaves the existing value untouched; a present flag always wins,
    /// including one that restores a default.
    pub fn override_with(
        &mut self,
        bind_addr: Option<SocketAddr>,
        workers: Option<Vec<String>>,
        replication: Option<usize>,
        candidates: Option<u32>,
    ) {
        if let Some(bind_addr) = bind_addr {
            self.bind_addr = bind_addr;
        }
        if let Some(workers) = workers {
            self.workers = workers;
        }
        if let Some(replication) = replication {
            self.replication = replication;
        }
        if let Some(candidates) = candidates {
            self.candidates = candidates;
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_topology(&self.workers, self.candidates)?;
        if self.replication < 1 || self.replication > self.workers.len() {
            return Err(Error::InvalidConfig(format!(
                "replication factor {} must be between 1 and the worker count {}",
                self.replication,
                self.workers.len()
            )));
        }
        Ok(())
    }
}

/// Worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Bind address for the HTTP API
    pub bind_addr: SocketAddr,

    /// Ordered worker addresses; must match the master's list
    pub workers: Vec<String>,

    /// Number of candidates on the ballot
    #[serde(default = "default_candidates")]
    pub candidates: u32,

    /// Directory holding the append-only vote log
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Bounded write-queue capacity feeding the log writer
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./worker-data")
}
fn default_queue_capacity() -> usize {
    65536
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:9090".parse().unwrap(),
            workers: vec!["127.0.0.1:9090".to_string()],
            candidates: default_candidates(),
            data_dir: default_data_dir(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl WorkerConfig {
    /// Path of the append-only log inside the data directory.
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("votes.log")
    }

    /// Apply CLI overrides on top of file/default values. An absent flag
    /// leaves the existing value untouched.
    pub fn override_with(
        &mut self,
        bind_addr: Option<SocketAddr>,
        workers: Option<Vec<String>>,
        candidates: Option<u32>,
        data_dir: Option<PathBuf>,
    ) {
        if let Some(bind_addr) = bind_addr {
            self.bind_addr = bind_addr;
        }
        if let Some(workers) = workers {
            self.workers = workers;
        }
        if let Some(candidates) = candidates {
            self.candidates = candidates;
        }
        if let Some(data_dir) = data_dir {
            self.data_dir = data_dir;
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_topology(&self.workers, self.candidates)?;
        if self.queue_capacity == 0 {
            return Err(Error::InvalidConfig("queue capacity must be non-zero".into()));
        }
        Ok(())
    }
}

fn validate_topology(workers: &[String], candidates: u32) -> Result<()> {
    if workers.is_empty() {
        return Err(Error::InvalidConfig("worker list is empty".into()));
    }
    if workers.len() > u16::MAX as usize {
        return Err(Error::InvalidConfig("too many workers".into()));
    }
    if candidates == 0 {
        return Err(Error::InvalidConfig("candidate count must be non-zero".into()));
    }
    Ok(())
}
