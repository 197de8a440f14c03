//! Master node: vote routing, aggregation, liveness tracking and repair

pub mod cluster;
pub mod coordinator;
pub mod health;
pub mod http;
pub mod repair;
pub mod server;
pub mod worker_client;

pub use cluster::ClusterView;
pub use coordinator::Coordinator;
pub use health::{HealthMonitor, RepairTask};
pub use repair::Repairer;
pub use server::MasterServer;
pub use worker_client::WorkerClient;
