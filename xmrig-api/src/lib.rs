//! Client library for the XMRig miner HTTP API.
//!
//! Wraps the daemon's `/2/summary`, `/2/backends` and `/2/config` endpoints
//! and its JSON-RPC control methods behind typed models, with optional
//! snapshot persistence to SQLite or PostgreSQL and a manager for driving a
//! fleet of miners.

pub mod client;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod manager;
pub mod models;
pub mod poller;

pub use client::{ControlAction, Endpoint, XmrigClient};
pub use config::{
    DatabaseConfig, LogFormat, LoggingConfig, ManagerConfig, MinerEndpoint, PollConfig,
};
pub use database::{Snapshot, SnapshotStore, StoreStats};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use manager::MinerManager;
pub use models::{Backends, MinerConfig, Summary};
pub use poller::Poller;

#[cfg(test)]
mod database_integration_tests;
