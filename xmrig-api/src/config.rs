use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// A single miner's HTTP API endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MinerEndpoint {
    /// Unique name for the miner, used as the database key
    pub name: String,
    /// IP address or domain of the XMRig HTTP API
    pub host: String,
    pub port: u16,
    /// Bearer token configured as `http.access-token` on the miner
    #[serde(default)]
    pub access_token: Option<String>,
    /// Whether the miner's API is served over TLS
    #[serde(default)]
    pub tls: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl MinerEndpoint {
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
            access_token: None,
            tls: false,
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Base URL of the miner's HTTP API
    pub fn base_url(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

/// Snapshot database configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    /// sqlite:// or postgres:// URL
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://xmrig-api.db".to_string(),
            max_connections: default_max_connections(),
        }
    }
}

/// Background polling configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Seconds between fleet refresh sweeps
    #[serde(default = "default_poll_interval")]
    pub interval_secs: u64,
}

fn default_poll_interval() -> u64 {
    30
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_poll_interval(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Global log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format (json, pretty, compact)
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log format options
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    #[default]
    Compact,
}

/// Top-level configuration for a manager and its miners
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ManagerConfig {
    #[serde(default)]
    pub miners: Vec<MinerEndpoint>,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ManagerConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: ManagerConfig = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for miner in &self.miners {
            if miner.name.is_empty() {
                return Err(Error::Config("Miner name cannot be empty".to_string()));
            }
            if miner.host.is_empty() {
                return Err(Error::Config(format!(
                    "Miner '{}' has an empty host",
                    miner.name
                )));
            }
            if miner.port == 0 {
                return Err(Error::Config(format!(
                    "Miner '{}' has an invalid port",
                    miner.name
                )));
            }
            if !names.insert(miner.name.as_str()) {
                return Err(Error::Config(format!(
                    "Duplicate miner name '{}'",
                    miner.name
                )));
            }
        }

        if let Some(db) = &self.database {
            if !db.url.starts_with("sqlite:") && !db.url.starts_with("postgres:") {
                return Err(Error::Config(format!(
                    "Unsupported database URL scheme: {}",
                    db.url
                )));
            }
            if db.max_connections == 0 {
                return Err(Error::Config(
                    "database.max_connections must be at least 1".to_string(),
                ));
            }
        }

        if self.poll.enabled && self.poll.interval_secs == 0 {
            return Err(Error::Config(
                "poll.interval_secs must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Find a configured miner by name
    pub fn miner(&self, name: &str) -> Option<&MinerEndpoint> {
        self.miners.iter().find(|m| m.name == name)
    }
}
