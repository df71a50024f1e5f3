use thiserror::Error;

/// Core error types for the XMRig API client
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Manager error: {0}")]
    Manager(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Api(_) => true,
            Error::Connection(_) => true,
            Error::Database(_) => true,
            Error::Io(_) => true,
            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::Api(_) => "api",
            Error::Authorization(_) => "authorization",
            Error::Connection(_) => "connection",
            Error::Database(_) => "database",
            Error::Manager(_) => "manager",
            Error::Serialization(_) => "serialization",
            Error::Url(_) => "url",
            Error::Io(_) => "io",
        }
    }
}
