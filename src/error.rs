use std::time::Duration;

use thiserror::Error;

use crate::domain::error::MarketError;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Market(#[from] MarketError),

    #[error("timed out after {0:?} waiting for the store lock")]
    LockTimeout(Duration),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("parse error: {0}")]
    Parse(String),

    /// A record the operation depends on vanished or is inconsistent.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Return true for caller mistakes (4xx-class), false for
    /// infrastructure failures (5xx-class).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Market(_))
    }

    /// The domain rule violation, if this is one.
    #[must_use]
    pub fn market_error(&self) -> Option<&MarketError> {
        match self {
            Self::Market(e) => Some(e),
            _ => None,
        }
    }
}

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        Self::Database(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
