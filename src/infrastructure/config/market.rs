//! Market, storage and notification settings.

use std::time::Duration;

use serde::Deserialize;

use crate::adapter::outbound::notifier::DEFAULT_SUBSCRIBER_BUFFER;
use crate::application::lock::DEFAULT_LOCK_TIMEOUT;
use crate::domain::money::DEFAULT_STARTING_BALANCE;
use crate::domain::Points;

/// `[database]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite path or `:memory:`.
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "parimarket.db".into(),
        }
    }
}

/// `[market]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Points granted to every new user.
    pub starting_balance: Points,
    /// How long an operation waits for the store lock.
    pub lock_timeout_ms: u64,
}

impl MarketConfig {
    #[must_use]
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            starting_balance: DEFAULT_STARTING_BALANCE,
            lock_timeout_ms: u64::try_from(DEFAULT_LOCK_TIMEOUT.as_millis()).unwrap_or(5_000),
        }
    }
}

/// `[notifications]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Queue depth per live subscriber; overflow is dropped.
    pub subscriber_buffer: usize,
    /// Mirror every notification into the log.
    pub log: bool,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
            log: true,
        }
    }
}
