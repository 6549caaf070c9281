//! Infrastructure bootstrap helpers for runtime wiring.

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::notifier::Broker;
use crate::adapter::outbound::sqlite::SqliteStore;
use crate::application::lock::StoreLock;
use crate::application::market::MarketService;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::notifier::{LogNotifier, NotifierRegistry};
use crate::port::outbound::store::RecordStore;

/// A wired market: the service plus the broker live subscribers attach to.
pub struct Market<S> {
    pub service: MarketService<S>,
    pub broker: Arc<Broker>,
}

/// Build notifier registry from configuration.
pub(crate) fn build_notifier_registry(config: &Config, broker: Arc<Broker>) -> NotifierRegistry {
    let mut registry = NotifierRegistry::new();
    registry.register(Box::new(broker));
    if config.notifications.log {
        registry.register(Box::new(LogNotifier));
    }
    registry
}

/// Wire a market service over any record store.
pub fn build_market<S: RecordStore>(config: &Config, store: Arc<S>) -> Market<S> {
    let broker = Arc::new(Broker::new(config.notifications.subscriber_buffer));
    let notifier = Arc::new(build_notifier_registry(config, Arc::clone(&broker)));
    let lock = StoreLock::new(config.market.lock_timeout());
    let service = MarketService::new(store, lock, notifier, config.market.starting_balance);
    Market { service, broker }
}

/// Open the configured SQLite database and wire a market over it.
///
/// # Errors
/// Returns an error if the database cannot be opened or migrated.
pub fn open_market(config: &Config) -> Result<Market<SqliteStore>> {
    let store = Arc::new(SqliteStore::open(&config.database.url)?);
    info!(database = %config.database.url, "Market store opened");
    Ok(build_market(config, store))
}
