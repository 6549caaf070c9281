//! Infrastructure configuration modules.

pub mod logging;
pub mod market;
pub mod settings;

pub use logging::LoggingConfig;
pub use market::{DatabaseConfig, MarketConfig, NotificationsConfig};
pub use settings::Config;
