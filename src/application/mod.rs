//! Application services (use cases).
//!
//! These services orchestrate domain logic and coordinate adapters
//! to implement the market's use cases.

pub mod lock;
pub mod market;

pub use lock::StoreLock;
pub use market::{MarketEngine, MarketService};
