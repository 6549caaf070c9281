//! Market use cases: the pricing engine and the service around it.

pub mod engine;
pub mod service;

pub use engine::{BuyReceipt, MarketEngine, SellReceipt};
pub use service::{EventDetail, EventSummary, MarketService, Portfolio, PortfolioPosition, Trade};
