//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the market's infrastructure dependencies: the
//! record store and the notification sink.

pub mod notifier;
pub mod store;
