//! Notification adapters.
//!
//! Implements the `port::Notifier` trait for push delivery to live
//! subscribers.

pub mod broker;

pub use broker::{Broker, Subscription, DEFAULT_SUBSCRIBER_BUFFER};
