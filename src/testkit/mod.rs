//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`notifier`] - [`RecordingNotifier`](notifier::RecordingNotifier), a
//!   notification sink that keeps everything it is handed.
//! - [`domain`] - A seeded in-memory market with two users and a binary event.
//! - [`store`] - [`FlakyStore`](store::FlakyStore), whose reads fail after a
//!   commit.

pub mod domain;
pub mod notifier;
pub mod store;
