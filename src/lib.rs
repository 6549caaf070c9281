//! Parimarket - a closed-pool pari-mutuel prediction market.
//!
//! Users spend points on event outcomes. Odds are each outcome's share of
//! the pool; when an event resolves, holders of the winning outcome split the
//! entire pool in proportion to their shares and collect a fixed bonus.
//!
//! # Architecture
//!
//! The crate is laid out as ports and adapters:
//!
//! - [`domain`] - Records, pricing math and rule violations. No I/O.
//! - [`port`] - Traits for the record store and the notification sink.
//! - [`application`] - The market engine and the lock-holding service.
//! - [`adapter`] - SQLite and in-memory stores, the subscriber broker, the CLI.
//! - [`infrastructure`] - Configuration, logging and wiring.
//! - [`error`] - Error types for the crate.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use parimarket::adapter::outbound::memory::MemoryStore;
//! use parimarket::application::{MarketService, StoreLock};
//! use parimarket::domain::EventKind;
//! use parimarket::port::NullNotifier;
//!
//! let service = MarketService::new(
//!     Arc::new(MemoryStore::new()),
//!     StoreLock::default(),
//!     Arc::new(NullNotifier),
//!     1000,
//! );
//! let alice = service.create_user("alice", false).unwrap();
//! let (event, odds) = service
//!     .create_event("Will it rain?", "", EventKind::Binary, &[])
//!     .unwrap();
//! let trade = service.buy(alice.id, event.id, odds[0].outcome_id, 100).unwrap();
//! assert_eq!(trade.receipt.balance, 900);
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
