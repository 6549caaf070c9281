//! SQLite persistence adapter.
//!
//! Provides a [`RecordStore`](crate::port::outbound::store::RecordStore)
//! backed by SQLite through Diesel, with embedded migrations.

pub mod database;
pub mod store;

pub use store::SqliteStore;
