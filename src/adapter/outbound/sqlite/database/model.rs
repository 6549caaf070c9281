//! Database model types for Diesel ORM.
//!
//! Timestamps are RFC 3339 text and decimals are their canonical string
//! form; conversion to domain types happens in the store.

use diesel::prelude::*;

use super::schema::{activity, events, odds_snapshots, outcomes, positions, transactions, users};

/// Database row for a user.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub balance: i64,
    pub is_admin: bool,
    pub created_at: String,
}

/// Database row for a user (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = users)]
pub struct NewUserRow {
    pub username: String,
    pub balance: i64,
    pub is_admin: bool,
    pub created_at: String,
}

/// Database row for an event.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EventRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub kind: String,
    pub status: String,
    pub winning_outcome_id: Option<i64>,
    pub created_at: String,
    pub resolved_at: Option<String>,
}

/// Database row for an event (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = events)]
pub struct NewEventRow {
    pub title: String,
    pub description: String,
    pub kind: String,
    pub status: String,
    pub created_at: String,
}

/// Database row for an outcome.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = outcomes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OutcomeRow {
    pub id: i64,
    pub event_id: i64,
    pub label: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = outcomes)]
pub struct NewOutcomeRow {
    pub event_id: i64,
    pub label: String,
}

/// Database row for a position.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = positions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PositionRow {
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub outcome_id: i64,
    pub shares: String,
    pub avg_price: String,
    pub created_at: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = positions)]
pub struct NewPositionRow {
    pub user_id: i64,
    pub event_id: i64,
    pub outcome_id: i64,
    pub shares: String,
    pub avg_price: String,
    pub created_at: String,
}

/// Database row for a ledger entry.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionRow {
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub outcome_id: i64,
    pub kind: String,
    pub shares: String,
    pub points: i64,
    pub created_at: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = transactions)]
pub struct NewTransactionRow {
    pub user_id: i64,
    pub event_id: i64,
    pub outcome_id: i64,
    pub kind: String,
    pub shares: String,
    pub points: i64,
    pub created_at: String,
}

/// Database row for an odds snapshot.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = odds_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SnapshotRow {
    pub id: i64,
    pub event_id: i64,
    pub outcome_id: i64,
    pub odds: String,
    pub created_at: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = odds_snapshots)]
pub struct NewSnapshotRow {
    pub event_id: i64,
    pub outcome_id: i64,
    pub odds: String,
    pub created_at: String,
}

/// Database row for an activity feed entry.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = activity)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ActivityRow {
    pub id: i64,
    pub kind: String,
    pub message: String,
    pub user_id: Option<i64>,
    pub event_id: Option<i64>,
    pub created_at: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = activity)]
pub struct NewActivityRow {
    pub kind: String,
    pub message: String,
    pub user_id: Option<i64>,
    pub event_id: Option<i64>,
    pub created_at: String,
}
