//! SQLite record store implementation.
//!
//! Persists every market table with Diesel. [`RecordStore::commit`] runs the
//! whole changeset inside one SQLite transaction.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::SqliteConnection;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::adapter::outbound::sqlite::database::connection::{
    configure_sqlite_connection, create_pool, run_migrations, DbPool,
};
use crate::adapter::outbound::sqlite::database::model::{
    ActivityRow, EventRow, NewActivityRow, NewEventRow, NewOutcomeRow, NewPositionRow,
    NewSnapshotRow, NewTransactionRow, NewUserRow, OutcomeRow, PositionRow, SnapshotRow,
    TransactionRow, UserRow,
};
use crate::adapter::outbound::sqlite::database::schema::{
    activity, events, odds_snapshots, outcomes, positions, transactions, users,
};
use crate::domain::{
    ActivityEntry, ActivityId, Event, EventId, EventStatus, MarketError, NewActivity, NewEvent,
    NewOutcome, NewPosition, NewSnapshot, NewTransaction, NewUser, OddsSnapshot, Outcome, OutcomeId, Position,
    PositionId, SnapshotId, Transaction, TransactionId, User, UserId,
};
use crate::error::{Error, Result};
use crate::port::outbound::store::{
    ActivityStore, Changeset, EventStore, OutcomeStore, PositionChange, PositionStore,
    RecordStore, SnapshotStore, TransactionStore, UserStore,
};

type Conn = PooledConnection<ConnectionManager<SqliteConnection>>;

#[derive(QueryableByName)]
struct LastInsertRowId {
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    #[diesel(column_name = "id")]
    id: i64,
}

fn last_insert_id(conn: &mut SqliteConnection) -> Result<i64> {
    Ok(diesel::sql_query("SELECT last_insert_rowid() AS id")
        .get_result::<LastInsertRowId>(conn)?
        .id)
}

fn format_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .map_err(|e| Error::Parse(e.to_string()))?
        .with_timezone(&Utc))
}

fn parse_decimal(raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw).map_err(|e| Error::Parse(e.to_string()))
}

fn parse_enum<T: FromStr<Err = String>>(raw: &str) -> Result<T> {
    raw.parse().map_err(Error::Parse)
}

fn user_from_row(row: UserRow) -> Result<User> {
    Ok(User {
        id: UserId::new(row.id),
        username: row.username,
        balance: row.balance,
        is_admin: row.is_admin,
        created_at: parse_time(&row.created_at)?,
    })
}

fn event_from_row(row: EventRow) -> Result<Event> {
    Ok(Event {
        id: EventId::new(row.id),
        title: row.title,
        description: row.description,
        kind: parse_enum(&row.kind)?,
        status: parse_enum(&row.status)?,
        winning_outcome_id: row.winning_outcome_id.map(OutcomeId::new),
        created_at: parse_time(&row.created_at)?,
        resolved_at: row.resolved_at.as_deref().map(parse_time).transpose()?,
    })
}

fn outcome_from_row(row: OutcomeRow) -> Outcome {
    Outcome {
        id: OutcomeId::new(row.id),
        event_id: EventId::new(row.event_id),
        label: row.label,
    }
}

fn position_from_row(row: PositionRow) -> Result<Position> {
    Ok(Position {
        id: PositionId::new(row.id),
        user_id: UserId::new(row.user_id),
        event_id: EventId::new(row.event_id),
        outcome_id: OutcomeId::new(row.outcome_id),
        shares: parse_decimal(&row.shares)?,
        avg_price: parse_decimal(&row.avg_price)?,
        created_at: parse_time(&row.created_at)?,
    })
}

fn transaction_from_row(row: TransactionRow) -> Result<Transaction> {
    Ok(Transaction {
        id: TransactionId::new(row.id),
        user_id: UserId::new(row.user_id),
        event_id: EventId::new(row.event_id),
        outcome_id: OutcomeId::new(row.outcome_id),
        kind: parse_enum(&row.kind)?,
        shares: parse_decimal(&row.shares)?,
        points: row.points,
        created_at: parse_time(&row.created_at)?,
    })
}

fn snapshot_from_row(row: SnapshotRow) -> Result<OddsSnapshot> {
    Ok(OddsSnapshot {
        id: SnapshotId::new(row.id),
        event_id: EventId::new(row.event_id),
        outcome_id: OutcomeId::new(row.outcome_id),
        odds: parse_decimal(&row.odds)?,
        created_at: parse_time(&row.created_at)?,
    })
}

fn activity_from_row(row: ActivityRow) -> Result<ActivityEntry> {
    Ok(ActivityEntry {
        id: ActivityId::new(row.id),
        kind: parse_enum(&row.kind)?,
        message: row.message,
        user_id: row.user_id.map(UserId::new),
        event_id: row.event_id.map(EventId::new),
        created_at: parse_time(&row.created_at)?,
    })
}

fn insert_position(conn: &mut SqliteConnection, position: NewPosition) -> Result<Position> {
    let row = NewPositionRow {
        user_id: position.user_id.value(),
        event_id: position.event_id.value(),
        outcome_id: position.outcome_id.value(),
        shares: position.shares.to_string(),
        avg_price: position.avg_price.to_string(),
        created_at: format_time(position.created_at),
    };
    diesel::insert_into(positions::table)
        .values(&row)
        .execute(conn)?;
    let id = last_insert_id(conn)?;
    Ok(position.with_id(PositionId::new(id)))
}

fn write_position(conn: &mut SqliteConnection, position: &Position) -> Result<()> {
    let updated = diesel::update(positions::table.find(position.id.value()))
        .set((
            positions::shares.eq(position.shares.to_string()),
            positions::avg_price.eq(position.avg_price.to_string()),
        ))
        .execute(conn)?;
    if updated == 0 {
        return Err(Error::Internal(format!("position {} not found", position.id)));
    }
    Ok(())
}

fn write_event(conn: &mut SqliteConnection, event: &Event) -> Result<()> {
    let updated = diesel::update(events::table.find(event.id.value()))
        .set((
            events::title.eq(&event.title),
            events::description.eq(&event.description),
            events::kind.eq(event.kind.as_str()),
            events::status.eq(event.status.as_str()),
            events::winning_outcome_id.eq(event.winning_outcome_id.map(|id| id.value())),
            events::resolved_at.eq(event.resolved_at.map(format_time)),
        ))
        .execute(conn)?;
    if updated == 0 {
        return Err(Error::Internal(format!("event {} not found", event.id)));
    }
    Ok(())
}

fn insert_transaction(conn: &mut SqliteConnection, tx: &NewTransaction) -> Result<i64> {
    let row = NewTransactionRow {
        user_id: tx.user_id.value(),
        event_id: tx.event_id.value(),
        outcome_id: tx.outcome_id.value(),
        kind: tx.kind.as_str().to_string(),
        shares: tx.shares.to_string(),
        points: tx.points,
        created_at: format_time(tx.created_at),
    };
    diesel::insert_into(transactions::table)
        .values(&row)
        .execute(conn)?;
    last_insert_id(conn)
}

fn apply_position(conn: &mut SqliteConnection, change: PositionChange) -> Result<()> {
    match change {
        PositionChange::Open(new) => {
            insert_position(conn, new)?;
        }
        PositionChange::Update(position) => write_position(conn, &position)?,
        PositionChange::Close(id) => {
            let deleted = diesel::delete(positions::table.find(id.value())).execute(conn)?;
            if deleted == 0 {
                return Err(Error::Internal(format!("position {id} not found")));
            }
        }
        PositionChange::CloseEvent(event_id) => {
            diesel::delete(positions::table.filter(positions::event_id.eq(event_id.value())))
                .execute(conn)?;
        }
    }
    Ok(())
}

/// SQLite-backed record store.
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    /// Wrap an existing, already migrated pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Open `database_url` and bring its schema up to date.
    ///
    /// # Errors
    /// Returns an error if the pool cannot be built or migrations fail.
    pub fn open(database_url: &str) -> Result<Self> {
        let pool = create_pool(database_url)?;
        run_migrations(&pool)?;
        debug!(database_url, "SQLite store ready");
        Ok(Self::new(pool))
    }

    fn conn(&self) -> Result<Conn> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;
        if let Err(e) = configure_sqlite_connection(&mut conn) {
            warn!(error = %e, "Failed to configure SQLite connection");
        }
        Ok(conn)
    }
}

impl UserStore for SqliteStore {
    fn user(&self, id: UserId) -> Result<Option<User>> {
        let mut conn = self.conn()?;
        let row: Option<UserRow> = users::table
            .find(id.value())
            .select(UserRow::as_select())
            .first(&mut conn)
            .optional()?;
        row.map(user_from_row).transpose()
    }

    fn users(&self) -> Result<Vec<User>> {
        let mut conn = self.conn()?;
        let rows: Vec<UserRow> = users::table
            .order(users::id.asc())
            .select(UserRow::as_select())
            .load(&mut conn)?;
        rows.into_iter().map(user_from_row).collect()
    }

    fn create_user(&self, user: NewUser) -> Result<User> {
        let row = NewUserRow {
            username: user.username.clone(),
            balance: user.balance,
            is_admin: user.is_admin,
            created_at: format_time(user.created_at),
        };
        let mut conn = self.conn()?;
        let id = conn.transaction::<_, Error, _>(|conn| {
            diesel::insert_into(users::table).values(&row).execute(conn)?;
            last_insert_id(conn)
        })?;
        Ok(user.with_id(UserId::new(id)))
    }

    fn update_user(&self, user: &User) -> Result<()> {
        let mut conn = self.conn()?;
        let updated = diesel::update(users::table.find(user.id.value()))
            .set((
                users::username.eq(&user.username),
                users::balance.eq(user.balance),
                users::is_admin.eq(user.is_admin),
            ))
            .execute(&mut conn)?;
        if updated == 0 {
            return Err(Error::Internal(format!("user {} not found", user.id)));
        }
        Ok(())
    }
}

impl EventStore for SqliteStore {
    fn event(&self, id: EventId) -> Result<Option<Event>> {
        let mut conn = self.conn()?;
        let row: Option<EventRow> = events::table
            .find(id.value())
            .select(EventRow::as_select())
            .first(&mut conn)
            .optional()?;
        row.map(event_from_row).transpose()
    }

    fn events(&self) -> Result<Vec<Event>> {
        let mut conn = self.conn()?;
        let rows: Vec<EventRow> = events::table
            .order(events::id.asc())
            .select(EventRow::as_select())
            .load(&mut conn)?;
        rows.into_iter().map(event_from_row).collect()
    }

    fn create_event(&self, event: NewEvent) -> Result<Event> {
        let row = NewEventRow {
            title: event.title.clone(),
            description: event.description.clone(),
            kind: event.kind.as_str().to_string(),
            status: EventStatus::Open.as_str().to_string(),
            created_at: format_time(event.created_at),
        };
        let mut conn = self.conn()?;
        let id = conn.transaction::<_, Error, _>(|conn| {
            diesel::insert_into(events::table).values(&row).execute(conn)?;
            last_insert_id(conn)
        })?;
        Ok(event.with_id(EventId::new(id)))
    }

    fn update_event(&self, event: &Event) -> Result<()> {
        let mut conn = self.conn()?;
        write_event(&mut conn, event)
    }

    fn delete_event(&self, id: EventId) -> Result<bool> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(events::table.find(id.value())).execute(&mut conn)?;
        Ok(deleted > 0)
    }
}

impl OutcomeStore for SqliteStore {
    fn outcomes_for_event(&self, event_id: EventId) -> Result<Vec<Outcome>> {
        let mut conn = self.conn()?;
        let rows: Vec<OutcomeRow> = outcomes::table
            .filter(outcomes::event_id.eq(event_id.value()))
            .order(outcomes::id.asc())
            .select(OutcomeRow::as_select())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(outcome_from_row).collect())
    }

    fn create_outcome(&self, outcome: NewOutcome) -> Result<Outcome> {
        let row = NewOutcomeRow {
            event_id: outcome.event_id.value(),
            label: outcome.label.clone(),
        };
        let mut conn = self.conn()?;
        let id = conn.transaction::<_, Error, _>(|conn| {
            diesel::insert_into(outcomes::table)
                .values(&row)
                .execute(conn)?;
            last_insert_id(conn)
        })?;
        Ok(outcome.with_id(OutcomeId::new(id)))
    }

    fn delete_outcomes_for_event(&self, event_id: EventId) -> Result<usize> {
        let mut conn = self.conn()?;
        Ok(
            diesel::delete(outcomes::table.filter(outcomes::event_id.eq(event_id.value())))
                .execute(&mut conn)?,
        )
    }
}

impl PositionStore for SqliteStore {
    fn position(
        &self,
        user_id: UserId,
        event_id: EventId,
        outcome_id: OutcomeId,
    ) -> Result<Option<Position>> {
        let mut conn = self.conn()?;
        let row: Option<PositionRow> = positions::table
            .filter(positions::user_id.eq(user_id.value()))
            .filter(positions::event_id.eq(event_id.value()))
            .filter(positions::outcome_id.eq(outcome_id.value()))
            .select(PositionRow::as_select())
            .first(&mut conn)
            .optional()?;
        row.map(position_from_row).transpose()
    }

    fn positions_for_event(&self, event_id: EventId) -> Result<Vec<Position>> {
        let mut conn = self.conn()?;
        let rows: Vec<PositionRow> = positions::table
            .filter(positions::event_id.eq(event_id.value()))
            .order(positions::id.asc())
            .select(PositionRow::as_select())
            .load(&mut conn)?;
        rows.into_iter().map(position_from_row).collect()
    }

    fn positions_for_user(&self, user_id: UserId) -> Result<Vec<Position>> {
        let mut conn = self.conn()?;
        let rows: Vec<PositionRow> = positions::table
            .filter(positions::user_id.eq(user_id.value()))
            .order(positions::id.asc())
            .select(PositionRow::as_select())
            .load(&mut conn)?;
        rows.into_iter().map(position_from_row).collect()
    }

    fn positions_for_user_event(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> Result<Vec<Position>> {
        let mut conn = self.conn()?;
        let rows: Vec<PositionRow> = positions::table
            .filter(positions::user_id.eq(user_id.value()))
            .filter(positions::event_id.eq(event_id.value()))
            .order(positions::id.asc())
            .select(PositionRow::as_select())
            .load(&mut conn)?;
        rows.into_iter().map(position_from_row).collect()
    }

    fn create_position(&self, position: NewPosition) -> Result<Position> {
        let mut conn = self.conn()?;
        conn.transaction(|conn| insert_position(conn, position))
    }

    fn update_position(&self, position: &Position) -> Result<()> {
        let mut conn = self.conn()?;
        write_position(&mut conn, position)
    }

    fn delete_position(&self, id: PositionId) -> Result<bool> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(positions::table.find(id.value())).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn delete_positions_for_event(&self, event_id: EventId) -> Result<usize> {
        let mut conn = self.conn()?;
        Ok(
            diesel::delete(positions::table.filter(positions::event_id.eq(event_id.value())))
                .execute(&mut conn)?,
        )
    }
}

impl TransactionStore for SqliteStore {
    fn append_transaction(&self, tx: NewTransaction) -> Result<Transaction> {
        let mut conn = self.conn()?;
        let id = conn.transaction(|conn| insert_transaction(conn, &tx))?;
        Ok(tx.with_id(TransactionId::new(id)))
    }

    fn transactions_for_user(&self, user_id: UserId) -> Result<Vec<Transaction>> {
        let mut conn = self.conn()?;
        let rows: Vec<TransactionRow> = transactions::table
            .filter(transactions::user_id.eq(user_id.value()))
            .order(transactions::id.desc())
            .select(TransactionRow::as_select())
            .load(&mut conn)?;
        rows.into_iter().map(transaction_from_row).collect()
    }

    fn delete_transactions_for_event(&self, event_id: EventId) -> Result<usize> {
        let mut conn = self.conn()?;
        Ok(diesel::delete(
            transactions::table.filter(transactions::event_id.eq(event_id.value())),
        )
        .execute(&mut conn)?)
    }
}

impl SnapshotStore for SqliteStore {
    fn append_snapshot(&self, snapshot: NewSnapshot) -> Result<OddsSnapshot> {
        let row = NewSnapshotRow {
            event_id: snapshot.event_id.value(),
            outcome_id: snapshot.outcome_id.value(),
            odds: snapshot.odds.to_string(),
            created_at: format_time(snapshot.created_at),
        };
        let mut conn = self.conn()?;
        let id = conn.transaction::<_, Error, _>(|conn| {
            diesel::insert_into(odds_snapshots::table)
                .values(&row)
                .execute(conn)?;
            last_insert_id(conn)
        })?;
        Ok(snapshot.with_id(SnapshotId::new(id)))
    }

    fn snapshots_for_event(&self, event_id: EventId) -> Result<Vec<OddsSnapshot>> {
        let mut conn = self.conn()?;
        let rows: Vec<SnapshotRow> = odds_snapshots::table
            .filter(odds_snapshots::event_id.eq(event_id.value()))
            .order(odds_snapshots::id.asc())
            .select(SnapshotRow::as_select())
            .load(&mut conn)?;
        rows.into_iter().map(snapshot_from_row).collect()
    }

    fn delete_snapshots_for_event(&self, event_id: EventId) -> Result<usize> {
        let mut conn = self.conn()?;
        Ok(diesel::delete(
            odds_snapshots::table.filter(odds_snapshots::event_id.eq(event_id.value())),
        )
        .execute(&mut conn)?)
    }
}

impl ActivityStore for SqliteStore {
    fn append_activity(&self, entry: NewActivity) -> Result<ActivityEntry> {
        let row = NewActivityRow {
            kind: entry.kind.as_str().to_string(),
            message: entry.message.clone(),
            user_id: entry.user_id.map(|id| id.value()),
            event_id: entry.event_id.map(|id| id.value()),
            created_at: format_time(entry.created_at),
        };
        let mut conn = self.conn()?;
        let id = conn.transaction::<_, Error, _>(|conn| {
            diesel::insert_into(activity::table)
                .values(&row)
                .execute(conn)?;
            last_insert_id(conn)
        })?;
        Ok(entry.with_id(ActivityId::new(id)))
    }

    fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut conn = self.conn()?;
        let rows: Vec<ActivityRow> = activity::table
            .order(activity::id.desc())
            .limit(limit)
            .select(ActivityRow::as_select())
            .load(&mut conn)?;
        rows.into_iter().map(activity_from_row).collect()
    }
}

impl RecordStore for SqliteStore {
    fn commit(&self, changes: Changeset) -> Result<()> {
        let (balances, position_changes, ledger, event) = changes.into_parts();
        let mut conn = self.conn()?;

        conn.transaction::<_, Error, _>(|conn| {
            for change in position_changes {
                apply_position(conn, change)?;
            }
            for (&user_id, &delta) in &balances {
                let balance: Option<i64> = users::table
                    .find(user_id.value())
                    .select(users::balance)
                    .first(conn)
                    .optional()?;
                let balance = balance
                    .ok_or_else(|| Error::Internal(format!("user {user_id} not found")))?
                    .checked_add(delta)
                    .ok_or(MarketError::BalanceOverflow(user_id))?;
                diesel::update(users::table.find(user_id.value()))
                    .set(users::balance.eq(balance))
                    .execute(conn)?;
            }
            for tx in &ledger {
                insert_transaction(conn, tx)?;
            }
            if let Some(event) = &event {
                write_event(conn, event)?;
            }
            Ok(())
        })
    }
}
