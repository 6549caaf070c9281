//! Record store ports.
//!
//! The market engine reads and writes users, events, outcomes, positions and
//! the ledger through these traits. All calls are synchronous and must be
//! strongly consistent for a caller holding the store lock.
//!
//! Trades and resolutions never write piecemeal: they build a [`Changeset`]
//! and hand it to [`RecordStore::commit`], which applies it all-or-nothing.

use std::collections::BTreeMap;

use crate::domain::{
    ActivityEntry, Event, EventId, MarketError, NewActivity, NewEvent, NewOutcome, NewPosition,
    NewSnapshot, NewTransaction, NewUser, OddsSnapshot, Outcome, OutcomeId, Points, Position,
    PositionId, Transaction, User, UserId,
};
use crate::error::Result;

/// Storage operations for users.
pub trait UserStore: Send + Sync {
    /// Get a user by ID.
    fn user(&self, id: UserId) -> Result<Option<User>>;

    /// List all users in id order.
    fn users(&self) -> Result<Vec<User>>;

    /// Insert a user and return it with its assigned id.
    fn create_user(&self, user: NewUser) -> Result<User>;

    /// Replace a user's stored fields.
    fn update_user(&self, user: &User) -> Result<()>;
}

/// Storage operations for events.
pub trait EventStore: Send + Sync {
    fn event(&self, id: EventId) -> Result<Option<Event>>;

    /// List all events in id order.
    fn events(&self) -> Result<Vec<Event>>;

    fn create_event(&self, event: NewEvent) -> Result<Event>;

    fn update_event(&self, event: &Event) -> Result<()>;

    /// Delete an event row. Returns false if it did not exist.
    fn delete_event(&self, id: EventId) -> Result<bool>;
}

/// Storage operations for outcomes.
pub trait OutcomeStore: Send + Sync {
    /// Outcomes of an event in creation order.
    fn outcomes_for_event(&self, event_id: EventId) -> Result<Vec<Outcome>>;

    fn create_outcome(&self, outcome: NewOutcome) -> Result<Outcome>;

    /// Delete every outcome of an event. Returns count deleted.
    fn delete_outcomes_for_event(&self, event_id: EventId) -> Result<usize>;
}

/// Storage operations for positions.
pub trait PositionStore: Send + Sync {
    fn position(
        &self,
        user_id: UserId,
        event_id: EventId,
        outcome_id: OutcomeId,
    ) -> Result<Option<Position>>;

    fn positions_for_event(&self, event_id: EventId) -> Result<Vec<Position>>;

    fn positions_for_user(&self, user_id: UserId) -> Result<Vec<Position>>;

    fn positions_for_user_event(&self, user_id: UserId, event_id: EventId)
        -> Result<Vec<Position>>;

    fn create_position(&self, position: NewPosition) -> Result<Position>;

    fn update_position(&self, position: &Position) -> Result<()>;

    fn delete_position(&self, id: PositionId) -> Result<bool>;

    fn delete_positions_for_event(&self, event_id: EventId) -> Result<usize>;
}

/// Append-only ledger storage.
pub trait TransactionStore: Send + Sync {
    fn append_transaction(&self, tx: NewTransaction) -> Result<Transaction>;

    /// A user's ledger, newest first.
    fn transactions_for_user(&self, user_id: UserId) -> Result<Vec<Transaction>>;

    /// Purge an event's ledger. Only used when an admin deletes the event.
    fn delete_transactions_for_event(&self, event_id: EventId) -> Result<usize>;
}

/// Odds history storage.
pub trait SnapshotStore: Send + Sync {
    fn append_snapshot(&self, snapshot: NewSnapshot) -> Result<OddsSnapshot>;

    /// An event's snapshots, oldest first.
    fn snapshots_for_event(&self, event_id: EventId) -> Result<Vec<OddsSnapshot>>;

    fn delete_snapshots_for_event(&self, event_id: EventId) -> Result<usize>;
}

/// Activity feed storage.
pub trait ActivityStore: Send + Sync {
    fn append_activity(&self, entry: NewActivity) -> Result<ActivityEntry>;

    /// The newest `limit` entries, newest first.
    fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityEntry>>;
}

/// A complete record store with atomic batch writes.
pub trait RecordStore:
    UserStore + EventStore + OutcomeStore + PositionStore + TransactionStore + SnapshotStore + ActivityStore
{
    /// Apply every change in `changes` or none of them.
    ///
    /// Implementations must reject the whole batch if any referenced user,
    /// position or event does not exist.
    fn commit(&self, changes: Changeset) -> Result<()>;
}

/// A change to the position table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionChange {
    Open(NewPosition),
    Update(Position),
    Close(PositionId),
    /// Delete every position on the event.
    CloseEvent(EventId),
}

/// Balance, position, ledger and event writes applied as one unit.
///
/// Changes are applied in a fixed order: positions, balances, ledger, event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changeset {
    balance_deltas: BTreeMap<UserId, Points>,
    positions: Vec<PositionChange>,
    transactions: Vec<NewTransaction>,
    event: Option<Event>,
}

impl Changeset {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `points` to a user's balance. Repeated credits accumulate.
    ///
    /// # Errors
    /// [`MarketError::BalanceOverflow`] if the accumulated delta overflows.
    pub fn credit(&mut self, user_id: UserId, points: Points) -> Result<&mut Self> {
        let delta = self.balance_deltas.entry(user_id).or_default();
        *delta = delta
            .checked_add(points)
            .ok_or(MarketError::BalanceOverflow(user_id))?;
        Ok(self)
    }

    /// Subtract `points` from a user's balance.
    ///
    /// # Errors
    /// [`MarketError::BalanceOverflow`] if the accumulated delta overflows.
    pub fn debit(&mut self, user_id: UserId, points: Points) -> Result<&mut Self> {
        let points = points
            .checked_neg()
            .ok_or(MarketError::BalanceOverflow(user_id))?;
        self.credit(user_id, points)
    }

    pub fn open_position(&mut self, position: NewPosition) -> &mut Self {
        self.positions.push(PositionChange::Open(position));
        self
    }

    pub fn update_position(&mut self, position: Position) -> &mut Self {
        self.positions.push(PositionChange::Update(position));
        self
    }

    pub fn close_position(&mut self, id: PositionId) -> &mut Self {
        self.positions.push(PositionChange::Close(id));
        self
    }

    pub fn close_event_positions(&mut self, event_id: EventId) -> &mut Self {
        self.positions.push(PositionChange::CloseEvent(event_id));
        self
    }

    pub fn record(&mut self, tx: NewTransaction) -> &mut Self {
        self.transactions.push(tx);
        self
    }

    pub fn update_event(&mut self, event: Event) -> &mut Self {
        self.event = Some(event);
        self
    }

    /// Net balance change per user.
    #[must_use]
    pub fn balance_deltas(&self) -> &BTreeMap<UserId, Points> {
        &self.balance_deltas
    }

    #[must_use]
    pub fn positions(&self) -> &[PositionChange] {
        &self.positions
    }

    #[must_use]
    pub fn transactions(&self) -> &[NewTransaction] {
        &self.transactions
    }

    #[must_use]
    pub fn event(&self) -> Option<&Event> {
        self.event.as_ref()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.balance_deltas.is_empty()
            && self.positions.is_empty()
            && self.transactions.is_empty()
            && self.event.is_none()
    }

    /// Split into owned parts for adapters.
    #[must_use]
    pub fn into_parts(
        self,
    ) -> (
        BTreeMap<UserId, Points>,
        Vec<PositionChange>,
        Vec<NewTransaction>,
        Option<Event>,
    ) {
        (
            self.balance_deltas,
            self.positions,
            self.transactions,
            self.event,
        )
    }
}
