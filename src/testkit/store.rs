//! A store whose reads start failing once a commit has landed.
//!
//! Wraps [`MemoryStore`]. After [`FlakyStore::arm`], the next successful
//! [`RecordStore::commit`] flips every read to `Error::Database` until
//! [`FlakyStore::disarm`] is called. Writes always go through.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::adapter::outbound::memory::MemoryStore;
use crate::domain::{
    ActivityEntry, Event, EventId, NewActivity, NewEvent, NewOutcome, NewPosition, NewSnapshot,
    NewTransaction, NewUser, OddsSnapshot, Outcome, OutcomeId, Position, PositionId, Transaction,
    User, UserId,
};
use crate::error::{Error, Result};
use crate::port::{
    ActivityStore, Changeset, EventStore, OutcomeStore, PositionStore, RecordStore, SnapshotStore,
    TransactionStore, UserStore,
};

#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    armed: AtomicBool,
    failing: AtomicBool,
}

impl FlakyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail reads after the next successful commit.
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Make reads work again.
    pub fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
        self.failing.store(false, Ordering::SeqCst);
    }

    fn read<T>(&self, f: impl FnOnce(&MemoryStore) -> Result<T>) -> Result<T> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Database("read failed".into()));
        }
        f(&self.inner)
    }
}

impl UserStore for FlakyStore {
    fn user(&self, id: UserId) -> Result<Option<User>> {
        self.read(|s| s.user(id))
    }

    fn users(&self) -> Result<Vec<User>> {
        self.read(UserStore::users)
    }

    fn create_user(&self, user: NewUser) -> Result<User> {
        self.inner.create_user(user)
    }

    fn update_user(&self, user: &User) -> Result<()> {
        self.inner.update_user(user)
    }
}

impl EventStore for FlakyStore {
    fn event(&self, id: EventId) -> Result<Option<Event>> {
        self.read(|s| s.event(id))
    }

    fn events(&self) -> Result<Vec<Event>> {
        self.read(EventStore::events)
    }

    fn create_event(&self, event: NewEvent) -> Result<Event> {
        self.inner.create_event(event)
    }

    fn update_event(&self, event: &Event) -> Result<()> {
        self.inner.update_event(event)
    }

    fn delete_event(&self, id: EventId) -> Result<bool> {
        self.inner.delete_event(id)
    }
}

impl OutcomeStore for FlakyStore {
    fn outcomes_for_event(&self, event_id: EventId) -> Result<Vec<Outcome>> {
        self.read(|s| s.outcomes_for_event(event_id))
    }

    fn create_outcome(&self, outcome: NewOutcome) -> Result<Outcome> {
        self.inner.create_outcome(outcome)
    }

    fn delete_outcomes_for_event(&self, event_id: EventId) -> Result<usize> {
        self.inner.delete_outcomes_for_event(event_id)
    }
}

impl PositionStore for FlakyStore {
    fn position(
        &self,
        user_id: UserId,
        event_id: EventId,
        outcome_id: OutcomeId,
    ) -> Result<Option<Position>> {
        self.read(|s| s.position(user_id, event_id, outcome_id))
    }

    fn positions_for_event(&self, event_id: EventId) -> Result<Vec<Position>> {
        self.read(|s| s.positions_for_event(event_id))
    }

    fn positions_for_user(&self, user_id: UserId) -> Result<Vec<Position>> {
        self.read(|s| s.positions_for_user(user_id))
    }

    fn positions_for_user_event(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> Result<Vec<Position>> {
        self.read(|s| s.positions_for_user_event(user_id, event_id))
    }

    fn create_position(&self, position: NewPosition) -> Result<Position> {
        self.inner.create_position(position)
    }

    fn update_position(&self, position: &Position) -> Result<()> {
        self.inner.update_position(position)
    }

    fn delete_position(&self, id: PositionId) -> Result<bool> {
        self.inner.delete_position(id)
    }

    fn delete_positions_for_event(&self, event_id: EventId) -> Result<usize> {
        self.inner.delete_positions_for_event(event_id)
    }
}

impl TransactionStore for FlakyStore {
    fn append_transaction(&self, tx: NewTransaction) -> Result<Transaction> {
        self.inner.append_transaction(tx)
    }

    fn transactions_for_user(&self, user_id: UserId) -> Result<Vec<Transaction>> {
        self.read(|s| s.transactions_for_user(user_id))
    }

    fn delete_transactions_for_event(&self, event_id: EventId) -> Result<usize> {
        self.inner.delete_transactions_for_event(event_id)
    }
}

impl SnapshotStore for FlakyStore {
    fn append_snapshot(&self, snapshot: NewSnapshot) -> Result<OddsSnapshot> {
        self.inner.append_snapshot(snapshot)
    }

    fn snapshots_for_event(&self, event_id: EventId) -> Result<Vec<OddsSnapshot>> {
        self.read(|s| s.snapshots_for_event(event_id))
    }

    fn delete_snapshots_for_event(&self, event_id: EventId) -> Result<usize> {
        self.inner.delete_snapshots_for_event(event_id)
    }
}

impl ActivityStore for FlakyStore {
    fn append_activity(&self, entry: NewActivity) -> Result<ActivityEntry> {
        self.inner.append_activity(entry)
    }

    fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityEntry>> {
        self.read(|s| s.recent_activity(limit))
    }
}

impl RecordStore for FlakyStore {
    fn commit(&self, changes: Changeset) -> Result<()> {
        self.inner.commit(changes)?;
        if self.armed.load(Ordering::SeqCst) {
            self.failing.store(true, Ordering::SeqCst);
        }
        Ok(())
    }
}
