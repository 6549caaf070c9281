//! In-memory record store.
//!
//! Backs tests and throwaway CLI sessions. All tables live behind one
//! `parking_lot::RwLock`; [`RecordStore::commit`] checks a whole changeset
//! against the current tables before writing any of it.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::RwLock;

use crate::domain::{
    ActivityEntry, ActivityId, Event, EventId, MarketError, NewActivity, NewEvent, NewOutcome,
    NewPosition, NewSnapshot, NewTransaction, NewUser, OddsSnapshot, Outcome, OutcomeId, Points,
    Position, PositionId, SnapshotId, Transaction, TransactionId, User, UserId,
};
use crate::error::{Error, Result};
use crate::port::outbound::store::{
    ActivityStore, Changeset, EventStore, OutcomeStore, PositionChange, PositionStore,
    RecordStore, SnapshotStore, TransactionStore, UserStore,
};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    events: BTreeMap<EventId, Event>,
    outcomes: BTreeMap<OutcomeId, Outcome>,
    positions: BTreeMap<PositionId, Position>,
    transactions: BTreeMap<TransactionId, Transaction>,
    snapshots: BTreeMap<SnapshotId, OddsSnapshot>,
    activity: BTreeMap<ActivityId, ActivityEntry>,
    last_id: i64,
}

impl Tables {
    /// Ids are shared across tables; they only need to be unique per table.
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn position_exists(&self, user_id: UserId, event_id: EventId, outcome_id: OutcomeId) -> bool {
        self.positions.values().any(|p| {
            p.user_id == user_id && p.event_id == event_id && p.outcome_id == outcome_id
        })
    }

    fn insert_position(&mut self, position: NewPosition) -> Result<Position> {
        if self.position_exists(position.user_id, position.event_id, position.outcome_id) {
            return Err(Error::Internal(format!(
                "position for {} on {} already exists",
                position.user_id, position.outcome_id
            )));
        }
        let position = position.with_id(PositionId::new(self.next_id()));
        self.positions.insert(position.id, position.clone());
        Ok(position)
    }

    /// Check every record `changes` touches and compute the resulting
    /// balances, without writing anything.
    fn prepare(&self, changes: &Changeset) -> Result<BTreeMap<UserId, Points>> {
        let mut removed: BTreeSet<PositionId> = BTreeSet::new();
        let mut closed_events: BTreeSet<EventId> = BTreeSet::new();
        let mut opened: BTreeSet<(UserId, EventId, OutcomeId)> = BTreeSet::new();

        for change in changes.positions() {
            match change {
                PositionChange::Open(new) => {
                    let key = (new.user_id, new.event_id, new.outcome_id);
                    let stored = !closed_events.contains(&new.event_id)
                        && self.positions.values().any(|p| {
                            !removed.contains(&p.id)
                                && (p.user_id, p.event_id, p.outcome_id) == key
                        });
                    if stored || !opened.insert(key) {
                        return Err(Error::Internal(format!(
                            "position for {} on {} already exists",
                            new.user_id, new.outcome_id
                        )));
                    }
                }
                PositionChange::Update(position) => {
                    self.require_live_position(position.id, &removed, &closed_events)?;
                }
                PositionChange::Close(id) => {
                    self.require_live_position(*id, &removed, &closed_events)?;
                    removed.insert(*id);
                }
                PositionChange::CloseEvent(event_id) => {
                    closed_events.insert(*event_id);
                    opened.retain(|(_, e, _)| e != event_id);
                }
            }
        }

        let mut balances = BTreeMap::new();
        for (&user_id, &delta) in changes.balance_deltas() {
            let user = self
                .users
                .get(&user_id)
                .ok_or_else(|| Error::Internal(format!("user {user_id} not found")))?;
            let balance = user
                .balance
                .checked_add(delta)
                .ok_or(MarketError::BalanceOverflow(user_id))?;
            balances.insert(user_id, balance);
        }

        if let Some(event) = changes.event() {
            if !self.events.contains_key(&event.id) {
                return Err(Error::Internal(format!("event {} not found", event.id)));
            }
        }
        Ok(balances)
    }

    fn require_live_position(
        &self,
        id: PositionId,
        removed: &BTreeSet<PositionId>,
        closed_events: &BTreeSet<EventId>,
    ) -> Result<()> {
        match self.positions.get(&id) {
            Some(p) if !removed.contains(&id) && !closed_events.contains(&p.event_id) => Ok(()),
            _ => Err(Error::Internal(format!("position {id} not found"))),
        }
    }

    /// Write a changeset that [`Tables::prepare`] accepted.
    fn apply(&mut self, changes: Changeset, balances: BTreeMap<UserId, Points>) {
        let (_, positions, transactions, event) = changes.into_parts();

        for change in positions {
            match change {
                PositionChange::Open(new) => {
                    let position = new.with_id(PositionId::new(self.next_id()));
                    self.positions.insert(position.id, position);
                }
                PositionChange::Update(position) => {
                    self.positions.insert(position.id, position);
                }
                PositionChange::Close(id) => {
                    self.positions.remove(&id);
                }
                PositionChange::CloseEvent(event_id) => {
                    self.positions.retain(|_, p| p.event_id != event_id);
                }
            }
        }
        for (user_id, balance) in balances {
            if let Some(user) = self.users.get_mut(&user_id) {
                user.balance = balance;
            }
        }
        for tx in transactions {
            let tx = tx.with_id(TransactionId::new(self.next_id()));
            self.transactions.insert(tx.id, tx);
        }
        if let Some(event) = event {
            self.events.insert(event.id, event);
        }
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for MemoryStore {
    fn user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    fn users(&self) -> Result<Vec<User>> {
        Ok(self.tables.read().users.values().cloned().collect())
    }

    fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write();
        let user = user.with_id(UserId::new(tables.next_id()));
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn update_user(&self, user: &User) -> Result<()> {
        match self.tables.write().users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(())
            }
            None => Err(Error::Internal(format!("user {} not found", user.id))),
        }
    }
}

impl EventStore for MemoryStore {
    fn event(&self, id: EventId) -> Result<Option<Event>> {
        Ok(self.tables.read().events.get(&id).cloned())
    }

    fn events(&self) -> Result<Vec<Event>> {
        Ok(self.tables.read().events.values().cloned().collect())
    }

    fn create_event(&self, event: NewEvent) -> Result<Event> {
        let mut tables = self.tables.write();
        let event = event.with_id(EventId::new(tables.next_id()));
        tables.events.insert(event.id, event.clone());
        Ok(event)
    }

    fn update_event(&self, event: &Event) -> Result<()> {
        match self.tables.write().events.get_mut(&event.id) {
            Some(slot) => {
                *slot = event.clone();
                Ok(())
            }
            None => Err(Error::Internal(format!("event {} not found", event.id))),
        }
    }

    fn delete_event(&self, id: EventId) -> Result<bool> {
        Ok(self.tables.write().events.remove(&id).is_some())
    }
}

impl OutcomeStore for MemoryStore {
    fn outcomes_for_event(&self, event_id: EventId) -> Result<Vec<Outcome>> {
        Ok(self
            .tables
            .read()
            .outcomes
            .values()
            .filter(|o| o.event_id == event_id)
            .cloned()
            .collect())
    }

    fn create_outcome(&self, outcome: NewOutcome) -> Result<Outcome> {
        let mut tables = self.tables.write();
        let outcome = outcome.with_id(OutcomeId::new(tables.next_id()));
        tables.outcomes.insert(outcome.id, outcome.clone());
        Ok(outcome)
    }

    fn delete_outcomes_for_event(&self, event_id: EventId) -> Result<usize> {
        let mut tables = self.tables.write();
        let before = tables.outcomes.len();
        tables.outcomes.retain(|_, o| o.event_id != event_id);
        Ok(before - tables.outcomes.len())
    }
}

impl PositionStore for MemoryStore {
    fn position(
        &self,
        user_id: UserId,
        event_id: EventId,
        outcome_id: OutcomeId,
    ) -> Result<Option<Position>> {
        Ok(self
            .tables
            .read()
            .positions
            .values()
            .find(|p| p.user_id == user_id && p.event_id == event_id && p.outcome_id == outcome_id)
            .cloned())
    }

    fn positions_for_event(&self, event_id: EventId) -> Result<Vec<Position>> {
        Ok(self
            .tables
            .read()
            .positions
            .values()
            .filter(|p| p.event_id == event_id)
            .cloned()
            .collect())
    }

    fn positions_for_user(&self, user_id: UserId) -> Result<Vec<Position>> {
        Ok(self
            .tables
            .read()
            .positions
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    fn positions_for_user_event(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> Result<Vec<Position>> {
        Ok(self
            .tables
            .read()
            .positions
            .values()
            .filter(|p| p.user_id == user_id && p.event_id == event_id)
            .cloned()
            .collect())
    }

    fn create_position(&self, position: NewPosition) -> Result<Position> {
        self.tables.write().insert_position(position)
    }

    fn update_position(&self, position: &Position) -> Result<()> {
        let mut changes = Changeset::new();
        changes.update_position(position.clone());
        self.commit(changes)
    }

    fn delete_position(&self, id: PositionId) -> Result<bool> {
        Ok(self.tables.write().positions.remove(&id).is_some())
    }

    fn delete_positions_for_event(&self, event_id: EventId) -> Result<usize> {
        let mut tables = self.tables.write();
        let before = tables.positions.len();
        tables.positions.retain(|_, p| p.event_id != event_id);
        Ok(before - tables.positions.len())
    }
}

impl TransactionStore for MemoryStore {
    fn append_transaction(&self, tx: NewTransaction) -> Result<Transaction> {
        let mut tables = self.tables.write();
        let tx = tx.with_id(TransactionId::new(tables.next_id()));
        tables.transactions.insert(tx.id, tx.clone());
        Ok(tx)
    }

    fn transactions_for_user(&self, user_id: UserId) -> Result<Vec<Transaction>> {
        Ok(self
            .tables
            .read()
            .transactions
            .values()
            .rev()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    fn delete_transactions_for_event(&self, event_id: EventId) -> Result<usize> {
        let mut tables = self.tables.write();
        let before = tables.transactions.len();
        tables.transactions.retain(|_, t| t.event_id != event_id);
        Ok(before - tables.transactions.len())
    }
}

impl SnapshotStore for MemoryStore {
    fn append_snapshot(&self, snapshot: NewSnapshot) -> Result<OddsSnapshot> {
        let mut tables = self.tables.write();
        let snapshot = snapshot.with_id(SnapshotId::new(tables.next_id()));
        tables.snapshots.insert(snapshot.id, snapshot.clone());
        Ok(snapshot)
    }

    fn snapshots_for_event(&self, event_id: EventId) -> Result<Vec<OddsSnapshot>> {
        Ok(self
            .tables
            .read()
            .snapshots
            .values()
            .filter(|s| s.event_id == event_id)
            .cloned()
            .collect())
    }

    fn delete_snapshots_for_event(&self, event_id: EventId) -> Result<usize> {
        let mut tables = self.tables.write();
        let before = tables.snapshots.len();
        tables.snapshots.retain(|_, s| s.event_id != event_id);
        Ok(before - tables.snapshots.len())
    }
}

impl ActivityStore for MemoryStore {
    fn append_activity(&self, entry: NewActivity) -> Result<ActivityEntry> {
        let mut tables = self.tables.write();
        let entry = entry.with_id(ActivityId::new(tables.next_id()));
        tables.activity.insert(entry.id, entry.clone());
        Ok(entry)
    }

    fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityEntry>> {
        Ok(self
            .tables
            .read()
            .activity
            .values()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}

impl RecordStore for MemoryStore {
    fn commit(&self, changes: Changeset) -> Result<()> {
        let mut tables = self.tables.write();
        let balances = tables.prepare(&changes)?;
        tables.apply(changes, balances);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventKind, TxKind};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn seeded() -> (MemoryStore, User, Event, Outcome) {
        let store = MemoryStore::new();
        let user = store.create_user(NewUser::new("alice", 1000)).unwrap();
        let event = store
            .create_event(NewEvent::new("Rain?", "", EventKind::Binary))
            .unwrap();
        let outcome = store.create_outcome(NewOutcome::new(event.id, "Yes")).unwrap();
        (store, user, event, outcome)
    }

    fn open(user: &User, outcome: &Outcome, shares: Decimal) -> NewPosition {
        NewPosition {
            user_id: user.id,
            event_id: outcome.event_id,
            outcome_id: outcome.id,
            shares,
            avg_price: dec!(0.5),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn commit_applies_every_change() {
        let (store, user, event, outcome) = seeded();
        let mut changes = Changeset::new();
        changes
            .open_position(open(&user, &outcome, dec!(10)))
            .debit(user.id, 10)
            .unwrap()
            .record(NewTransaction::new(
                TxKind::Buy,
                user.id,
                event.id,
                outcome.id,
                dec!(10),
                10,
            ));

        store.commit(changes).unwrap();

        assert_eq!(store.user(user.id).unwrap().unwrap().balance, 990);
        assert_eq!(store.positions_for_event(event.id).unwrap().len(), 1);
        assert_eq!(store.transactions_for_user(user.id).unwrap().len(), 1);
    }

    #[test]
    fn commit_is_all_or_nothing() {
        let (store, user, event, outcome) = seeded();
        let mut changes = Changeset::new();
        changes
            .open_position(open(&user, &outcome, dec!(10)))
            .credit(user.id, 500)
            .unwrap()
            .credit(UserId::new(404), 10)
            .unwrap();

        let err = store.commit(changes).unwrap_err();

        assert!(matches!(err, Error::Internal(_)));
        assert_eq!(store.user(user.id).unwrap().unwrap().balance, 1000);
        assert!(store.positions_for_event(event.id).unwrap().is_empty());
    }

    #[test]
    fn overflowing_balance_is_rejected_before_any_write() {
        let (store, user, event, outcome) = seeded();
        let mut rich = store.user(user.id).unwrap().unwrap();
        rich.balance = i64::MAX - 5;
        store.update_user(&rich).unwrap();

        let mut changes = Changeset::new();
        changes
            .open_position(open(&user, &outcome, dec!(10)))
            .credit(user.id, 10)
            .unwrap();
        let err = store.commit(changes).unwrap_err();

        assert_eq!(
            err.market_error(),
            Some(&MarketError::BalanceOverflow(user.id))
        );
        assert_eq!(store.user(user.id).unwrap().unwrap().balance, i64::MAX - 5);
        assert!(store.positions_for_event(event.id).unwrap().is_empty());
    }

    #[test]
    fn closed_position_cannot_be_updated_in_same_batch() {
        let (store, user, _, outcome) = seeded();
        let position = store.create_position(open(&user, &outcome, dec!(5))).unwrap();

        let mut changes = Changeset::new();
        changes
            .close_position(position.id)
            .update_position(position.clone())
            .debit(user.id, 5)
            .unwrap();

        assert!(matches!(store.commit(changes), Err(Error::Internal(_))));
        assert_eq!(store.user(user.id).unwrap().unwrap().balance, 1000);
        assert_eq!(
            store.position(user.id, outcome.event_id, outcome.id).unwrap(),
            Some(position)
        );
    }

    #[test]
    fn reopening_after_event_close_is_allowed() {
        let (store, user, event, outcome) = seeded();
        store.create_position(open(&user, &outcome, dec!(5))).unwrap();

        let mut changes = Changeset::new();
        changes
            .close_event_positions(event.id)
            .open_position(open(&user, &outcome, dec!(7)));
        store.commit(changes).unwrap();

        let positions = store.positions_for_event(event.id).unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].shares, dec!(7));
    }

    #[test]
    fn duplicate_position_is_rejected() {
        let (store, user, _, outcome) = seeded();
        store.create_position(open(&user, &outcome, dec!(1))).unwrap();

        assert!(store.create_position(open(&user, &outcome, dec!(1))).is_err());
    }

    #[test]
    fn recent_activity_is_newest_first() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .append_activity(NewActivity::new(
                    crate::domain::ActivityKind::Trade,
                    format!("entry {i}"),
                ))
                .unwrap();
        }

        let recent = store.recent_activity(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].message, "entry 4");
        assert_eq!(recent[1].message, "entry 3");
    }

    #[test]
    fn delete_helpers_report_counts() {
        let (store, user, event, outcome) = seeded();
        store.create_position(open(&user, &outcome, dec!(1))).unwrap();

        assert_eq!(store.delete_positions_for_event(event.id).unwrap(), 1);
        assert_eq!(store.delete_outcomes_for_event(event.id).unwrap(), 1);
        assert!(store.delete_event(event.id).unwrap());
        assert!(!store.delete_event(event.id).unwrap());
    }
}
