//! Market flows persisted to a SQLite file.

mod support;

use std::sync::Arc;

use parimarket::domain::{EventStatus, TxKind};
use parimarket::port::{EventStore, PositionStore, SnapshotStore, TransactionStore, UserStore};
use rust_decimal_macros::dec;
use support::temp_db::TempDb;

#[test]
fn state_survives_reopening_the_file() {
    let db = TempDb::create("reopen");
    let (alice, event, yes) = {
        let (service, _) = support::market::service_over(Arc::new(db.open()));
        let alice = support::market::make_users(&service, 1)[0];
        let (event, yes, _) = support::market::make_binary_event(&service, "Rain?");
        service.buy(alice, event, yes, 120).unwrap();
        service.sell(alice, event, yes, dec!(20)).unwrap();
        (alice, event, yes)
    };

    let store = db.open();
    assert_eq!(store.user(alice).unwrap().unwrap().balance, 890);
    let position = store.position(alice, event, yes).unwrap().unwrap();
    assert_eq!(position.shares, dec!(100));
    assert_eq!(position.avg_price, dec!(0.5));

    let ledger = store.transactions_for_user(alice).unwrap();
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger[0].kind, TxKind::Sell);
    assert_eq!(ledger[1].kind, TxKind::Buy);
}

#[test]
fn resolution_is_persisted() {
    let db = TempDb::create("resolve");
    let store = Arc::new(db.open());
    let (service, _) = support::market::service_over(Arc::clone(&store));
    let users = support::market::make_users(&service, 2);
    let (event, yes, no) = support::market::make_binary_event(&service, "Rain?");
    service.buy(users[0], event, yes, 100).unwrap();
    service.buy(users[1], event, no, 50).unwrap();

    service.resolve(event, yes).unwrap();

    let reopened = db.open();
    let stored = reopened.event(event).unwrap().unwrap();
    assert_eq!(stored.status, EventStatus::Resolved);
    assert_eq!(stored.winning_outcome_id, Some(yes));
    assert!(stored.resolved_at.is_some());
    assert!(reopened.positions_for_event(event).unwrap().is_empty());
    assert_eq!(reopened.user(users[0]).unwrap().unwrap().balance, 1100);
    assert_eq!(reopened.user(users[1]).unwrap().unwrap().balance, 950);
}

#[test]
fn odds_history_accumulates_per_trade() {
    let db = TempDb::create("history");
    let (service, _) = support::market::service_over(Arc::new(db.open()));
    let users = support::market::make_users(&service, 2);
    let (event, yes, no) = support::market::make_binary_event(&service, "Rain?");
    service.buy(users[0], event, yes, 30).unwrap();
    service.buy(users[1], event, no, 10).unwrap();

    let history = db.open().snapshots_for_event(event).unwrap();
    assert_eq!(history.len(), 6);
    let last_yes = history
        .iter()
        .rev()
        .find(|s| s.outcome_id == yes)
        .unwrap();
    assert_eq!(last_yes.odds, dec!(75));
}

#[test]
fn deleted_event_leaves_no_rows() {
    let db = TempDb::create("delete");
    let (service, _) = support::market::service_over(Arc::new(db.open()));
    let users = support::market::make_users(&service, 1);
    let (event, yes, _) = support::market::make_binary_event(&service, "Rain?");
    service.buy(users[0], event, yes, 75).unwrap();

    assert_eq!(service.delete_event(event).unwrap(), 75);

    let store = db.open();
    assert!(store.event(event).unwrap().is_none());
    assert!(store.snapshots_for_event(event).unwrap().is_empty());
    assert!(store.transactions_for_user(users[0]).unwrap().is_empty());
    assert_eq!(store.user(users[0]).unwrap().unwrap().balance, 1000);
}
