//! Live subscribers attached to a wired market.

use std::sync::Arc;
use std::time::Duration;

use parimarket::adapter::outbound::memory::MemoryStore;
use parimarket::domain::EventKind;
use parimarket::infrastructure::bootstrap::build_market;
use parimarket::infrastructure::config::settings::Config;
use parimarket::port::NotificationKind;

fn quiet_config() -> Config {
    let mut config = Config::default();
    config.notifications.log = false;
    config
}

#[tokio::test]
async fn subscribers_see_trades_as_they_happen() {
    let market = build_market(&quiet_config(), Arc::new(MemoryStore::new()));
    let service = &market.service;
    let alice = service.create_user("alice", false).unwrap();
    let (event, odds) = service
        .create_event("Rain?", "", EventKind::Binary, &[])
        .unwrap();

    let mut feed = market.broker.subscribe(None);
    service.buy(alice.id, event.id, odds[0].outcome_id, 10).unwrap();

    let first = tokio::time::timeout(Duration::from_secs(1), feed.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.kind, NotificationKind::OddsUpdated);
    assert_eq!(first.data["event_id"], event.id.value());

    let second = feed.recv().await.unwrap();
    assert_eq!(second.kind, NotificationKind::ActivityNew);
}

#[tokio::test]
async fn settlement_notice_goes_only_to_its_user() {
    let market = build_market(&quiet_config(), Arc::new(MemoryStore::new()));
    let service = &market.service;
    let alice = service.create_user("alice", false).unwrap();
    let bob = service.create_user("bob", false).unwrap();
    let (event, odds) = service
        .create_event("Rain?", "", EventKind::Binary, &[])
        .unwrap();
    service.buy(alice.id, event.id, odds[0].outcome_id, 10).unwrap();

    let mut alice_feed = market.broker.subscribe(Some(alice.id));
    let mut bob_feed = market.broker.subscribe(Some(bob.id));
    service.resolve(event.id, odds[0].outcome_id).unwrap();

    let notice = alice_feed.recv().await.unwrap();
    assert_eq!(notice.kind, NotificationKind::UserResolved);
    assert_eq!(notice.data["payout"], 60);

    let first_for_bob = bob_feed.recv().await.unwrap();
    assert_eq!(first_for_bob.kind, NotificationKind::EventResolved);
}

#[tokio::test]
async fn slow_subscriber_does_not_block_trading() {
    let mut config = quiet_config();
    config.notifications.subscriber_buffer = 1;
    let market = build_market(&config, Arc::new(MemoryStore::new()));
    let service = &market.service;
    let alice = service.create_user("alice", false).unwrap();
    let (event, odds) = service
        .create_event("Rain?", "", EventKind::Binary, &[])
        .unwrap();

    let mut stalled = market.broker.subscribe(None);
    for _ in 0..5 {
        service.buy(alice.id, event.id, odds[0].outcome_id, 1).unwrap();
    }

    assert!(market.broker.dropped_count() > 0);
    assert!(stalled.try_recv().is_some());
    assert!(stalled.try_recv().is_none());
}

#[tokio::test]
async fn dropped_subscription_is_pruned() {
    let market = build_market(&quiet_config(), Arc::new(MemoryStore::new()));
    let feed = market.broker.subscribe(None);
    assert_eq!(market.broker.subscriber_count(), 1);
    drop(feed);

    market
        .service
        .create_event("Rain?", "", EventKind::Binary, &[])
        .unwrap();

    assert_eq!(market.broker.subscriber_count(), 0);
}
