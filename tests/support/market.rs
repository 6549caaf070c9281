use std::sync::Arc;
use std::time::Duration;

use parimarket::application::{MarketService, StoreLock};
use parimarket::domain::{EventId, EventKind, OutcomeId, UserId};
use parimarket::port::RecordStore;
use parimarket::testkit::notifier::RecordingNotifier;

/// Wire a service over `store` with a recording notifier.
pub fn service_over<S: RecordStore>(store: Arc<S>) -> (MarketService<S>, RecordingNotifier) {
    let notifier = RecordingNotifier::new();
    let service = MarketService::new(
        store,
        StoreLock::new(Duration::from_secs(10)),
        Arc::new(notifier.clone()),
        1000,
    );
    (service, notifier)
}

/// Register `n` users named `user0..`.
pub fn make_users<S: RecordStore>(service: &MarketService<S>, n: usize) -> Vec<UserId> {
    (0..n)
        .map(|i| {
            service
                .create_user(&format!("user{i}"), false)
                .expect("create user")
                .id
        })
        .collect()
}

/// Open a binary event and return its id with the Yes/No outcome ids.
pub fn make_binary_event<S: RecordStore>(
    service: &MarketService<S>,
    title: &str,
) -> (EventId, OutcomeId, OutcomeId) {
    let (event, odds) = service
        .create_event(title, "", EventKind::Binary, &[])
        .expect("create event");
    (event.id, odds[0].outcome_id, odds[1].outcome_id)
}

/// Open a multi-outcome event and return its id with outcome ids in label order.
pub fn make_multi_event<S: RecordStore>(
    service: &MarketService<S>,
    title: &str,
    labels: &[&str],
) -> (EventId, Vec<OutcomeId>) {
    let labels: Vec<String> = labels.iter().map(|l| (*l).to_string()).collect();
    let (event, odds) = service
        .create_event(title, "", EventKind::Multi, &labels)
        .expect("create event");
    (event.id, odds.iter().map(|o| o.outcome_id).collect())
}
