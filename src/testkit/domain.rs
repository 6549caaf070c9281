//! A small seeded market for tests.
//!
//! Two users with the default starting balance and one open binary event,
//! backed by [`MemoryStore`] and observed through a [`RecordingNotifier`].

use std::sync::Arc;

use crate::adapter::outbound::memory::MemoryStore;
use crate::application::lock::StoreLock;
use crate::application::market::MarketService;
use crate::domain::money::DEFAULT_STARTING_BALANCE;
use crate::domain::{EventId, EventKind, OutcomeId, UserId};

use super::notifier::RecordingNotifier;

/// Seeded market plus the ids tests trade against.
pub struct SeededMarket {
    pub service: MarketService<MemoryStore>,
    pub notifier: RecordingNotifier,
    pub alice: UserId,
    pub bob: UserId,
    pub event: EventId,
    pub yes: OutcomeId,
    pub no: OutcomeId,
}

/// Market service over a fresh in-memory store, with a recording notifier.
#[must_use]
pub fn empty_market() -> (MarketService<MemoryStore>, RecordingNotifier) {
    let notifier = RecordingNotifier::new();
    let service = MarketService::new(
        Arc::new(MemoryStore::new()),
        StoreLock::default(),
        Arc::new(notifier.clone()),
        DEFAULT_STARTING_BALANCE,
    );
    (service, notifier)
}

/// Users `alice` and `bob` and the binary event "Will it rain?".
///
/// The notifier is cleared after seeding.
///
/// # Panics
/// Panics if seeding fails, which only happens if the store is broken.
#[must_use]
pub fn seeded_market() -> SeededMarket {
    let (service, notifier) = empty_market();
    let alice = service.create_user("alice", false).expect("create alice");
    let bob = service.create_user("bob", false).expect("create bob");
    let (event, odds) = service
        .create_event("Will it rain?", "", EventKind::Binary, &[])
        .expect("create event");
    notifier.clear();

    SeededMarket {
        service,
        notifier,
        alice: alice.id,
        bob: bob.id,
        event: event.id,
        yes: odds[0].outcome_id,
        no: odds[1].outcome_id,
    }
}
