//! Concurrent trading through one service.

mod support;

use std::sync::Arc;
use std::thread;

use parimarket::adapter::outbound::memory::MemoryStore;
use parimarket::port::PositionStore;
use rust_decimal::Decimal;

#[test]
fn concurrent_buys_conserve_points() {
    let (service, _) = support::market::service_over(Arc::new(MemoryStore::new()));
    let users = support::market::make_users(&service, 8);
    let (event, yes, no) = support::market::make_binary_event(&service, "Rain?");
    let service = Arc::new(service);

    let handles: Vec<_> = users
        .iter()
        .enumerate()
        .map(|(i, &user)| {
            let service = Arc::clone(&service);
            let outcome = if i % 2 == 0 { yes } else { no };
            thread::spawn(move || {
                for _ in 0..20 {
                    service.buy(user, event, outcome, 5).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let balances: i64 = users
        .iter()
        .map(|u| service.user(*u).unwrap().balance)
        .sum();
    let pool: Decimal = service
        .store()
        .positions_for_event(event)
        .unwrap()
        .iter()
        .map(|p| p.shares)
        .sum();

    assert_eq!(balances, 8 * 900);
    assert_eq!(pool, Decimal::from(8 * 100));
    assert_eq!(service.store().positions_for_event(event).unwrap().len(), 8);
}

#[test]
fn overspending_race_never_goes_negative() {
    let (service, _) = support::market::service_over(Arc::new(MemoryStore::new()));
    let user = support::market::make_users(&service, 1)[0];
    let (event, yes, _) = support::market::make_binary_event(&service, "Rain?");
    let service = Arc::new(service);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let service = Arc::clone(&service);
            thread::spawn(move || service.buy(user, event, yes, 400).is_ok())
        })
        .collect();
    let succeeded = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(succeeded, 2);
    assert_eq!(service.user(user).unwrap().balance, 200);
}

#[test]
fn resolution_races_with_buys_cleanly() {
    let (service, _) = support::market::service_over(Arc::new(MemoryStore::new()));
    let users = support::market::make_users(&service, 4);
    let (event, yes, _) = support::market::make_binary_event(&service, "Rain?");
    service.buy(users[0], event, yes, 10).unwrap();
    let service = Arc::new(service);

    let buyers: Vec<_> = users[1..]
        .iter()
        .map(|&user| {
            let service = Arc::clone(&service);
            thread::spawn(move || service.buy(user, event, yes, 10).is_ok())
        })
        .collect();
    let resolver = {
        let service = Arc::clone(&service);
        thread::spawn(move || service.resolve(event, yes).unwrap())
    };

    let resolution = resolver.join().unwrap();
    let bought = buyers.into_iter().filter_map(|h| h.join().ok()).filter(|ok| *ok).count();

    // Every buy that landed before resolution was paid; later buys were rejected.
    assert_eq!(resolution.outcomes.len(), 1 + bought);
    let total: i64 = users.iter().map(|u| service.user(*u).unwrap().balance).sum();
    let winners = resolution.winners().count() as i64;
    assert_eq!(total, 4 * 1000 + 50 * winners);
}
