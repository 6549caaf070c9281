//! Market service: the lock-holding facade over the engine.
//!
//! Every public call takes the store lock for its whole duration, runs the
//! engine or admin operation, and then fans the result out: odds snapshots,
//! the activity feed and subscriber notifications. Side effects that follow a
//! committed trade are best-effort; their failures are logged, not returned.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use super::engine::{BuyReceipt, MarketEngine, SellReceipt};
use crate::domain::money::{
    pool_share, round_points, truncate_points, MAX_BALANCE, WINNER_BONUS,
};
use crate::domain::{
    ActivityEntry, ActivityKind, Event, EventId, EventKind, MarketError, NewActivity, NewEvent,
    NewOutcome, NewSnapshot, NewUser, OddsSnapshot, OutcomeId, OutcomeOdds, Points, Position,
    Resolution, Shares, User, UserId,
};
use crate::error::Result;
use crate::port::{Changeset, Message, Notifier, RecordStore};

use crate::application::lock::StoreLock;

/// A completed trade together with the odds it produced.
#[derive(Debug, Clone)]
pub struct Trade<R> {
    pub receipt: R,
    pub odds: Vec<OutcomeOdds>,
}

/// Event with its live odds, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    #[serde(flatten)]
    pub event: Event,
    pub odds: Vec<OutcomeOdds>,
    pub last_trade_at: Option<DateTime<Utc>>,
}

impl EventSummary {
    /// Most recent trade time, falling back to creation.
    #[must_use]
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_trade_at.unwrap_or(self.event.created_at)
    }
}

/// Event detail with the viewer's own positions.
#[derive(Debug, Clone, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub odds: Vec<OutcomeOdds>,
    pub positions: Vec<Position>,
}

/// One open position in a user's portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortfolioPosition {
    pub event_id: EventId,
    pub event_title: String,
    pub outcome_id: OutcomeId,
    pub outcome_label: String,
    pub shares: Shares,
    pub avg_price: Decimal,
    /// What the position would pay if its outcome won now, bonus included.
    pub potential_payout: Points,
}

/// A user's open exposure across events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Portfolio {
    pub positions: Vec<PortfolioPosition>,
    pub total_invested: Points,
    pub total_potential: Points,
    pub active_markets: usize,
}

/// Lock-holding market facade.
pub struct MarketService<S> {
    engine: MarketEngine<S>,
    store: Arc<S>,
    lock: StoreLock,
    notifier: Arc<dyn Notifier>,
    starting_balance: Points,
}

impl<S: RecordStore> MarketService<S> {
    pub fn new(
        store: Arc<S>,
        lock: StoreLock,
        notifier: Arc<dyn Notifier>,
        starting_balance: Points,
    ) -> Self {
        Self {
            engine: MarketEngine::new(Arc::clone(&store)),
            store,
            lock,
            notifier,
            starting_balance,
        }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn lock(&self) -> &StoreLock {
        &self.lock
    }

    // ----- trading -----

    /// Buy `amount` points of `outcome_id` for `user_id`.
    ///
    /// # Errors
    /// Domain errors from the engine, lock timeouts and store failures.
    pub fn buy(
        &self,
        user_id: UserId,
        event_id: EventId,
        outcome_id: OutcomeId,
        amount: Points,
    ) -> Result<Trade<BuyReceipt>> {
        let _guard = self.lock.write()?;
        let receipt = self.engine.buy(user_id, event_id, outcome_id, amount)?;
        let odds = self.after_trade(user_id, event_id, outcome_id, |name, label, title| {
            format!("{name} bought {amount} shares of {label} on '{title}'")
        });
        Ok(Trade { receipt, odds })
    }

    /// Sell `shares` of `outcome_id` for `user_id`.
    ///
    /// # Errors
    /// Domain errors from the engine, lock timeouts and store failures.
    pub fn sell(
        &self,
        user_id: UserId,
        event_id: EventId,
        outcome_id: OutcomeId,
        shares: Shares,
    ) -> Result<Trade<SellReceipt>> {
        let _guard = self.lock.write()?;
        let receipt = self.engine.sell(user_id, event_id, outcome_id, shares)?;
        let odds = self.after_trade(user_id, event_id, outcome_id, |name, label, title| {
            format!("{name} sold {} shares of {label} on '{title}'", shares.trunc())
        });
        Ok(Trade { receipt, odds })
    }

    /// Resolve `event_id` and notify every participant.
    ///
    /// # Errors
    /// Domain errors from the engine, lock timeouts and store failures.
    pub fn resolve(&self, event_id: EventId, winning_outcome_id: OutcomeId) -> Result<Resolution> {
        let _guard = self.lock.write()?;
        let resolution = self.engine.resolve(event_id, winning_outcome_id)?;

        // Payouts are committed; from here on failures are logged, not returned.
        let title = match self.store.event(event_id) {
            Ok(event) => event.map(|e| e.title).unwrap_or_default(),
            Err(e) => {
                warn!(event_id = %event_id, error = %e, "Failed to read resolved event");
                String::new()
            }
        };
        let winner_label = match self.store.outcomes_for_event(event_id) {
            Ok(outcomes) => outcomes
                .into_iter()
                .find(|o| o.id == winning_outcome_id)
                .map(|o| o.label)
                .unwrap_or_default(),
            Err(e) => {
                warn!(event_id = %event_id, error = %e, "Failed to read resolved outcomes");
                String::new()
            }
        };

        for outcome in resolution.outcomes.iter() {
            self.notifier
                .send_to(outcome.user_id, Message::user_resolved(outcome, &title));
        }
        self.notifier.broadcast(Message::event_resolved(
            event_id,
            &title,
            winning_outcome_id,
            &winner_label,
        ));

        self.log_activity(
            NewActivity::new(
                ActivityKind::EventResolved,
                format!("'{title}' resolved: {winner_label} wins!"),
            )
            .event(event_id),
        );
        for winner in resolution.winners().filter(|w| w.payout > 0) {
            let user = match self.store.user(winner.user_id) {
                Ok(Some(user)) => user,
                Ok(None) => continue,
                Err(e) => {
                    warn!(user_id = %winner.user_id, error = %e, "Failed to read winner");
                    continue;
                }
            };
            self.log_activity(
                NewActivity::new(
                    ActivityKind::Payout,
                    format!("{} won {} pts from '{title}'", user.username, winner.payout),
                )
                .user(winner.user_id)
                .event(event_id),
            );
        }

        Ok(resolution)
    }

    // ----- reads -----

    /// Live odds for an existing event.
    ///
    /// # Errors
    /// [`MarketError::EventNotFound`], lock timeouts and store failures.
    pub fn odds(&self, event_id: EventId) -> Result<Vec<OutcomeOdds>> {
        let _guard = self.lock.read()?;
        self.require_event(event_id)?;
        self.engine.odds(event_id)
    }

    /// All events with live odds, most recently traded first.
    ///
    /// # Errors
    /// Lock timeouts and store failures.
    pub fn list_events(&self) -> Result<Vec<EventSummary>> {
        let _guard = self.lock.read()?;
        let mut summaries = Vec::new();
        for event in self.store.events()? {
            let odds = self.engine.odds(event.id)?;
            let last_trade_at = self
                .store
                .snapshots_for_event(event.id)?
                .last()
                .map(|s| s.created_at);
            summaries.push(EventSummary {
                event,
                odds,
                last_trade_at,
            });
        }
        summaries.sort_by(|a, b| b.last_activity().cmp(&a.last_activity()));
        Ok(summaries)
    }

    /// One event with odds and, when `viewer` is given, their positions.
    ///
    /// # Errors
    /// [`MarketError::EventNotFound`], lock timeouts and store failures.
    pub fn event_detail(&self, event_id: EventId, viewer: Option<UserId>) -> Result<EventDetail> {
        let _guard = self.lock.read()?;
        let event = self.require_event(event_id)?;
        let odds = self.engine.odds(event_id)?;
        let positions = match viewer {
            Some(user_id) => self.store.positions_for_user_event(user_id, event_id)?,
            None => Vec::new(),
        };
        Ok(EventDetail {
            event,
            odds,
            positions,
        })
    }

    /// Open positions of `user_id` with their potential payouts.
    ///
    /// # Errors
    /// Lock timeouts and store failures.
    pub fn portfolio(&self, user_id: UserId) -> Result<Portfolio> {
        let _guard = self.lock.read()?;
        let mut portfolio = Portfolio::default();
        let mut seen = std::collections::HashSet::new();

        for p in self.store.positions_for_user(user_id)? {
            let Some(event) = self.store.event(p.event_id)? else {
                continue;
            };
            if event.is_resolved() {
                continue;
            }

            let odds = self.engine.odds(p.event_id)?;
            let total_pool: Shares = odds.iter().map(|o| o.shares).sum();
            let held = odds.iter().find(|o| o.outcome_id == p.outcome_id);
            let outcome_label = held.map(|o| o.label.clone()).unwrap_or_default();
            let outcome_shares = held.map_or(Decimal::ZERO, |o| o.shares);
            let pool_payout = if outcome_shares.is_zero() {
                0
            } else {
                pool_share(total_pool, p.shares, outcome_shares)?
            };
            // Same flat bonus resolve pays, so the preview matches the payout.
            let potential_payout = pool_payout + WINNER_BONUS;

            portfolio.total_invested += round_points(p.shares)?;
            portfolio.total_potential += potential_payout;
            if seen.insert(p.event_id) {
                portfolio.active_markets += 1;
            }
            portfolio.positions.push(PortfolioPosition {
                event_id: p.event_id,
                event_title: event.title,
                outcome_id: p.outcome_id,
                outcome_label,
                shares: p.shares,
                avg_price: p.avg_price,
                potential_payout,
            });
        }

        Ok(portfolio)
    }

    /// Odds history of an event, oldest first.
    ///
    /// # Errors
    /// [`MarketError::EventNotFound`], lock timeouts and store failures.
    pub fn odds_history(&self, event_id: EventId) -> Result<Vec<OddsSnapshot>> {
        let _guard = self.lock.read()?;
        self.require_event(event_id)?;
        self.store.snapshots_for_event(event_id)
    }

    /// The newest `limit` activity entries.
    ///
    /// # Errors
    /// Lock timeouts and store failures.
    pub fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityEntry>> {
        let _guard = self.lock.read()?;
        self.store.recent_activity(limit)
    }

    /// Look up a user.
    ///
    /// # Errors
    /// [`MarketError::UserNotFound`], lock timeouts and store failures.
    pub fn user(&self, user_id: UserId) -> Result<User> {
        let _guard = self.lock.read()?;
        Ok(self
            .store
            .user(user_id)?
            .ok_or(MarketError::UserNotFound(user_id))?)
    }

    /// All users in id order.
    ///
    /// # Errors
    /// Lock timeouts and store failures.
    pub fn users(&self) -> Result<Vec<User>> {
        let _guard = self.lock.read()?;
        self.store.users()
    }

    // ----- admin -----

    /// Register a user with the configured starting balance.
    ///
    /// # Errors
    /// [`MarketError::InvalidRequest`] for blank or taken usernames, lock
    /// timeouts and store failures.
    pub fn create_user(&self, username: &str, is_admin: bool) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(MarketError::InvalidRequest("username is required".into()).into());
        }

        let _guard = self.lock.write()?;
        if self
            .store
            .users()?
            .iter()
            .any(|u| u.username.eq_ignore_ascii_case(username))
        {
            return Err(
                MarketError::InvalidRequest(format!("username '{username}' is taken")).into(),
            );
        }

        let mut new_user = NewUser::new(username, self.starting_balance);
        if is_admin {
            new_user = new_user.admin();
        }
        let user = self.store.create_user(new_user)?;
        info!(user_id = %user.id, username = %user.username, is_admin, "User created");
        Ok(user)
    }

    /// Overwrite a user's balance.
    ///
    /// # Errors
    /// [`MarketError::InvalidRequest`] for a balance outside
    /// `0..=MAX_BALANCE`, [`MarketError::UserNotFound`], lock timeouts and
    /// store failures.
    pub fn set_balance(&self, user_id: UserId, balance: Points) -> Result<User> {
        if !(0..=MAX_BALANCE).contains(&balance) {
            return Err(MarketError::InvalidRequest(format!(
                "balance must be between 0 and {MAX_BALANCE}"
            ))
            .into());
        }

        let _guard = self.lock.write()?;
        let mut user = self
            .store
            .user(user_id)?
            .ok_or(MarketError::UserNotFound(user_id))?;
        let previous = user.balance;
        user.balance = balance;
        self.store.update_user(&user)?;
        info!(user_id = %user_id, previous, balance, "Balance overridden");
        Ok(user)
    }

    /// Create an open event with its outcomes and announce it.
    ///
    /// # Errors
    /// [`MarketError::InvalidRequest`] for a blank title or bad outcome list,
    /// lock timeouts and store failures.
    pub fn create_event(
        &self,
        title: &str,
        description: &str,
        kind: EventKind,
        labels: &[String],
    ) -> Result<(Event, Vec<OutcomeOdds>)> {
        if title.trim().is_empty() {
            return Err(MarketError::InvalidRequest("title is required".into()).into());
        }
        let labels = kind.outcome_labels(labels)?;

        let _guard = self.lock.write()?;
        let event = self
            .store
            .create_event(NewEvent::new(title, description, kind))?;
        for label in labels {
            self.store.create_outcome(NewOutcome::new(event.id, label))?;
        }

        let odds = self.engine.odds(event.id).unwrap_or_else(|e| {
            warn!(event_id = %event.id, error = %e, "Failed to read odds of new event");
            Vec::new()
        });
        self.snapshot(event.id, &odds);
        self.notifier.broadcast(Message::event_created(&event, &odds));
        self.log_activity(
            NewActivity::new(
                ActivityKind::EventCreated,
                format!("New market: '{}'", event.title),
            )
            .event(event.id),
        );

        info!(event_id = %event.id, title = %event.title, kind = %event.kind, "Event created");
        Ok((event, odds))
    }

    /// Edit an event's text and, when `labels` is non-empty, replace its
    /// outcomes wholesale.
    ///
    /// # Errors
    /// [`MarketError::InvalidRequest`], [`MarketError::EventNotFound`], lock
    /// timeouts and store failures.
    pub fn update_event(
        &self,
        event_id: EventId,
        title: &str,
        description: &str,
        labels: &[String],
    ) -> Result<Event> {
        if title.trim().is_empty() {
            return Err(MarketError::InvalidRequest("title is required".into()).into());
        }

        let _guard = self.lock.write()?;
        let mut event = self.require_event(event_id)?;
        event.title = title.to_string();
        event.description = description.to_string();
        self.store.update_event(&event)?;

        if !labels.is_empty() {
            self.store.delete_outcomes_for_event(event_id)?;
            for label in labels {
                self.store
                    .create_outcome(NewOutcome::new(event_id, label.clone()))?;
            }
        }

        self.notifier.broadcast(Message::event_changed(&event));
        info!(event_id = %event_id, outcomes_replaced = !labels.is_empty(), "Event updated");
        Ok(event)
    }

    /// Delete an event, refunding open positions at face value (truncated).
    ///
    /// Returns the number of points refunded.
    ///
    /// # Errors
    /// [`MarketError::EventNotFound`], lock timeouts and store failures.
    pub fn delete_event(&self, event_id: EventId) -> Result<Points> {
        let _guard = self.lock.write()?;
        self.require_event(event_id)?;

        let mut changes = Changeset::new();
        let mut refunded = 0;
        for p in self.store.positions_for_event(event_id)? {
            let refund = truncate_points(p.shares)?;
            changes.credit(p.user_id, refund)?;
            refunded += refund;
        }
        changes.close_event_positions(event_id);
        self.store.commit(changes)?;

        self.store.delete_outcomes_for_event(event_id)?;
        self.store.delete_transactions_for_event(event_id)?;
        self.store.delete_snapshots_for_event(event_id)?;
        self.store.delete_event(event_id)?;

        self.notifier.broadcast(Message::event_deleted(event_id));
        info!(event_id = %event_id, refunded, "Event deleted");
        Ok(refunded)
    }

    /// Reopen a resolved event. Payouts already made are not reversed.
    ///
    /// # Errors
    /// [`MarketError::EventNotFound`], [`MarketError::NotResolved`], lock
    /// timeouts and store failures.
    pub fn unresolve_event(&self, event_id: EventId) -> Result<Event> {
        let _guard = self.lock.write()?;
        let mut event = self.require_event(event_id)?;
        if !event.is_resolved() {
            return Err(MarketError::NotResolved(event_id).into());
        }
        event.reopen();
        self.store.update_event(&event)?;

        self.notifier.broadcast(Message::event_changed(&event));
        warn!(event_id = %event_id, "Event reopened after resolution");
        Ok(event)
    }

    // ----- helpers -----

    fn require_event(&self, event_id: EventId) -> Result<Event> {
        Ok(self
            .store
            .event(event_id)?
            .ok_or(MarketError::EventNotFound(event_id))?)
    }

    /// Snapshot odds, announce them and log the trade to the feed.
    fn after_trade<F>(
        &self,
        user_id: UserId,
        event_id: EventId,
        outcome_id: OutcomeId,
        describe: F,
    ) -> Vec<OutcomeOdds>
    where
        F: FnOnce(&str, &str, &str) -> String,
    {
        let odds = match self.engine.odds(event_id) {
            Ok(odds) => odds,
            Err(e) => {
                warn!(event_id = %event_id, error = %e, "Failed to read odds after trade");
                return Vec::new();
            }
        };
        self.snapshot(event_id, &odds);
        self.notifier.broadcast(Message::odds_updated(event_id, &odds));

        match (self.store.user(user_id), self.store.event(event_id)) {
            (Ok(Some(user)), Ok(Some(event))) => {
                let label = odds
                    .iter()
                    .find(|o| o.outcome_id == outcome_id)
                    .map_or("", |o| o.label.as_str());
                self.log_activity(
                    NewActivity::new(
                        ActivityKind::Trade,
                        describe(&user.username, label, &event.title),
                    )
                    .user(user_id)
                    .event(event_id),
                );
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(
                    user_id = %user_id,
                    event_id = %event_id,
                    error = %e,
                    "Failed to describe trade"
                );
            }
            _ => {}
        }
        odds
    }

    fn snapshot(&self, event_id: EventId, odds: &[OutcomeOdds]) {
        for snapshot in NewSnapshot::batch(event_id, odds) {
            if let Err(e) = self.store.append_snapshot(snapshot) {
                warn!(event_id = %event_id, error = %e, "Failed to record odds snapshot");
            }
        }
    }

    fn log_activity(&self, entry: NewActivity) {
        match self.store.append_activity(entry) {
            Ok(entry) => self.notifier.broadcast(Message::activity(&entry)),
            Err(e) => warn!(error = %e, "Failed to record activity"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ActivityKind;
    use crate::error::Error;
    use crate::port::{NotificationKind, PositionStore};
    use crate::testkit::domain::{empty_market, seeded_market};
    use rust_decimal_macros::dec;

    fn market_error(err: Error) -> MarketError {
        match err {
            Error::Market(e) => e,
            other => panic!("expected market error, got {other:?}"),
        }
    }

    #[test]
    fn buy_records_snapshot_broadcast_and_activity() {
        let m = seeded_market();

        let trade = m.service.buy(m.alice, m.event, m.yes, 100).unwrap();

        assert_eq!(trade.receipt.balance, 900);
        assert_eq!(trade.odds[0].odds, dec!(100));
        assert_eq!(
            m.notifier.kinds(),
            vec![NotificationKind::OddsUpdated, NotificationKind::ActivityNew]
        );
        // creation snapshot (2 rows) + trade snapshot (2 rows)
        assert_eq!(m.service.odds_history(m.event).unwrap().len(), 4);

        let feed = m.service.recent_activity(1).unwrap();
        assert_eq!(feed[0].kind, ActivityKind::Trade);
        assert_eq!(
            feed[0].message,
            "alice bought 100 shares of Yes on 'Will it rain?'"
        );
    }

    #[test]
    fn failed_buy_notifies_nobody() {
        let m = seeded_market();

        let err = m.service.buy(m.alice, m.event, m.yes, 5_000).unwrap_err();

        assert!(matches!(
            market_error(err),
            MarketError::InsufficientBalance { balance: 1000, requested: 5000 }
        ));
        assert!(m.notifier.is_empty());
    }

    #[test]
    fn sell_logs_whole_shares() {
        let m = seeded_market();
        m.service.buy(m.alice, m.event, m.yes, 100).unwrap();

        let trade = m.service.sell(m.alice, m.event, m.yes, dec!(40)).unwrap();

        assert_eq!(trade.receipt.points, 20);
        assert_eq!(trade.receipt.balance, 920);
        let feed = m.service.recent_activity(1).unwrap();
        assert_eq!(feed[0].message, "alice sold 40 shares of Yes on 'Will it rain?'");
    }

    #[test]
    fn resolve_sends_personal_notices_then_broadcast() {
        let m = seeded_market();
        m.service.buy(m.alice, m.event, m.yes, 100).unwrap();
        m.service.buy(m.bob, m.event, m.no, 50).unwrap();
        m.notifier.clear();

        let resolution = m.service.resolve(m.event, m.yes).unwrap();

        assert_eq!(resolution.outcomes.get(m.alice).unwrap().payout, 200);
        let to_alice = m.notifier.direct(m.alice);
        assert_eq!(to_alice.len(), 1);
        assert_eq!(to_alice[0].data["won"], true);
        assert_eq!(to_alice[0].data["payout"], 200);
        let to_bob = m.notifier.direct(m.bob);
        assert_eq!(to_bob[0].data["won"], false);

        let broadcasts = m.notifier.broadcasts();
        assert_eq!(broadcasts[0].kind, NotificationKind::EventResolved);
        assert_eq!(broadcasts[0].data["winner_label"], "Yes");

        let feed = m.service.recent_activity(2).unwrap();
        assert_eq!(feed[0].message, "alice won 200 pts from 'Will it rain?'");
        assert_eq!(feed[1].message, "'Will it rain?' resolved: Yes wins!");
    }

    #[test]
    fn list_events_puts_recent_trades_first() {
        let m = seeded_market();
        let (second, _) = m
            .service
            .create_event("Snow?", "", EventKind::Binary, &[])
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        m.service.buy(m.alice, m.event, m.yes, 10).unwrap();

        let events = m.service.list_events().unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event.id, m.event);
        assert_eq!(events[1].event.id, second.id);
    }

    #[test]
    fn event_detail_shows_only_viewer_positions() {
        let m = seeded_market();
        m.service.buy(m.alice, m.event, m.yes, 10).unwrap();
        m.service.buy(m.bob, m.event, m.no, 10).unwrap();

        let detail = m.service.event_detail(m.event, Some(m.alice)).unwrap();
        assert_eq!(detail.positions.len(), 1);
        assert_eq!(detail.positions[0].user_id, m.alice);

        let anonymous = m.service.event_detail(m.event, None).unwrap();
        assert!(anonymous.positions.is_empty());
    }

    #[test]
    fn portfolio_counts_open_markets_only() {
        let m = seeded_market();
        let (other, odds) = m
            .service
            .create_event("Snow?", "", EventKind::Binary, &[])
            .unwrap();
        m.service.buy(m.alice, m.event, m.yes, 100).unwrap();
        m.service.buy(m.bob, m.event, m.no, 100).unwrap();
        m.service.buy(m.alice, other.id, odds[0].outcome_id, 30).unwrap();

        let portfolio = m.service.portfolio(m.alice).unwrap();
        assert_eq!(portfolio.active_markets, 2);
        assert_eq!(portfolio.total_invested, 130);
        // 200 pool / 100 winning shares * 100 held + bonus; 30 / 30 * 30 + bonus
        assert_eq!(portfolio.total_potential, 250 + 80);

        m.service.resolve(other.id, odds[0].outcome_id).unwrap();
        let portfolio = m.service.portfolio(m.alice).unwrap();
        assert_eq!(portfolio.active_markets, 1);
        assert_eq!(portfolio.positions[0].event_id, m.event);
    }

    #[test]
    fn create_user_rejects_blank_and_duplicate_names() {
        let m = seeded_market();

        let blank = m.service.create_user("   ", false).unwrap_err();
        assert!(matches!(market_error(blank), MarketError::InvalidRequest(_)));

        let taken = m.service.create_user("ALICE", false).unwrap_err();
        assert!(matches!(market_error(taken), MarketError::InvalidRequest(_)));

        let carol = m.service.create_user("  carol ", true).unwrap();
        assert_eq!(carol.username, "carol");
        assert!(carol.is_admin);
        assert_eq!(carol.balance, 1000);
    }

    #[test]
    fn set_balance_overwrites() {
        let m = seeded_market();
        let user = m.service.set_balance(m.bob, 5).unwrap();
        assert_eq!(user.balance, 5);
        assert_eq!(m.service.user(m.bob).unwrap().balance, 5);

        let missing = m.service.set_balance(UserId::new(999), 5).unwrap_err();
        assert!(matches!(market_error(missing), MarketError::UserNotFound(_)));
    }

    #[test]
    fn set_balance_rejects_out_of_range() {
        let m = seeded_market();

        for balance in [-500, i64::MAX, MAX_BALANCE + 1] {
            let err = m.service.set_balance(m.bob, balance).unwrap_err();
            assert!(matches!(market_error(err), MarketError::InvalidRequest(_)));
        }
        assert_eq!(m.service.user(m.bob).unwrap().balance, 1000);

        let user = m.service.set_balance(m.bob, MAX_BALANCE).unwrap();
        assert_eq!(user.balance, MAX_BALANCE);
        let user = m.service.set_balance(m.bob, 0).unwrap();
        assert_eq!(user.balance, 0);
    }

    #[test]
    fn capped_balance_survives_buy_and_resolve() {
        let m = seeded_market();
        m.service.set_balance(m.alice, MAX_BALANCE).unwrap();

        m.service.buy(m.alice, m.event, m.yes, MAX_BALANCE).unwrap();
        m.service.buy(m.bob, m.event, m.no, 1000).unwrap();
        m.service.resolve(m.event, m.yes).unwrap();

        assert_eq!(
            m.service.user(m.alice).unwrap().balance,
            MAX_BALANCE + 1000 + WINNER_BONUS
        );
    }

    #[test]
    fn create_event_validates_and_announces() {
        let (service, notifier) = empty_market();

        let blank = service
            .create_event(" ", "", EventKind::Binary, &[])
            .unwrap_err();
        assert!(matches!(market_error(blank), MarketError::InvalidRequest(_)));

        let one_outcome = service
            .create_event("Winner?", "", EventKind::Multi, &["A".to_string()])
            .unwrap_err();
        assert!(matches!(market_error(one_outcome), MarketError::InvalidRequest(_)));
        assert!(notifier.is_empty());

        let labels = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let (event, odds) = service
            .create_event("Winner?", "three way", EventKind::Multi, &labels)
            .unwrap();
        assert_eq!(odds.len(), 3);
        assert_eq!(odds[0].odds, dec!(33.33));
        assert_eq!(event.description, "three way");
        assert_eq!(
            notifier.kinds(),
            vec![NotificationKind::EventCreated, NotificationKind::ActivityNew]
        );
        assert_eq!(
            service.recent_activity(1).unwrap()[0].message,
            "New market: 'Winner?'"
        );
    }

    #[test]
    fn update_event_replaces_outcomes_when_given() {
        let m = seeded_market();

        let event = m
            .service
            .update_event(m.event, "Will it pour?", "heavy rain", &[])
            .unwrap();
        assert_eq!(event.title, "Will it pour?");
        assert_eq!(m.service.odds(m.event).unwrap().len(), 2);

        let labels = vec!["Light".to_string(), "Heavy".to_string(), "None".to_string()];
        m.service
            .update_event(m.event, "How much rain?", "", &labels)
            .unwrap();
        let odds = m.service.odds(m.event).unwrap();
        assert_eq!(
            odds.iter().map(|o| o.label.as_str()).collect::<Vec<_>>(),
            vec!["Light", "Heavy", "None"]
        );
    }

    #[test]
    fn delete_event_refunds_truncated_shares() {
        let m = seeded_market();
        m.service.buy(m.alice, m.event, m.yes, 100).unwrap();
        m.service.buy(m.bob, m.event, m.no, 40).unwrap();
        m.notifier.clear();

        let refunded = m.service.delete_event(m.event).unwrap();

        assert_eq!(refunded, 140);
        assert_eq!(m.service.user(m.alice).unwrap().balance, 1000);
        assert_eq!(m.service.user(m.bob).unwrap().balance, 1000);
        assert!(m.service.store().positions_for_event(m.event).unwrap().is_empty());
        assert!(matches!(
            market_error(m.service.odds(m.event).unwrap_err()),
            MarketError::EventNotFound(_)
        ));
        let broadcasts = m.notifier.broadcasts();
        assert_eq!(broadcasts.len(), 1);
        assert_eq!(broadcasts[0].data["deleted"], true);
    }

    #[test]
    fn unresolve_reopens_without_reversing_payouts() {
        let m = seeded_market();
        m.service.buy(m.alice, m.event, m.yes, 100).unwrap();
        m.service.resolve(m.event, m.yes).unwrap();
        let paid = m.service.user(m.alice).unwrap().balance;

        let not_resolved = m.service.unresolve_event(EventId::new(999)).unwrap_err();
        assert!(matches!(market_error(not_resolved), MarketError::EventNotFound(_)));

        let event = m.service.unresolve_event(m.event).unwrap();
        assert!(event.is_open());
        assert_eq!(event.winning_outcome_id, None);
        assert_eq!(m.service.user(m.alice).unwrap().balance, paid);

        let again = m.service.unresolve_event(m.event).unwrap_err();
        assert!(matches!(market_error(again), MarketError::NotResolved(_)));
    }

    fn flaky_market() -> (
        MarketService<crate::testkit::store::FlakyStore>,
        crate::testkit::notifier::RecordingNotifier,
    ) {
        let notifier = crate::testkit::notifier::RecordingNotifier::new();
        let service = MarketService::new(
            Arc::new(crate::testkit::store::FlakyStore::new()),
            StoreLock::default(),
            Arc::new(notifier.clone()),
            1000,
        );
        (service, notifier)
    }

    #[test]
    fn committed_buy_succeeds_when_follow_up_reads_fail() {
        let (service, notifier) = flaky_market();
        let alice = service.create_user("alice", false).unwrap();
        let (event, odds) = service
            .create_event("Will it rain?", "", EventKind::Binary, &[])
            .unwrap();
        notifier.clear();

        service.store().arm();
        let trade = service.buy(alice.id, event.id, odds[0].outcome_id, 100).unwrap();

        assert_eq!(trade.receipt.balance, 900);
        assert!(trade.odds.is_empty());
        assert!(notifier.is_empty());
        service.store().disarm();
        assert_eq!(service.user(alice.id).unwrap().balance, 900);
    }

    #[test]
    fn committed_resolve_succeeds_when_follow_up_reads_fail() {
        let (service, notifier) = flaky_market();
        let alice = service.create_user("alice", false).unwrap();
        let bob = service.create_user("bob", false).unwrap();
        let (event, odds) = service
            .create_event("Will it rain?", "", EventKind::Binary, &[])
            .unwrap();
        let (yes, no) = (odds[0].outcome_id, odds[1].outcome_id);
        service.buy(alice.id, event.id, yes, 100).unwrap();
        service.buy(bob.id, event.id, no, 50).unwrap();
        notifier.clear();

        service.store().arm();
        let resolution = service.resolve(event.id, yes).unwrap();

        assert_eq!(resolution.outcomes.get(alice.id).unwrap().payout, 200);
        assert_eq!(notifier.direct(alice.id).len(), 1);
        assert_eq!(notifier.direct(bob.id).len(), 1);
        service.store().disarm();
        assert_eq!(service.user(alice.id).unwrap().balance, 1100);
        assert!(service.event_detail(event.id, None).unwrap().event.is_resolved());
    }

    #[test]
    fn writes_time_out_while_lock_is_held() {
        let notifier = crate::testkit::notifier::RecordingNotifier::new();
        let service = MarketService::new(
            Arc::new(crate::adapter::outbound::memory::MemoryStore::new()),
            StoreLock::new(std::time::Duration::from_millis(20)),
            Arc::new(notifier),
            1000,
        );

        let _held = service.lock().read().unwrap();
        let err = service.create_user("alice", false).unwrap_err();
        assert!(matches!(err, Error::LockTimeout(_)));
    }
}
