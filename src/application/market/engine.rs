//! Market engine: odds, buy, sell and resolve.
//!
//! The engine validates every precondition before touching the store, then
//! expresses the whole operation as a single [`Changeset`] so that a trade or
//! a resolution lands completely or not at all.
//!
//! The caller must hold the store's write lock for `buy`, `sell` and
//! `resolve`, and at least the read lock for `odds`.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::domain::money::{pool_share, round_points, sell_proceeds, WINNER_BONUS};
use crate::domain::{
    compute_odds, Event, EventId, MarketError, NewPosition, NewTransaction, OutcomeId,
    OutcomeOdds, Points, Resolution, Settlement, Shares, TxKind, UserId, UserOutcome,
    UserOutcomes,
};
use crate::error::Result;
use crate::port::{Changeset, RecordStore};

/// Result of a successful purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyReceipt {
    pub user_id: UserId,
    pub event_id: EventId,
    pub outcome_id: OutcomeId,
    /// Shares bought (always equal to points spent).
    pub shares: Shares,
    /// Price charged for average-price accounting, as a 0..1 fraction.
    pub price: Decimal,
    /// Total shares held on the outcome after the purchase.
    pub position_shares: Shares,
    /// Balance after the debit.
    pub balance: Points,
}

/// Result of a successful sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellReceipt {
    pub user_id: UserId,
    pub event_id: EventId,
    pub outcome_id: OutcomeId,
    pub shares: Shares,
    /// Points credited to the seller.
    pub points: Points,
    /// Shares still held; zero once the position is closed.
    pub remaining_shares: Shares,
    /// Balance after the credit.
    pub balance: Points,
}

/// Pari-mutuel market engine over a [`RecordStore`].
pub struct MarketEngine<S> {
    store: Arc<S>,
}

impl<S> Clone for MarketEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: RecordStore> MarketEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current odds of every outcome of `event_id`.
    ///
    /// Pure read. An unknown event simply has no outcomes and yields an
    /// empty vector.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn odds(&self, event_id: EventId) -> Result<Vec<OutcomeOdds>> {
        let outcomes = self.store.outcomes_for_event(event_id)?;
        let positions = self.store.positions_for_event(event_id)?;
        Ok(compute_odds(&outcomes, &positions))
    }

    /// Spend `amount` points on `outcome_id`, receiving one share per point.
    ///
    /// Checks, in order: positive amount, user exists, balance covers the
    /// amount, event exists and is open, outcome belongs to the event, and
    /// the user holds no other outcome of the event.
    ///
    /// # Errors
    /// Returns the first failing [`MarketError`], or a store failure.
    pub fn buy(
        &self,
        user_id: UserId,
        event_id: EventId,
        outcome_id: OutcomeId,
        amount: Points,
    ) -> Result<BuyReceipt> {
        if amount <= 0 {
            return Err(MarketError::InvalidAmount.into());
        }

        let user = self
            .store
            .user(user_id)?
            .ok_or(MarketError::UserNotFound(user_id))?;
        if !user.can_afford(amount) {
            return Err(MarketError::InsufficientBalance {
                balance: user.balance,
                requested: amount,
            }
            .into());
        }

        self.open_event(event_id)?;

        let outcomes = self.store.outcomes_for_event(event_id)?;
        if !outcomes.iter().any(|o| o.id == outcome_id) {
            return Err(MarketError::InvalidOutcome {
                event_id,
                outcome_id,
            }
            .into());
        }

        let held = self.store.positions_for_user_event(user_id, event_id)?;
        if let Some(other) = held.iter().find(|p| p.outcome_id != outcome_id) {
            return Err(MarketError::ConflictingPosition {
                event_id,
                held: other.outcome_id,
            }
            .into());
        }

        let positions = self.store.positions_for_event(event_id)?;
        let price = compute_odds(&outcomes, &positions)
            .iter()
            .find(|o| o.outcome_id == outcome_id)
            .map(OutcomeOdds::price)
            .filter(|p| !p.is_zero())
            .unwrap_or_else(|| Decimal::ONE / Decimal::from(outcomes.len()));

        let shares = Decimal::from(amount);
        let mut changes = Changeset::new();

        let position_shares = match held.into_iter().find(|p| p.outcome_id == outcome_id) {
            Some(mut position) => {
                position.add_shares(shares, price);
                let total = position.shares;
                changes.update_position(position);
                total
            }
            None => {
                changes.open_position(NewPosition {
                    user_id,
                    event_id,
                    outcome_id,
                    shares,
                    avg_price: price,
                    created_at: Utc::now(),
                });
                shares
            }
        };

        changes.debit(user_id, amount)?.record(NewTransaction::new(
            TxKind::Buy,
            user_id,
            event_id,
            outcome_id,
            shares,
            amount,
        ));
        self.store.commit(changes)?;

        info!(
            user_id = %user_id,
            event_id = %event_id,
            outcome_id = %outcome_id,
            amount,
            price = %price,
            "Buy executed"
        );

        Ok(BuyReceipt {
            user_id,
            event_id,
            outcome_id,
            shares,
            price,
            position_shares,
            balance: user.balance - amount,
        })
    }

    /// Sell whole `shares` of `outcome_id` back for half their face value.
    ///
    /// # Errors
    /// [`MarketError::InvalidAmount`] for non-positive requests,
    /// [`MarketError::FractionalShares`], [`MarketError::EventNotFound`],
    /// [`MarketError::MarketClosed`], [`MarketError::InsufficientShares`],
    /// or a store failure.
    pub fn sell(
        &self,
        user_id: UserId,
        event_id: EventId,
        outcome_id: OutcomeId,
        shares: Shares,
    ) -> Result<SellReceipt> {
        if shares <= Decimal::ZERO {
            return Err(MarketError::InvalidAmount.into());
        }
        if !shares.fract().is_zero() {
            return Err(MarketError::FractionalShares(shares).into());
        }

        self.open_event(event_id)?;

        let mut position = match self.store.position(user_id, event_id, outcome_id)? {
            Some(p) if p.shares >= shares => p,
            other => {
                return Err(MarketError::InsufficientShares {
                    held: other.map_or(Decimal::ZERO, |p| p.shares),
                    requested: shares,
                }
                .into())
            }
        };

        let user = self
            .store
            .user(user_id)?
            .ok_or(MarketError::UserNotFound(user_id))?;
        let points = sell_proceeds(shares)?;

        position.remove_shares(shares);
        let mut changes = Changeset::new();
        let remaining_shares = if position.is_dust() {
            changes.close_position(position.id);
            Decimal::ZERO
        } else {
            let remaining = position.shares;
            changes.update_position(position);
            remaining
        };

        changes.credit(user_id, points)?.record(NewTransaction::new(
            TxKind::Sell,
            user_id,
            event_id,
            outcome_id,
            shares,
            points,
        ));
        self.store.commit(changes)?;

        info!(
            user_id = %user_id,
            event_id = %event_id,
            outcome_id = %outcome_id,
            shares = %shares,
            points,
            "Sell executed"
        );

        Ok(SellReceipt {
            user_id,
            event_id,
            outcome_id,
            shares,
            points,
            remaining_shares,
            balance: user.balance + points,
        })
    }

    /// Settle `event_id` on `winning_outcome_id` and close every position.
    ///
    /// The winning outcome is not checked against the event's outcomes; an
    /// unknown id has no shares and therefore takes the refund branch.
    ///
    /// # Errors
    /// [`MarketError::EventNotFound`], [`MarketError::AlreadyResolved`], or a
    /// store failure. On failure nothing is applied.
    pub fn resolve(&self, event_id: EventId, winning_outcome_id: OutcomeId) -> Result<Resolution> {
        let mut event = self
            .store
            .event(event_id)?
            .ok_or(MarketError::EventNotFound(event_id))?;
        if event.is_resolved() {
            return Err(MarketError::AlreadyResolved(event_id).into());
        }

        let positions = self.store.positions_for_event(event_id)?;
        let total_pool: Shares = positions.iter().map(|p| p.shares).sum();
        let winning_shares: Shares = positions
            .iter()
            .filter(|p| p.outcome_id == winning_outcome_id)
            .map(|p| p.shares)
            .sum();

        let mut changes = Changeset::new();
        let mut outcomes = UserOutcomes::new();

        let settlement = if total_pool.is_zero() {
            Settlement::NoTrades
        } else if winning_shares.is_zero() {
            for p in &positions {
                let refund = round_points(p.shares)?;
                changes.credit(p.user_id, refund)?.record(NewTransaction::new(
                    TxKind::Payout,
                    p.user_id,
                    event_id,
                    p.outcome_id,
                    p.shares,
                    refund,
                ));
                outcomes.record(UserOutcome::refund(p.user_id, refund));
            }
            Settlement::Refunded
        } else {
            for p in positions
                .iter()
                .filter(|p| p.outcome_id != winning_outcome_id)
            {
                outcomes.record(UserOutcome::loss(p.user_id));
            }
            for p in positions
                .iter()
                .filter(|p| p.outcome_id == winning_outcome_id)
            {
                let share = pool_share(total_pool, p.shares, winning_shares)?;
                changes
                    .credit(p.user_id, share + WINNER_BONUS)?
                    .record(NewTransaction::new(
                        TxKind::Payout,
                        p.user_id,
                        event_id,
                        p.outcome_id,
                        p.shares,
                        share,
                    ))
                    .record(NewTransaction::new(
                        TxKind::Bonus,
                        p.user_id,
                        event_id,
                        p.outcome_id,
                        Decimal::ZERO,
                        WINNER_BONUS,
                    ));
                outcomes.record(UserOutcome::win(p.user_id, share + WINNER_BONUS));
            }
            Settlement::Paid
        };

        let resolved_at = Utc::now();
        changes.close_event_positions(event_id);
        event.mark_resolved(winning_outcome_id, resolved_at);
        changes.update_event(event);
        self.store.commit(changes)?;

        info!(
            event_id = %event_id,
            winning_outcome_id = %winning_outcome_id,
            settlement = ?settlement,
            total_pool = %total_pool,
            winning_shares = %winning_shares,
            users = outcomes.len(),
            "Event resolved"
        );

        Ok(Resolution {
            event_id,
            winning_outcome_id,
            settlement,
            total_pool,
            winning_shares,
            outcomes,
            resolved_at,
        })
    }

    /// Load an event and require it to be open.
    fn open_event(&self, event_id: EventId) -> Result<Event> {
        let event = self
            .store
            .event(event_id)?
            .ok_or(MarketError::EventNotFound(event_id))?;
        if !event.is_open() {
            debug!(event_id = %event_id, status = %event.status, "Trade on closed market");
            return Err(MarketError::MarketClosed(event_id).into());
        }
        Ok(event)
    }
}
