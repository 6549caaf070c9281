//! Positions: a user's share holding on one outcome of one event.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{EventId, OutcomeId, PositionId, UserId};
use super::money::{Shares, DUST_SHARES};

/// Accumulated exposure of a user on a single outcome.
///
/// A user holds at most one outcome per event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub user_id: UserId,
    pub event_id: EventId,
    pub outcome_id: OutcomeId,
    pub shares: Shares,
    /// Volume-weighted average entry price as a 0..1 fraction.
    pub avg_price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Position {
    /// Add `shares` bought at `price`, re-weighting the average entry price.
    pub fn add_shares(&mut self, shares: Shares, price: Decimal) {
        let total = self.shares + shares;
        if total.is_zero() {
            return;
        }
        self.avg_price = (self.avg_price * self.shares + price * shares) / total;
        self.shares = total;
    }

    /// Remove `shares`. The average price is untouched by sales.
    pub fn remove_shares(&mut self, shares: Shares) {
        self.shares -= shares;
    }

    /// Return true if the remaining holding is too small to keep.
    #[must_use]
    pub fn is_dust(&self) -> bool {
        self.shares < DUST_SHARES
    }
}

/// Fields required to open a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPosition {
    pub user_id: UserId,
    pub event_id: EventId,
    pub outcome_id: OutcomeId,
    pub shares: Shares,
    pub avg_price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl NewPosition {
    /// Attach the id assigned by the store.
    #[must_use]
    pub fn with_id(self, id: PositionId) -> Position {
        Position {
            id,
            user_id: self.user_id,
            event_id: self.event_id,
            outcome_id: self.outcome_id,
            shares: self.shares,
            avg_price: self.avg_price,
            created_at: self.created_at,
        }
    }
}
