//! Settlement results produced when an event resolves.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{EventId, OutcomeId, UserId};
use super::money::{Points, Shares};

/// Which settlement branch a resolution took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Settlement {
    /// Nobody traded; nothing to pay.
    NoTrades,
    /// Nobody held the winner; every holder got their shares back.
    Refunded,
    /// Winners split the pool and received the bonus.
    Paid,
}

/// What a single user got out of a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOutcome {
    pub user_id: UserId,
    pub won: bool,
    /// Points credited, bonus included.
    pub payout: Points,
    pub refund: bool,
}

impl UserOutcome {
    #[must_use]
    pub const fn loss(user_id: UserId) -> Self {
        Self {
            user_id,
            won: false,
            payout: 0,
            refund: false,
        }
    }

    #[must_use]
    pub const fn win(user_id: UserId, payout: Points) -> Self {
        Self {
            user_id,
            won: true,
            payout,
            refund: false,
        }
    }

    #[must_use]
    pub const fn refund(user_id: UserId, payout: Points) -> Self {
        Self {
            user_id,
            won: false,
            payout,
            refund: true,
        }
    }
}

/// Per-user results keyed by user id.
///
/// The first result recorded for a user wins; later inserts are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserOutcomes(BTreeMap<UserId, UserOutcome>);

impl UserOutcomes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `outcome` unless the user already has a result.
    pub fn record(&mut self, outcome: UserOutcome) {
        self.0.entry(outcome.user_id).or_insert(outcome);
    }

    #[must_use]
    pub fn get(&self, user_id: UserId) -> Option<&UserOutcome> {
        self.0.get(&user_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserOutcome> {
        self.0.values()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<UserOutcome> {
        self.0.into_values().collect()
    }
}

/// Summary of a completed resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub event_id: EventId,
    pub winning_outcome_id: OutcomeId,
    pub settlement: Settlement,
    pub total_pool: Shares,
    pub winning_shares: Shares,
    pub outcomes: UserOutcomes,
    pub resolved_at: DateTime<Utc>,
}

impl Resolution {
    /// Users that won, in user-id order.
    pub fn winners(&self) -> impl Iterator<Item = &UserOutcome> {
        self.outcomes.iter().filter(|o| o.won)
    }
}
