//! Live odds derived from the share distribution of an event.
//!
//! An outcome's odds are its share of the event pool as a percentage. With no
//! shares outstanding every outcome gets `100 / N`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::event::Outcome;
use super::id::{EventId, OutcomeId, SnapshotId};
use super::money::{round_odds, Shares};
use super::position::Position;

/// Computed odds for one outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeOdds {
    pub outcome_id: OutcomeId,
    pub label: String,
    /// Percentage in 0..=100, rounded to hundredths.
    pub odds: Decimal,
    /// Raw share total on this outcome across all users.
    pub shares: Shares,
}

impl OutcomeOdds {
    /// Odds as a 0..1 price.
    #[must_use]
    pub fn price(&self) -> Decimal {
        self.odds / Decimal::ONE_HUNDRED
    }
}

/// Compute odds for `outcomes` from every open position on the event.
///
/// Positions on outcomes not in `outcomes` still count toward the pool total.
/// Returns one entry per outcome in input order, or an empty vector when
/// the event has no outcomes.
#[must_use]
pub fn compute_odds(outcomes: &[Outcome], positions: &[Position]) -> Vec<OutcomeOdds> {
    if outcomes.is_empty() {
        return Vec::new();
    }

    let mut by_outcome: HashMap<OutcomeId, Shares> = HashMap::new();
    for p in positions {
        *by_outcome.entry(p.outcome_id).or_default() += p.shares;
    }
    let total: Shares = by_outcome.values().copied().sum();
    let uniform = Decimal::ONE_HUNDRED / Decimal::from(outcomes.len());

    outcomes
        .iter()
        .map(|o| {
            let shares = by_outcome.get(&o.id).copied().unwrap_or_default();
            let pct = if total.is_zero() {
                uniform
            } else {
                shares / total * Decimal::ONE_HUNDRED
            };
            OutcomeOdds {
                outcome_id: o.id,
                label: o.label.clone(),
                odds: round_odds(pct),
                shares,
            }
        })
        .collect()
}

/// Point-in-time odds record kept for history charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OddsSnapshot {
    pub id: SnapshotId,
    pub event_id: EventId,
    pub outcome_id: OutcomeId,
    pub odds: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSnapshot {
    pub event_id: EventId,
    pub outcome_id: OutcomeId,
    pub odds: Decimal,
    pub created_at: DateTime<Utc>,
}

impl NewSnapshot {
    /// Snapshot every entry of `odds` at the same instant.
    #[must_use]
    pub fn batch(event_id: EventId, odds: &[OutcomeOdds]) -> Vec<Self> {
        let now = Utc::now();
        odds.iter()
            .map(|o| Self {
                event_id,
                outcome_id: o.outcome_id,
                odds: o.odds,
                created_at: now,
            })
            .collect()
    }

    #[must_use]
    pub fn with_id(self, id: SnapshotId) -> OddsSnapshot {
        OddsSnapshot {
            id,
            event_id: self.event_id,
            outcome_id: self.outcome_id,
            odds: self.odds,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::id::{PositionId, UserId};
    use crate::domain::position::NewPosition;
    use rust_decimal_macros::dec;

    fn outcome(id: i64, label: &str) -> Outcome {
        Outcome {
            id: OutcomeId::new(id),
            event_id: EventId::new(1),
            label: label.to_string(),
        }
    }

    fn position(id: i64, user: i64, outcome: i64, shares: Decimal) -> Position {
        NewPosition {
            user_id: UserId::new(user),
            event_id: EventId::new(1),
            outcome_id: OutcomeId::new(outcome),
            shares,
            avg_price: dec!(0.5),
            created_at: Utc::now(),
        }
        .with_id(PositionId::new(id))
    }

    #[test]
    fn no_shares_gives_uniform_odds() {
        let outcomes = vec![outcome(1, "A"), outcome(2, "B"), outcome(3, "C")];
        let odds = compute_odds(&outcomes, &[]);

        assert_eq!(odds.len(), 3);
        assert!(odds.iter().all(|o| o.odds == dec!(33.33)));
        assert!(odds.iter().all(|o| o.shares.is_zero()));
    }

    #[test]
    fn odds_follow_share_distribution() {
        let outcomes = vec![outcome(1, "Yes"), outcome(2, "No")];
        let positions = vec![
            position(1, 1, 1, dec!(100)),
            position(2, 2, 2, dec!(50)),
            position(3, 3, 1, dec!(50)),
        ];
        let odds = compute_odds(&outcomes, &positions);

        assert_eq!(odds[0].odds, dec!(75));
        assert_eq!(odds[0].shares, dec!(150));
        assert_eq!(odds[1].odds, dec!(25));
        assert_eq!(odds[1].shares, dec!(50));
    }

    #[test]
    fn single_sided_pool_is_one_hundred_percent() {
        let outcomes = vec![outcome(1, "X"), outcome(2, "Y")];
        let odds = compute_odds(&outcomes, &[position(1, 1, 1, dec!(100))]);

        assert_eq!(odds[0].odds, dec!(100));
        assert_eq!(odds[1].odds, Decimal::ZERO);
        assert_eq!(odds[0].price(), Decimal::ONE);
    }

    #[test]
    fn odds_round_to_hundredths() {
        let outcomes = vec![outcome(1, "A"), outcome(2, "B"), outcome(3, "C")];
        let positions = vec![
            position(1, 1, 1, dec!(1)),
            position(2, 2, 2, dec!(1)),
            position(3, 3, 3, dec!(1)),
        ];
        let odds = compute_odds(&outcomes, &positions);
        let sum: Decimal = odds.iter().map(|o| o.odds).sum();

        assert!(odds.iter().all(|o| o.odds == dec!(33.33)));
        assert!((sum - Decimal::ONE_HUNDRED).abs() <= dec!(0.1));
    }

    #[test]
    fn no_outcomes_gives_no_odds() {
        assert!(compute_odds(&[], &[]).is_empty());
    }
}
